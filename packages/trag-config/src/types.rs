use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	#[serde(default = "default_pool_max_conns")]
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Upper bound on one candidate-source fetch. An elapsed timeout surfaces as a retryable
	/// retrieval error, never as partial results.
	#[serde(default = "default_fetch_timeout_ms")]
	pub fetch_timeout_ms: u64,
}
impl Default for Search {
	fn default() -> Self {
		Self { fetch_timeout_ms: default_fetch_timeout_ms() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_pool_max_conns() -> u32 {
	8
}

fn default_fetch_timeout_ms() -> u64 {
	5_000
}
