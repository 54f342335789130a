use std::sync::Arc;

use trag_service::SearchService;
use trag_storage::{db::Db, source::PgCandidateSource};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SearchService>,
}
impl AppState {
	pub async fn new(config: trag_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = SearchService::new(config, Arc::new(PgCandidateSource::new(db)));

		Ok(Self { service: Arc::new(service) })
	}

	/// State over an arbitrary candidate source, with no database behind it.
	pub fn with_service(service: SearchService) -> Self {
		Self { service: Arc::new(service) }
	}
}
