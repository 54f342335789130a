pub mod quick;
pub mod search;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use error::{Error, Result};
pub use quick::QuickParams;
pub use search::{
	AttributeFilter, ComparisonOperator, FilterValue, JsonField, JsonFilter, PageCursor, Pushdown,
	ReferenceScope, SearchItem, SearchParams, SearchResult, SortDirection, SortField, SortOption,
};
use trag_config::Config;
use trag_domain::Candidate;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only candidate store the engine retrieves from.
pub trait CandidateSource
where
	Self: Send + Sync,
{
	/// Fetches candidates matching `pushdown`. Sources may over-fetch, since every predicate is
	/// re-checked in process, but must never drop a candidate the evaluator and relevance floor
	/// would accept.
	fn fetch<'a>(
		&'a self,
		pushdown: &'a Pushdown,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>>;

	/// Ids of `root` and every category beneath it.
	fn category_subtree<'a>(
		&'a self,
		root: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;
}

pub struct SearchService {
	pub cfg: Config,
	pub source: Arc<dyn CandidateSource>,
}
impl SearchService {
	pub fn new(cfg: Config, source: Arc<dyn CandidateSource>) -> Self {
		Self { cfg, source }
	}
}
