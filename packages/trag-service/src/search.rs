pub mod filter;
pub mod page;
pub mod params;
pub mod plan;
pub mod result;

pub use filter::{
	AttributeFilter, CandidateFilter, ComparisonOperator, FilterImpact, FilterValue, JsonField,
	JsonFilter, ReferenceScope,
};
pub use page::PageCursor;
pub use params::{SearchParams, SortDirection, SortField, SortOption};
pub use plan::{Pushdown, Strategy};
pub use result::{Scored, SearchItem, SearchResult};

use std::time::{Duration, Instant};

use trag_domain::{Candidate, score, trigram};

use crate::{Error, Result, SearchService};

const SCORE_YIELD_INTERVAL: usize = 1024;

impl SearchService {
	/// Runs one request end to end: validate, fetch, filter, score, order, window, assemble.
	pub async fn search(&self, params: &SearchParams) -> Result<SearchResult<SearchItem>> {
		let started = Instant::now();
		let params = params.validated()?;
		let strategy = Strategy::choose(params.query, params.sort);
		let category_ids = params.category_id.map(|id| vec![id.to_string()]);
		let pushdown = Pushdown::for_request(&params, category_ids.clone());
		let fetched = self.fetch_bounded(&pushdown).await?;
		let filter = CandidateFilter {
			category_ids: category_ids.as_deref(),
			attributes: params.attributes,
			dimensions: params.dimensions,
			specs: params.specs,
			reference: params.reference,
			reference_scope: params.reference_scope,
			standards: params.standards,
		};
		let (kept, impact) = filter.apply(fetched);

		if impact.dropped_total > 0 {
			tracing::debug!(
				dropped = impact.dropped_total,
				reasons = ?impact.top_drop_reasons,
				"filters dropped candidates.",
			);
		}

		let (items, total, next_cursor): (Vec<SearchItem>, u64, Option<PageCursor>) =
			match params.query {
				Some(query) => {
					let mut scored = score_candidates(query, params.fuzzy, kept).await;

					match strategy {
						Strategy::Relevance => page::order_by_relevance(&mut scored),
						Strategy::Ordered => page::order_scored_by_sort(&mut scored, params.sort),
					}

					let total = scored.len() as u64;
					let window = match (strategy, &params.cursor) {
						(Strategy::Relevance, Some(cursor)) =>
							page::cursor_window(scored, cursor, params.limit),
						_ => page::offset_window(scored, params.page, params.limit),
					};
					let next_cursor = match strategy {
						Strategy::Relevance => page::next_cursor(&window, params.limit),
						Strategy::Ordered => None,
					};
					let items = window
						.into_iter()
						.map(|s| SearchItem::project(s.candidate, Some(s.score), Some(query)))
						.collect();

					(items, total, next_cursor)
				},
				None => {
					let mut candidates = kept;

					page::order_by_sort(&mut candidates, params.sort);

					let total = candidates.len() as u64;
					let window = page::offset_window(candidates, params.page, params.limit);
					let items = window
						.into_iter()
						.map(|candidate| SearchItem::project(candidate, None, None))
						.collect();

					(items, total, None)
				},
			};
		let result = SearchResult::assemble(items, total, params.page, params.limit, next_cursor);

		tracing::info!(
			strategy = strategy.as_str(),
			fetched = impact.candidate_count_pre,
			kept = impact.candidate_count_post,
			total,
			returned = result.items.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"search completed.",
		);

		Ok(result)
	}

	pub(crate) async fn fetch_bounded(&self, pushdown: &Pushdown) -> Result<Vec<Candidate>> {
		let timeout = Duration::from_millis(self.cfg.search.fetch_timeout_ms);

		match tokio::time::timeout(timeout, self.source.fetch(pushdown)).await {
			Ok(Ok(candidates)) => Ok(candidates),
			Ok(Err(e)) => Err(e.into()),
			Err(_) => Err(Error::Retrieval {
				message: format!("candidate fetch timed out after {}ms.", timeout.as_millis()),
			}),
		}
	}

	pub(crate) async fn subtree_bounded(&self, root: &str) -> Result<Vec<String>> {
		let timeout = Duration::from_millis(self.cfg.search.fetch_timeout_ms);

		match tokio::time::timeout(timeout, self.source.category_subtree(root)).await {
			Ok(Ok(ids)) => Ok(ids),
			Ok(Err(e)) => Err(e.into()),
			Err(_) => Err(Error::Retrieval {
				message: format!("category lookup timed out after {}ms.", timeout.as_millis()),
			}),
		}
	}
}

/// Scores and floor-prunes candidates, yielding periodically so large scans do not hog the
/// worker. Dropping the future cancels the scan at the next yield point.
pub(crate) async fn score_candidates(
	query: &str,
	fuzzy: bool,
	candidates: Vec<Candidate>,
) -> Vec<Scored> {
	let mut scored = Vec::with_capacity(candidates.len());

	for (index, candidate) in candidates.into_iter().enumerate() {
		if index != 0 && index % SCORE_YIELD_INTERVAL == 0 {
			tokio::task::yield_now().await;
		}

		if fuzzy && trigram::similarity(query, &candidate.name) < score::FUZZY_NAME_THRESHOLD {
			continue;
		}

		let value = score::score(query, &candidate.name, &candidate.catalog_number);

		if value < score::SIMILARITY_THRESHOLD {
			continue;
		}

		scored.push(Scored { candidate, score: value });
	}

	scored
}
