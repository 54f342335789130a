use std::time::Instant;

use serde::{Deserialize, Serialize};

use trag_domain::text;

use crate::{
	Error, Result, SearchService,
	search::{self, CandidateFilter, Pushdown, SearchItem, page},
};

pub const QUICK_MIN_QUERY_CHARS: usize = 3;
pub const QUICK_DEFAULT_LIMIT: u32 = 20;
pub const QUICK_MAX_LIMIT: u32 = 50;

/// Parameters of the lightweight typeahead lookup.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuickParams {
	pub query: String,
	pub category_id: Option<String>,
	pub limit: u32,
}
impl Default for QuickParams {
	fn default() -> Self {
		Self { query: String::new(), category_id: None, limit: QUICK_DEFAULT_LIMIT }
	}
}

impl SearchService {
	/// Typeahead lookup: scores name and catalog number against a short query, scoped to a
	/// whole category subtree when one is given. Returns a bare item list, no page envelope.
	pub async fn quick(&self, params: &QuickParams) -> Result<Vec<SearchItem>> {
		let started = Instant::now();
		let query = params.query.trim();

		if query.chars().count() < QUICK_MIN_QUERY_CHARS {
			return Err(Error::validation(
				"$.query",
				format!("query must be at least {QUICK_MIN_QUERY_CHARS} characters."),
			));
		}
		if params.limit == 0 || params.limit > QUICK_MAX_LIMIT {
			return Err(Error::validation(
				"$.limit",
				format!("limit must be between 1 and {QUICK_MAX_LIMIT}."),
			));
		}

		let category_ids = match params.category_id.as_deref().map(str::trim) {
			None => None,
			Some("") =>
				return Err(Error::validation("$.categoryId", "categoryId must not be blank.")),
			Some(root) => Some(self.subtree_bounded(root).await?),
		};
		let pushdown = Pushdown {
			category_ids: category_ids.clone(),
			text: Some(text::fold(query)),
			..Default::default()
		};
		let fetched = self.fetch_bounded(&pushdown).await?;
		let filter =
			CandidateFilter { category_ids: category_ids.as_deref(), ..Default::default() };
		let (kept, _) = filter.apply(fetched);
		let mut scored = search::score_candidates(query, false, kept).await;

		scored.sort_by(|a, b| {
			page::cmp_f32_desc(a.score, b.score)
				.then_with(|| b.candidate.created_at.cmp(&a.candidate.created_at))
				.then_with(|| a.candidate.id.cmp(&b.candidate.id))
		});
		scored.truncate(params.limit as usize);

		let items: Vec<_> = scored
			.into_iter()
			.map(|scored| SearchItem::project(scored.candidate, Some(scored.score), Some(query)))
			.collect();

		tracing::info!(
			categories = category_ids.as_ref().map_or(0, Vec::len),
			returned = items.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"quick search completed.",
		);

		Ok(items)
	}
}
