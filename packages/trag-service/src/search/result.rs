use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use trag_domain::{Candidate, score};

use crate::search::page::PageCursor;

/// A candidate carrying its relevance for the current query.
#[derive(Clone, Debug)]
pub struct Scored {
	pub candidate: Candidate,
	pub score: f32,
}

/// One page of results in the caller-chosen projection. Constructed fresh per request; carries
/// no persisted state.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<T> {
	pub items: Vec<T>,
	pub total: u64,
	pub page: u32,
	pub limit: u32,
	pub total_pages: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_cursor: Option<PageCursor>,
}
impl<T> SearchResult<T> {
	pub fn assemble(
		items: Vec<T>,
		total: u64,
		page: u32,
		limit: u32,
		next_cursor: Option<PageCursor>,
	) -> Self {
		Self { items, total, page, limit, total_pages: total.div_ceil(limit as u64), next_cursor }
	}
}

/// Display projection of a candidate; raw JSON documents stay behind.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
	pub id: String,
	pub name: String,
	pub catalog_number: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub oem_number: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
	pub exact_match: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl SearchItem {
	pub fn project(candidate: Candidate, score: Option<f32>, query: Option<&str>) -> Self {
		let exact_match = query.is_some_and(|query| score::is_exact_match(query, &candidate));

		Self {
			id: candidate.id,
			name: candidate.name,
			catalog_number: candidate.catalog_number,
			oem_number: candidate.oem_number,
			category_id: candidate.category_id,
			score,
			exact_match,
			created_at: candidate.created_at,
		}
	}
}
