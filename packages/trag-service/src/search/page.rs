use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use trag_domain::Candidate;

use crate::search::{
	params::{SortDirection, SortField, SortOption},
	result::Scored,
};

/// Continuation token: the ranking key of the last item the client has seen. Windowing against
/// it keeps delivery exactly-once even when other candidates move between requests, because
/// each row's own key is compared to a fixed position instead of a recomputed offset.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PageCursor {
	pub score: f32,
	pub id: String,
}

/// Descending order over scores; NaN sorts last.
pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Whether `scored` ranks strictly after the cursor position in `(score desc, id asc)` order.
fn ranks_after(scored: &Scored, cursor: &PageCursor) -> bool {
	scored.score < cursor.score
		|| (scored.score == cursor.score && scored.candidate.id > cursor.id)
}

pub(crate) fn order_by_relevance(items: &mut [Scored]) {
	items.sort_by(|a, b| {
		cmp_f32_desc(a.score, b.score).then_with(|| a.candidate.id.cmp(&b.candidate.id))
	});
}

fn ordered_cmp(a: &Candidate, b: &Candidate, sort: Option<SortOption>) -> Ordering {
	match sort {
		Some(sort) => {
			let by = match sort.field {
				SortField::Name => a.name.cmp(&b.name),
				SortField::CatalogNumber => a.catalog_number.cmp(&b.catalog_number),
				SortField::CreatedAt => a.created_at.cmp(&b.created_at),
			};
			let by = match sort.direction {
				SortDirection::Asc => by,
				SortDirection::Desc => by.reverse(),
			};

			by.then_with(|| a.id.cmp(&b.id))
		},
		None => b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)),
	}
}

pub(crate) fn order_by_sort(items: &mut [Candidate], sort: Option<SortOption>) {
	items.sort_by(|a, b| ordered_cmp(a, b, sort));
}

pub(crate) fn order_scored_by_sort(items: &mut [Scored], sort: Option<SortOption>) {
	items.sort_by(|a, b| ordered_cmp(&a.candidate, &b.candidate, sort));
}

/// Keeps at most `limit` candidates strictly past the cursor. The input must already be in
/// `(score desc, id asc)` order.
pub(crate) fn cursor_window(
	mut ordered: Vec<Scored>,
	cursor: &PageCursor,
	limit: u32,
) -> Vec<Scored> {
	let start = ordered.partition_point(|scored| !ranks_after(scored, cursor));
	let mut window = ordered.split_off(start);

	window.truncate(limit as usize);
	window
}

pub(crate) fn offset_window<T>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
	let start = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);

	items.into_iter().skip(start).take(limit as usize).collect()
}

/// The continuation token for the next page, absent when this page already ran short.
pub(crate) fn next_cursor(window: &[Scored], limit: u32) -> Option<PageCursor> {
	if window.len() < limit as usize {
		return None;
	}

	window
		.last()
		.map(|scored| PageCursor { score: scored.score, id: scored.candidate.id.clone() })
}
