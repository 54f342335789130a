use trag_domain::text;

use crate::search::{
	filter::{AttributeFilter, ReferenceScope},
	params::{SortOption, ValidParams},
};

/// How one request retrieves, orders, and windows its candidates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
	/// No usable query, or an explicit sort override: candidates are ordered by a column and
	/// windowed by plain offset.
	Ordered,
	/// Query present: candidates are scored, floor-pruned, and ordered by `(score desc, id
	/// asc)`; continuation runs on a keyset cursor.
	Relevance,
}
impl Strategy {
	pub fn choose(query: Option<&str>, sort: Option<SortOption>) -> Self {
		match query {
			Some(_) if sort.is_none() => Self::Relevance,
			_ => Self::Ordered,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Ordered => "ordered",
			Self::Relevance => "relevance",
		}
	}
}

/// Predicates a candidate source may use to narrow its scan. A source is free to ignore any of
/// them and over-fetch; every predicate is re-checked in process. It must never drop a
/// candidate the evaluator and relevance floor would accept.
#[derive(Clone, Debug, Default)]
pub struct Pushdown {
	pub category_ids: Option<Vec<String>>,
	/// Folded query text, for trigram prefiltering.
	pub text: Option<String>,
	pub reference: Option<String>,
	pub reference_scope: ReferenceScope,
	pub standards: Vec<String>,
	pub attributes: Vec<AttributeFilter>,
}
impl Pushdown {
	pub(crate) fn for_request(params: &ValidParams<'_>, category_ids: Option<Vec<String>>) -> Self {
		Self {
			category_ids,
			text: params.query.map(text::fold),
			reference: params.reference.map(str::to_string),
			reference_scope: params.reference_scope,
			standards: params.standards.to_vec(),
			attributes: params.attributes.to_vec(),
		}
	}
}
