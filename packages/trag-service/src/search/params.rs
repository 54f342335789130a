use serde::{Deserialize, Serialize};

use crate::{
	Error, Result,
	search::{
		filter::{
			AttributeFilter, JsonField, JsonFilter, MAX_ATTRIBUTE_FILTERS, MAX_JSON_FILTERS,
			MAX_STANDARDS, MAX_STRING_BYTES, ReferenceScope,
		},
		page::PageCursor,
	},
};

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_QUERY_BYTES: usize = 256;
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// One search request as callers hand it over the wire.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchParams {
	pub query: Option<String>,
	pub fuzzy: bool,
	pub category_id: Option<String>,
	pub attributes: Vec<AttributeFilter>,
	pub dimensions: Vec<JsonFilter>,
	pub specs: Vec<JsonFilter>,
	pub reference: Option<String>,
	pub reference_type: ReferenceScope,
	pub standards: Vec<String>,
	pub page: u32,
	pub limit: u32,
	pub sort: Option<SortOption>,
	pub cursor_score: Option<f32>,
	pub cursor_id: Option<String>,
}
impl SearchParams {
	/// Boundary validation: every malformed or contradictory request is rejected here, before
	/// any retrieval work starts.
	pub fn validated(&self) -> Result<ValidParams<'_>> {
		if self.page < DEFAULT_PAGE {
			return Err(Error::validation("$.page", "page starts at 1."));
		}
		if self.limit == 0 || self.limit > MAX_LIMIT {
			return Err(Error::validation(
				"$.limit",
				format!("limit must be between 1 and {MAX_LIMIT}."),
			));
		}

		let query = match self.query.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(query) if query.chars().count() < MIN_QUERY_CHARS =>
				return Err(Error::validation(
					"$.query",
					format!("query must be at least {MIN_QUERY_CHARS} characters."),
				)),
			Some(query) if query.len() > MAX_QUERY_BYTES =>
				return Err(Error::validation(
					"$.query",
					format!("query exceeds maximum bytes ({MAX_QUERY_BYTES})."),
				)),
			Some(query) => Some(query),
		};
		let category_id = match self.category_id.as_deref().map(str::trim) {
			None => None,
			Some("") =>
				return Err(Error::validation("$.categoryId", "categoryId must not be blank.")),
			Some(id) => Some(id),
		};
		let reference = match self.reference.as_deref().map(str::trim) {
			None => None,
			Some("") =>
				return Err(Error::validation("$.reference", "reference must not be blank.")),
			Some(reference) if reference.len() > MAX_STRING_BYTES =>
				return Err(Error::validation(
					"$.reference",
					format!("reference exceeds maximum bytes ({MAX_STRING_BYTES})."),
				)),
			Some(reference) => Some(reference),
		};

		if self.attributes.len() > MAX_ATTRIBUTE_FILTERS {
			return Err(Error::validation(
				"$.attributes",
				format!("too many attribute filters (max {MAX_ATTRIBUTE_FILTERS})."),
			));
		}
		for (index, filter) in self.attributes.iter().enumerate() {
			filter.validate(&format!("$.attributes[{index}]"))?;
		}

		validate_json_filters(&self.dimensions, "$.dimensions", JsonField::Dimensions)?;
		validate_json_filters(&self.specs, "$.specs", JsonField::TechnicalSpecs)?;

		if self.standards.len() > MAX_STANDARDS {
			return Err(Error::validation(
				"$.standards",
				format!("too many standards (max {MAX_STANDARDS})."),
			));
		}
		if self.standards.iter().any(|standard| standard.trim().is_empty()) {
			return Err(Error::validation(
				"$.standards",
				"standards must not contain blank entries.",
			));
		}

		let cursor = match (self.cursor_score, self.cursor_id.as_deref()) {
			(None, None) => None,
			(Some(_), None) =>
				return Err(Error::validation(
					"$.cursorId",
					"cursorId is required with cursorScore.",
				)),
			(None, Some(_)) =>
				return Err(Error::validation(
					"$.cursorScore",
					"cursorScore is required with cursorId.",
				)),
			(Some(score), Some(id)) => {
				if query.is_none() {
					return Err(Error::validation(
						"$.cursorScore",
						"cursor continuation requires a query.",
					));
				}
				if self.sort.is_some() {
					return Err(Error::validation(
						"$.sort",
						"explicit sort cannot be combined with a cursor.",
					));
				}
				if self.page > DEFAULT_PAGE {
					return Err(Error::validation(
						"$.page",
						"page offsets cannot be combined with a cursor.",
					));
				}
				if !(0.0..=1.0).contains(&score) {
					return Err(Error::validation(
						"$.cursorScore",
						"cursorScore must be within [0, 1].",
					));
				}
				if id.trim().is_empty() {
					return Err(Error::validation("$.cursorId", "cursorId must not be blank."));
				}

				Some(PageCursor { score, id: id.to_string() })
			},
		};

		Ok(ValidParams {
			query,
			fuzzy: self.fuzzy,
			category_id,
			attributes: &self.attributes,
			dimensions: &self.dimensions,
			specs: &self.specs,
			reference,
			reference_scope: self.reference_type,
			standards: &self.standards,
			page: self.page,
			limit: self.limit,
			sort: self.sort,
			cursor,
		})
	}
}

impl Default for SearchParams {
	fn default() -> Self {
		Self {
			query: None,
			fuzzy: false,
			category_id: None,
			attributes: Vec::new(),
			dimensions: Vec::new(),
			specs: Vec::new(),
			reference: None,
			reference_type: ReferenceScope::default(),
			standards: Vec::new(),
			page: DEFAULT_PAGE,
			limit: DEFAULT_LIMIT,
			sort: None,
			cursor_score: None,
			cursor_id: None,
		}
	}
}

fn validate_json_filters(filters: &[JsonFilter], list: &str, expected: JsonField) -> Result<()> {
	if filters.len() > MAX_JSON_FILTERS {
		return Err(Error::validation(
			list,
			format!("too many filters (max {MAX_JSON_FILTERS})."),
		));
	}

	for (index, filter) in filters.iter().enumerate() {
		let at = format!("{list}[{index}]");

		if filter.field != expected {
			return Err(Error::validation(
				at,
				format!("field must be {} in this list.", expected.as_str()),
			));
		}

		filter.validate(&at)?;
	}

	Ok(())
}

/// A request that survived boundary validation, with trimming and derived decisions applied.
#[derive(Clone, Debug)]
pub struct ValidParams<'a> {
	pub query: Option<&'a str>,
	pub fuzzy: bool,
	pub category_id: Option<&'a str>,
	pub attributes: &'a [AttributeFilter],
	pub dimensions: &'a [JsonFilter],
	pub specs: &'a [JsonFilter],
	pub reference: Option<&'a str>,
	pub reference_scope: ReferenceScope,
	pub standards: &'a [String],
	pub page: u32,
	pub limit: u32,
	pub sort: Option<SortOption>,
	pub cursor: Option<PageCursor>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
	Name,
	CatalogNumber,
	CreatedAt,
}
impl SortField {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Name => "name",
			Self::CatalogNumber => "catalogNumber",
			Self::CreatedAt => "createdAt",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"name" => Some(Self::Name),
			"catalogNumber" => Some(Self::CatalogNumber),
			"createdAt" => Some(Self::CreatedAt),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	Asc,
	Desc,
}
impl SortDirection {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"asc" => Some(Self::Asc),
			"desc" => Some(Self::Desc),
			_ => None,
		}
	}
}

/// Explicit column ordering; supplying one disables relevance ordering and forces offset
/// windowing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct SortOption {
	pub field: SortField,
	pub direction: SortDirection,
}
