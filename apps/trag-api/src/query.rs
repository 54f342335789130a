use serde::Deserialize;

use trag_service::{
	QuickParams, ReferenceScope, SearchParams, SortDirection, SortField, SortOption,
};

/// One unusable query parameter, with the parameter name kept for the error envelope.
#[derive(Debug)]
pub struct QueryError {
	pub param: &'static str,
	pub message: String,
}
impl QueryError {
	fn new(param: &'static str, message: impl Into<String>) -> Self {
		Self { param, message: message.into() }
	}
}

/// `GET /v1/search` parameters.
///
/// The filter lists travel as JSON-encoded strings so the full filter grammar stays reachable
/// from a URL; everything else is a plain scalar.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSearchQuery {
	pub query: Option<String>,
	pub fuzzy: Option<bool>,
	pub category_id: Option<String>,
	pub attributes: Option<String>,
	pub dimensions: Option<String>,
	pub specs: Option<String>,
	pub reference: Option<String>,
	pub reference_type: Option<String>,
	/// Comma-separated list.
	pub standards: Option<String>,
	pub page: Option<u32>,
	pub limit: Option<u32>,
	/// `field` or `field:direction`.
	pub sort: Option<String>,
	pub cursor_score: Option<f32>,
	pub cursor_id: Option<String>,
}
impl RawSearchQuery {
	pub fn into_params(self) -> Result<SearchParams, QueryError> {
		let attributes = match self.attributes.as_deref() {
			Some(raw) => parse_json_list(raw, "attributes")?,
			None => Vec::new(),
		};
		let dimensions = match self.dimensions.as_deref() {
			Some(raw) => parse_json_list(raw, "dimensions")?,
			None => Vec::new(),
		};
		let specs = match self.specs.as_deref() {
			Some(raw) => parse_json_list(raw, "specs")?,
			None => Vec::new(),
		};
		let reference_type = match self.reference_type.as_deref() {
			Some(raw) => ReferenceScope::parse(raw).ok_or_else(|| {
				QueryError::new(
					"referenceType",
					"must be one of oem, original, replacement, all.",
				)
			})?,
			None => ReferenceScope::default(),
		};
		let sort = self.sort.as_deref().map(parse_sort).transpose()?;
		let defaults = SearchParams::default();

		Ok(SearchParams {
			query: self.query,
			fuzzy: self.fuzzy.unwrap_or(false),
			category_id: self.category_id,
			attributes,
			dimensions,
			specs,
			reference: self.reference,
			reference_type,
			standards: self.standards.as_deref().map(split_list).unwrap_or_default(),
			page: self.page.unwrap_or(defaults.page),
			limit: self.limit.unwrap_or(defaults.limit),
			sort,
			cursor_score: self.cursor_score,
			cursor_id: self.cursor_id,
		})
	}
}

/// `GET /v1/search/quick` parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawQuickQuery {
	pub q: Option<String>,
	pub category_id: Option<String>,
	pub limit: Option<u32>,
}
impl RawQuickQuery {
	pub fn into_params(self) -> QuickParams {
		let defaults = QuickParams::default();

		QuickParams {
			query: self.q.unwrap_or_default(),
			category_id: self.category_id,
			limit: self.limit.unwrap_or(defaults.limit),
		}
	}
}

fn parse_json_list<T>(raw: &str, param: &'static str) -> Result<Vec<T>, QueryError>
where
	T: serde::de::DeserializeOwned,
{
	serde_json::from_str(raw)
		.map_err(|err| QueryError::new(param, format!("must be a JSON array of filters: {err}.")))
}

fn parse_sort(raw: &str) -> Result<SortOption, QueryError> {
	let (field, direction) = match raw.split_once(':') {
		Some((field, direction)) => (field, Some(direction)),
		None => (raw, None),
	};
	let field = SortField::parse(field).ok_or_else(|| {
		QueryError::new("sort", "field must be one of name, catalogNumber, createdAt.")
	})?;
	let direction = match direction {
		Some(raw) => SortDirection::parse(raw)
			.ok_or_else(|| QueryError::new("sort", "direction must be asc or desc."))?,
		None => SortDirection::Asc,
	};

	Ok(SortOption { field, direction })
}

fn split_list(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|part| !part.is_empty()).map(str::to_string).collect()
}
