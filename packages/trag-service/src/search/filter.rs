use std::{
	borrow::Cow,
	cmp::Ordering,
	collections::HashMap,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use trag_domain::{Candidate, ReferenceKind, text};

pub const MAX_ATTRIBUTE_FILTERS: usize = 32;
pub const MAX_JSON_FILTERS: usize = 32;
pub const MAX_STANDARDS: usize = 64;
const MAX_NAME_BYTES: usize = 128;
const MAX_PATH_SEGMENTS: usize = 8;
pub(crate) const MAX_STRING_BYTES: usize = 512;

#[derive(Clone, Debug)]
pub struct FilterError {
	path: String,
	message: String,
}
impl FilterError {
	fn new(path: &str, message: impl Into<String>) -> Self {
		Self { path: path.to_string(), message: message.into() }
	}
}
impl Display for FilterError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.path, self.message)
	}
}
impl From<FilterError> for crate::Error {
	fn from(e: FilterError) -> Self {
		Self::Validation { field: e.path, message: e.message }
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
	Eq,
	Gt,
	Lt,
	Gte,
	Lte,
	Between,
	Contains,
}
impl ComparisonOperator {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Eq => "eq",
			Self::Gt => "gt",
			Self::Lt => "lt",
			Self::Gte => "gte",
			Self::Lte => "lte",
			Self::Between => "between",
			Self::Contains => "contains",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"eq" => Some(Self::Eq),
			"gt" => Some(Self::Gt),
			"lt" => Some(Self::Lt),
			"gte" => Some(Self::Gte),
			"lte" => Some(Self::Lte),
			"between" => Some(Self::Between),
			"contains" => Some(Self::Contains),
			_ => None,
		}
	}
}

/// Which semi-structured document of a candidate a [`JsonFilter`] addresses.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JsonField {
	Dimensions,
	TechnicalSpecs,
}
impl JsonField {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Dimensions => "dimensions",
			Self::TechnicalSpecs => "technicalSpecs",
		}
	}
}

/// Scalar filter operand; numbers and text are both accepted on the wire.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
	Number(f64),
	Text(String),
}
impl FilterValue {
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			Self::Text(s) => s.trim().parse().ok(),
		}
	}

	pub fn to_text(&self) -> Cow<'_, str> {
		match self {
			Self::Number(n) => Cow::Owned(n.to_string()),
			Self::Text(s) => Cow::Borrowed(s),
		}
	}
}

/// Cross-reference kinds a reference filter is allowed to match against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceScope {
	Oem,
	Original,
	Replacement,
	#[default]
	All,
}
impl ReferenceScope {
	pub fn admits(&self, kind: ReferenceKind) -> bool {
		match self {
			Self::All => true,
			Self::Oem => kind == ReferenceKind::Oem,
			Self::Original => kind == ReferenceKind::Original,
			Self::Replacement => kind == ReferenceKind::Replacement,
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"oem" => Some(Self::Oem),
			"original" => Some(Self::Original),
			"replacement" => Some(Self::Replacement),
			"all" => Some(Self::All),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
	pub name: String,
	pub operator: ComparisonOperator,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<FilterValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<f64>,
}
impl AttributeFilter {
	pub fn validate(&self, at: &str) -> Result<(), FilterError> {
		if self.name.trim().is_empty() {
			return Err(FilterError::new(at, "attribute name must not be empty."));
		}
		if self.name.len() > MAX_NAME_BYTES {
			return Err(FilterError::new(
				at,
				format!("attribute name exceeds maximum bytes ({MAX_NAME_BYTES})."),
			));
		}

		validate_operands(at, self.operator, self.value.as_ref(), self.min, self.max)
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonFilter {
	pub field: JsonField,
	pub path: String,
	pub operator: ComparisonOperator,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<FilterValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<f64>,
}
impl JsonFilter {
	pub fn validate(&self, at: &str) -> Result<(), FilterError> {
		if self.path.trim().is_empty() {
			return Err(FilterError::new(at, "path must not be empty."));
		}
		if self.path.len() > MAX_STRING_BYTES {
			return Err(FilterError::new(
				at,
				format!("path exceeds maximum bytes ({MAX_STRING_BYTES})."),
			));
		}
		if self.path.split('.').count() > MAX_PATH_SEGMENTS {
			return Err(FilterError::new(
				at,
				format!("path exceeds maximum segments ({MAX_PATH_SEGMENTS})."),
			));
		}
		if self.path.split('.').any(|segment| segment.trim().is_empty()) {
			return Err(FilterError::new(at, "path must not contain empty segments."));
		}

		validate_operands(at, self.operator, self.value.as_ref(), self.min, self.max)
	}
}

fn validate_operands(
	at: &str,
	operator: ComparisonOperator,
	value: Option<&FilterValue>,
	min: Option<f64>,
	max: Option<f64>,
) -> Result<(), FilterError> {
	match operator {
		ComparisonOperator::Eq | ComparisonOperator::Contains => {
			let Some(value) = value else {
				return Err(FilterError::new(
					at,
					format!("operator {} requires a value.", operator.as_str()),
				));
			};

			if min.is_some() || max.is_some() {
				return Err(FilterError::new(
					at,
					format!("operator {} takes a value, not bounds.", operator.as_str()),
				));
			}

			match value {
				FilterValue::Number(n) if !n.is_finite() =>
					return Err(FilterError::new(at, "value must be a finite number.")),
				FilterValue::Text(s) if s.trim().is_empty() =>
					return Err(FilterError::new(at, "value must not be empty.")),
				FilterValue::Text(s) if s.len() > MAX_STRING_BYTES =>
					return Err(FilterError::new(
						at,
						format!("value exceeds maximum bytes ({MAX_STRING_BYTES})."),
					)),
				_ => {},
			}
		},
		ComparisonOperator::Gt | ComparisonOperator::Gte => {
			if value.is_some() || max.is_some() {
				return Err(FilterError::new(
					at,
					format!("operator {} takes min only.", operator.as_str()),
				));
			}

			let Some(min) = min else {
				return Err(FilterError::new(
					at,
					format!("operator {} requires min.", operator.as_str()),
				));
			};

			if !min.is_finite() {
				return Err(FilterError::new(at, "min must be a finite number."));
			}
		},
		ComparisonOperator::Lt | ComparisonOperator::Lte => {
			if value.is_some() || min.is_some() {
				return Err(FilterError::new(
					at,
					format!("operator {} takes max only.", operator.as_str()),
				));
			}

			let Some(max) = max else {
				return Err(FilterError::new(
					at,
					format!("operator {} requires max.", operator.as_str()),
				));
			};

			if !max.is_finite() {
				return Err(FilterError::new(at, "max must be a finite number."));
			}
		},
		ComparisonOperator::Between => {
			if value.is_some() {
				return Err(FilterError::new(at, "operator between takes bounds, not a value."));
			}

			let (Some(min), Some(max)) = (min, max) else {
				return Err(FilterError::new(at, "operator between requires both min and max."));
			};

			if !min.is_finite() || !max.is_finite() {
				return Err(FilterError::new(at, "bounds must be finite numbers."));
			}
			if min > max {
				return Err(FilterError::new(at, "min must not exceed max."));
			}
		},
	}

	Ok(())
}

/// The conjunction of every structured predicate in one request. Empty lists impose no
/// constraint.
#[derive(Clone, Copy, Debug, Default)]
pub struct CandidateFilter<'a> {
	pub category_ids: Option<&'a [String]>,
	pub attributes: &'a [AttributeFilter],
	pub dimensions: &'a [JsonFilter],
	pub specs: &'a [JsonFilter],
	pub reference: Option<&'a str>,
	pub reference_scope: ReferenceScope,
	pub standards: &'a [String],
}
impl CandidateFilter<'_> {
	/// Whether `candidate` passes every predicate; on rejection, names the first predicate that
	/// failed.
	pub fn evaluate(&self, candidate: &Candidate) -> (bool, Option<String>) {
		if let Some(ids) = self.category_ids {
			let hit = candidate
				.category_id
				.as_deref()
				.is_some_and(|id| ids.iter().any(|want| want == id));

			if !hit {
				return (false, Some("category".to_string()));
			}
		}

		for filter in self.attributes {
			if !attribute_matches(candidate, filter) {
				return (
					false,
					Some(format!("{}:{}", filter.operator.as_str(), filter.name)),
				);
			}
		}
		for filter in self.dimensions.iter().chain(self.specs) {
			if !json_matches(candidate, filter) {
				return (
					false,
					Some(format!(
						"{}:{}.{}",
						filter.operator.as_str(),
						filter.field.as_str(),
						filter.path
					)),
				);
			}
		}

		if let Some(reference) = self.reference
			&& !reference_matches(candidate, reference, self.reference_scope)
		{
			return (false, Some("reference".to_string()));
		}
		if !self.standards.is_empty() && !standards_match(candidate, self.standards) {
			return (false, Some("standards".to_string()));
		}

		(true, None)
	}

	pub fn apply(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, FilterImpact) {
		let pre = candidates.len();
		let mut kept = Vec::with_capacity(pre);
		let mut dropped_reason_counts: HashMap<String, usize> = HashMap::new();

		for candidate in candidates {
			let (keep, reason) = self.evaluate(&candidate);

			if keep {
				kept.push(candidate);
			} else {
				dropped_reason_counts
					.entry(reason.unwrap_or_else(|| "no_match".to_string()))
					.and_modify(|count| *count += 1)
					.or_insert(1);
			}
		}

		let post = kept.len();
		let mut top_drop_reasons: Vec<_> = dropped_reason_counts
			.into_iter()
			.map(|(reason, count)| FilterDropReason { reason, count })
			.collect();

		top_drop_reasons.sort_by(|a, b| match b.count.cmp(&a.count) {
			Ordering::Equal => a.reason.cmp(&b.reason),
			other => other,
		});
		top_drop_reasons.truncate(5);

		(
			kept,
			FilterImpact {
				candidate_count_pre: pre,
				candidate_count_post: post,
				dropped_total: pre.saturating_sub(post),
				top_drop_reasons,
			},
		)
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct FilterImpact {
	pub candidate_count_pre: usize,
	pub candidate_count_post: usize,
	pub dropped_total: usize,
	pub top_drop_reasons: Vec<FilterDropReason>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FilterDropReason {
	pub reason: String,
	pub count: usize,
}

fn attribute_matches(candidate: &Candidate, filter: &AttributeFilter) -> bool {
	let Some(attribute) = candidate.attribute(&filter.name) else {
		return false;
	};

	match filter.operator {
		ComparisonOperator::Eq => filter.value.as_ref().is_some_and(|want| {
			match (attribute.as_number(), want.as_number()) {
				(Some(have), Some(want)) => have == want,
				_ => attribute.value == want.to_text(),
			}
		}),
		ComparisonOperator::Contains => filter
			.value
			.as_ref()
			.is_some_and(|want| text::contains_fold(&attribute.value, &want.to_text())),
		ComparisonOperator::Gt =>
			attribute.as_number().zip(filter.min).is_some_and(|(have, min)| have > min),
		ComparisonOperator::Gte =>
			attribute.as_number().zip(filter.min).is_some_and(|(have, min)| have >= min),
		ComparisonOperator::Lt =>
			attribute.as_number().zip(filter.max).is_some_and(|(have, max)| have < max),
		ComparisonOperator::Lte =>
			attribute.as_number().zip(filter.max).is_some_and(|(have, max)| have <= max),
		ComparisonOperator::Between => attribute
			.as_number()
			.zip(filter.min.zip(filter.max))
			.is_some_and(|(have, (min, max))| min <= have && have <= max),
	}
}

fn json_matches(candidate: &Candidate, filter: &JsonFilter) -> bool {
	let document = match filter.field {
		JsonField::Dimensions => &candidate.dimensions,
		JsonField::TechnicalSpecs => &candidate.technical_specs,
	};
	let Some(value) = resolve_path(document, &filter.path) else {
		return false;
	};

	match filter.operator {
		ComparisonOperator::Eq => filter.value.as_ref().is_some_and(|want| json_eq(value, want)),
		ComparisonOperator::Contains =>
			filter.value.as_ref().is_some_and(|want| json_contains(value, &want.to_text())),
		ComparisonOperator::Gt =>
			json_number(value).zip(filter.min).is_some_and(|(have, min)| have > min),
		ComparisonOperator::Gte =>
			json_number(value).zip(filter.min).is_some_and(|(have, min)| have >= min),
		ComparisonOperator::Lt =>
			json_number(value).zip(filter.max).is_some_and(|(have, max)| have < max),
		ComparisonOperator::Lte =>
			json_number(value).zip(filter.max).is_some_and(|(have, max)| have <= max),
		ComparisonOperator::Between => json_number(value)
			.zip(filter.min.zip(filter.max))
			.is_some_and(|(have, (min, max))| min <= have && have <= max),
	}
}

/// Walks a dot-separated key chain; a missing intermediate key means the field is absent.
fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
	path.split('.').try_fold(document, |node, segment| node.as_object()?.get(segment))
}

/// Numeric view of a JSON scalar; numeric strings count.
fn json_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn json_eq(value: &Value, want: &FilterValue) -> bool {
	if let (Some(have), Some(want)) = (json_number(value), want.as_number()) {
		return have == want;
	}

	match value {
		Value::String(s) => s.as_str() == want.to_text(),
		Value::Bool(b) => want.to_text().eq_ignore_ascii_case(if *b { "true" } else { "false" }),
		_ => false,
	}
}

fn json_contains(value: &Value, needle: &str) -> bool {
	match value {
		Value::String(s) => text::contains_fold(s, needle),
		Value::Number(n) => text::contains_fold(&n.to_string(), needle),
		Value::Array(items) => items.iter().any(|item| json_contains(item, needle)),
		_ => false,
	}
}

fn reference_matches(candidate: &Candidate, wanted: &str, scope: ReferenceScope) -> bool {
	candidate
		.references()
		.any(|(kind, number)| scope.admits(kind) && text::contains_fold(number, wanted))
}

fn standards_match(candidate: &Candidate, wanted: &[String]) -> bool {
	wanted.iter().any(|standard| {
		candidate.standards.iter().any(|have| have.eq_ignore_ascii_case(standard))
			|| candidate
				.attribute("standard")
				.is_some_and(|attribute| attribute.value.eq_ignore_ascii_case(standard))
	})
}
