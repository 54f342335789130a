use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
	Oem,
	Original,
	Replacement,
}
impl ReferenceKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Oem => "oem",
			Self::Original => "original",
			Self::Replacement => "replacement",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"oem" => Some(Self::Oem),
			"original" => Some(Self::Original),
			"replacement" => Some(Self::Replacement),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CrossReference {
	pub kind: ReferenceKind,
	pub number: String,
}

/// Raw attribute value together with its pre-parsed numeric shadow.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AttributeValue {
	pub value: String,
	pub numeric_value: Option<f64>,
}
impl AttributeValue {
	pub fn text(value: impl Into<String>) -> Self {
		Self { value: value.into(), numeric_value: None }
	}

	pub fn numeric(value: f64) -> Self {
		Self { value: value.to_string(), numeric_value: Some(value) }
	}

	/// Numeric view: the shadow value when present, else a parse of the raw string.
	pub fn as_number(&self) -> Option<f64> {
		self.numeric_value.or_else(|| self.value.trim().parse().ok())
	}
}

/// One searchable catalog entry as handed to the engine by a candidate source.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Candidate {
	pub id: String,
	pub name: String,
	pub catalog_number: String,
	pub oem_number: Option<String>,
	pub category_id: Option<String>,
	pub dimensions: Value,
	pub technical_specs: Value,
	pub attribute_values: BTreeMap<String, AttributeValue>,
	pub standards: Vec<String>,
	pub cross_references: Vec<CrossReference>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl Candidate {
	pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
		self.attribute_values.get(name)
	}

	/// All reference numbers of the candidate, with the bare `oem_number` column folded in as an
	/// OEM entry.
	pub fn references(&self) -> impl Iterator<Item = (ReferenceKind, &str)> {
		self.oem_number
			.as_deref()
			.map(|number| (ReferenceKind::Oem, number))
			.into_iter()
			.chain(self.cross_references.iter().map(|r| (r.kind, r.number.as_str())))
	}
}
