use std::collections::BTreeMap;

use serde_json::Value;
use time::OffsetDateTime;

use trag_domain::{AttributeValue, Candidate, CrossReference};

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
	pub id: String,
	pub name: String,
	pub catalog_number: String,
	pub oem_number: Option<String>,
	pub category_id: Option<String>,
	pub dimensions: Value,
	pub technical_specs: Value,
	pub standards: Vec<String>,
	pub created_at: OffsetDateTime,
}
impl ProductRow {
	pub fn into_candidate(
		self,
		cross_references: Vec<CrossReference>,
		attribute_values: BTreeMap<String, AttributeValue>,
	) -> Candidate {
		Candidate {
			id: self.id,
			name: self.name,
			catalog_number: self.catalog_number,
			oem_number: self.oem_number,
			category_id: self.category_id,
			dimensions: self.dimensions,
			technical_specs: self.technical_specs,
			attribute_values,
			standards: self.standards,
			cross_references,
			created_at: self.created_at,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CrossReferenceRow {
	pub product_id: String,
	pub kind: String,
	pub number: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AttributeValueRow {
	pub product_id: String,
	pub name: String,
	pub value: String,
	pub numeric_value: Option<f64>,
}
