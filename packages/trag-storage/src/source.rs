use std::collections::{BTreeMap, HashMap};

use sqlx::{Postgres, QueryBuilder};

use trag_domain::{AttributeValue, Candidate, CrossReference, ReferenceKind};
use trag_service::{BoxFuture, CandidateSource, Pushdown, ReferenceScope};

use crate::{
	Result,
	db::Db,
	models::{AttributeValueRow, CrossReferenceRow, ProductRow},
};

/// Per-column trigram bound for the SQL prefilter.
///
/// The relevance floor is `0.1` over a `0.7`/`0.3` weighted sum, so a row below `0.05` on both
/// columns tops out at `0.05` and can never survive scoring. Both sides of the SQL comparison
/// run through `immutable_unaccent(lower(...))`, matching the in-process fold; the factor-of-two
/// slack absorbs the residual drift for characters the unaccent dictionary maps but NFKD leaves
/// intact (`đ`, ligatures), which land on both sides consistently.
const TEXT_PREFILTER_BOUND: f64 = 0.05;

/// Candidate source backed by the `products` tables.
///
/// Pushdown handling is deliberately conservative. Every clause built here is a necessary
/// condition of the in-process predicate it mirrors, so the scan may return extra rows but never
/// misses one. Reference text in particular is not matched in SQL at all, because `ILIKE` cannot
/// reproduce the fold the evaluator applies; only the presence of a reference of the requested
/// kind is checked.
pub struct PgCandidateSource {
	db: Db,
}
impl PgCandidateSource {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	async fn fetch_candidates(&self, pushdown: &Pushdown) -> Result<Vec<Candidate>> {
		let mut builder = product_query(pushdown);
		let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.db.pool).await?;

		if rows.is_empty() {
			return Ok(Vec::new());
		}

		let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
		let mut references = self.load_cross_references(&ids).await?;
		let mut attributes = self.load_attribute_values(&ids).await?;
		let candidates = rows
			.into_iter()
			.map(|row| {
				let refs = references.remove(&row.id).unwrap_or_default();
				let attrs = attributes.remove(&row.id).unwrap_or_default();

				row.into_candidate(refs, attrs)
			})
			.collect();

		Ok(candidates)
	}

	async fn load_cross_references(
		&self,
		ids: &[String],
	) -> Result<HashMap<String, Vec<CrossReference>>> {
		let rows: Vec<CrossReferenceRow> = sqlx::query_as(
			"\
SELECT product_id, kind, number
FROM product_cross_references
WHERE product_id = ANY($1::text[])
ORDER BY product_id, id",
		)
		.bind(ids)
		.fetch_all(&self.db.pool)
		.await?;
		let mut map: HashMap<String, Vec<CrossReference>> = HashMap::new();

		for row in rows {
			// The kind column is CHECK-constrained, unknown values only appear if the constraint
			// was relaxed by hand.
			let Some(kind) = ReferenceKind::parse(&row.kind) else {
				continue;
			};

			map.entry(row.product_id)
				.or_default()
				.push(CrossReference { kind, number: row.number });
		}

		Ok(map)
	}

	async fn load_attribute_values(
		&self,
		ids: &[String],
	) -> Result<HashMap<String, BTreeMap<String, AttributeValue>>> {
		let rows: Vec<AttributeValueRow> = sqlx::query_as(
			"\
SELECT product_id, name, value, numeric_value
FROM product_attribute_values
WHERE product_id = ANY($1::text[])
ORDER BY product_id, name",
		)
		.bind(ids)
		.fetch_all(&self.db.pool)
		.await?;
		let mut map: HashMap<String, BTreeMap<String, AttributeValue>> = HashMap::new();

		for row in rows {
			map.entry(row.product_id).or_default().insert(
				row.name,
				AttributeValue { value: row.value, numeric_value: row.numeric_value },
			);
		}

		Ok(map)
	}

	async fn subtree(&self, root: &str) -> Result<Vec<String>> {
		let ids: Vec<String> = sqlx::query_scalar(
			"\
WITH RECURSIVE subtree AS (
	SELECT id
	FROM product_categories
	WHERE id = $1
	UNION
	SELECT c.id
	FROM product_categories c
	JOIN subtree s ON c.parent_id = s.id
)
SELECT id FROM subtree",
		)
		.bind(root)
		.fetch_all(&self.db.pool)
		.await?;

		Ok(ids)
	}
}
impl CandidateSource for PgCandidateSource {
	fn fetch<'a>(
		&'a self,
		pushdown: &'a Pushdown,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>> {
		Box::pin(async move { Ok(self.fetch_candidates(pushdown).await?) })
	}

	fn category_subtree<'a>(
		&'a self,
		root: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(async move { Ok(self.subtree(root).await?) })
	}
}

fn product_query<'a>(pushdown: &'a Pushdown) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT id, name, catalog_number, oem_number, category_id, dimensions, technical_specs, standards, created_at \
		 FROM products WHERE is_archived = FALSE",
	);

	if let Some(category_ids) = &pushdown.category_ids {
		builder.push(" AND category_id = ANY(");
		builder.push_bind(category_ids);
		builder.push("::text[])");
	}
	if let Some(text) = &pushdown.text {
		builder.push(" AND (similarity(immutable_unaccent(lower(name)), immutable_unaccent(");
		builder.push_bind(text.as_str());
		builder.push(")) >= ");
		builder.push_bind(TEXT_PREFILTER_BOUND);
		builder.push(
			" OR similarity(immutable_unaccent(lower(catalog_number)), immutable_unaccent(",
		);
		builder.push_bind(text.as_str());
		builder.push(")) >= ");
		builder.push_bind(TEXT_PREFILTER_BOUND);
		builder.push(")");
	}
	if pushdown.reference.is_some() {
		push_reference_presence(&mut builder, pushdown.reference_scope);
	}
	if !pushdown.standards.is_empty() {
		let lowered: Vec<String> =
			pushdown.standards.iter().map(|standard| standard.to_lowercase()).collect();

		builder.push(
			" AND (EXISTS (SELECT 1 FROM unnest(products.standards) AS s WHERE lower(s) = ANY(",
		);
		builder.push_bind(lowered.clone());
		builder.push(
			"::text[])) OR EXISTS (SELECT 1 FROM product_attribute_values av \
			 WHERE av.product_id = products.id AND av.name = 'standard' AND lower(av.value) = ANY(",
		);
		builder.push_bind(lowered);
		builder.push("::text[])))");
	}
	for filter in &pushdown.attributes {
		builder.push(
			" AND EXISTS (SELECT 1 FROM product_attribute_values av \
			 WHERE av.product_id = products.id AND av.name = ",
		);
		builder.push_bind(filter.name.as_str());
		builder.push(")");
	}

	builder
}

fn push_reference_presence(builder: &mut QueryBuilder<'_, Postgres>, scope: ReferenceScope) {
	match scope {
		ReferenceScope::Oem => {
			builder.push(
				" AND (oem_number IS NOT NULL OR EXISTS (SELECT 1 FROM product_cross_references r \
				 WHERE r.product_id = products.id AND r.kind = 'oem'))",
			);
		},
		ReferenceScope::Original => {
			builder.push(
				" AND EXISTS (SELECT 1 FROM product_cross_references r \
				 WHERE r.product_id = products.id AND r.kind = 'original')",
			);
		},
		ReferenceScope::Replacement => {
			builder.push(
				" AND EXISTS (SELECT 1 FROM product_cross_references r \
				 WHERE r.product_id = products.id AND r.kind = 'replacement')",
			);
		},
		ReferenceScope::All => {
			builder.push(
				" AND (oem_number IS NOT NULL OR EXISTS (SELECT 1 FROM product_cross_references r \
				 WHERE r.product_id = products.id))",
			);
		},
	}
}

#[cfg(test)]
mod tests {
	use trag_service::{AttributeFilter, ComparisonOperator, Pushdown, ReferenceScope};

	use super::product_query;

	fn sql(pushdown: &Pushdown) -> String {
		product_query(pushdown).into_sql()
	}

	#[test]
	fn the_base_scan_only_excludes_archived_rows() {
		let rendered = sql(&Pushdown::default());

		assert!(rendered.contains("is_archived = FALSE"));
		assert!(!rendered.contains("category_id = ANY"));
		assert!(!rendered.contains("similarity"));
		assert!(!rendered.contains("EXISTS"));
	}

	#[test]
	fn categories_narrow_to_an_id_list() {
		let pushdown =
			Pushdown { category_ids: Some(vec!["cat-1".to_string()]), ..Default::default() };
		let rendered = sql(&pushdown);

		assert!(rendered.contains("category_id = ANY($1::text[])"));
	}

	#[test]
	fn query_text_prefilters_both_trigram_columns() {
		let pushdown = Pushdown { text: Some("bosch 0986".to_string()), ..Default::default() };
		let rendered = sql(&pushdown);

		assert!(rendered
			.contains("similarity(immutable_unaccent(lower(name)), immutable_unaccent($1)) >= $2"));
		assert!(rendered.contains(
			"similarity(immutable_unaccent(lower(catalog_number)), immutable_unaccent($3)) >= $4"
		));
	}

	#[test]
	fn reference_presence_follows_the_requested_kind() {
		let all = sql(&Pushdown {
			reference: Some("A123".to_string()),
			reference_scope: ReferenceScope::All,
			..Default::default()
		});

		assert!(all.contains("oem_number IS NOT NULL"));
		assert!(!all.contains("r.kind"));

		let replacement = sql(&Pushdown {
			reference: Some("A123".to_string()),
			reference_scope: ReferenceScope::Replacement,
			..Default::default()
		});

		assert!(replacement.contains("r.kind = 'replacement'"));
		assert!(!replacement.contains("oem_number IS NOT NULL"));

		let oem = sql(&Pushdown {
			reference: Some("A123".to_string()),
			reference_scope: ReferenceScope::Oem,
			..Default::default()
		});

		assert!(oem.contains("oem_number IS NOT NULL"));
		assert!(oem.contains("r.kind = 'oem'"));
	}

	#[test]
	fn standards_check_both_the_array_and_the_attribute() {
		let pushdown =
			Pushdown { standards: vec!["DIN 934".to_string()], ..Default::default() };
		let rendered = sql(&pushdown);

		assert!(rendered.contains("unnest(products.standards)"));
		assert!(rendered.contains("av.name = 'standard'"));
	}

	#[test]
	fn attribute_filters_only_require_the_attribute_to_exist() {
		let pushdown = Pushdown {
			attributes: vec![
				AttributeFilter {
					name: "diameter".to_string(),
					operator: ComparisonOperator::Gt,
					value: None,
					min: Some(10.0),
					max: None,
				},
				AttributeFilter {
					name: "material".to_string(),
					operator: ComparisonOperator::Eq,
					value: None,
					min: None,
					max: None,
				},
			],
			..Default::default()
		};
		let rendered = sql(&pushdown);

		assert_eq!(rendered.matches("av.name = $").count(), 2);
		assert!(!rendered.contains("av.numeric_value"), "operators are re-checked in process");
	}
}
