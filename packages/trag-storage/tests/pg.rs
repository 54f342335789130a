use std::sync::Arc;

use time::OffsetDateTime;

use trag_config::{Config, Postgres, Search, Service, Storage};
use trag_domain::ReferenceKind;
use trag_service::{CandidateSource, Pushdown, SearchParams, SearchService};
use trag_storage::{db::Db, source::PgCandidateSource};
use trag_testkit::TestDatabase;

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	db
}

async fn seed_category(db: &Db, id: &str, parent: Option<&str>) {
	sqlx::query("INSERT INTO product_categories (id, name, parent_id) VALUES ($1, $2, $3)")
		.bind(id)
		.bind(id)
		.bind(parent)
		.execute(&db.pool)
		.await
		.expect("Failed to seed category.");
}

#[allow(clippy::too_many_arguments)]
async fn seed_product(
	db: &Db,
	id: &str,
	name: &str,
	catalog: &str,
	oem: Option<&str>,
	category: Option<&str>,
	standards: &[&str],
	created: i64,
) {
	let standards: Vec<String> = standards.iter().map(|s| s.to_string()).collect();

	sqlx::query(
		"\
INSERT INTO products (id, name, catalog_number, oem_number, category_id, standards, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(id)
	.bind(name)
	.bind(catalog)
	.bind(oem)
	.bind(category)
	.bind(&standards)
	.bind(OffsetDateTime::from_unix_timestamp(1_700_000_000 + created).expect("timestamp"))
	.execute(&db.pool)
	.await
	.expect("Failed to seed product.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TRAG_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = trag_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set TRAG_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Failed to re-run schema bootstrap.");

	let count: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM information_schema.tables
WHERE table_name IN ('product_categories', 'products', 'product_cross_references', 'product_attribute_values')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 4);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TRAG_PG_DSN to run."]
async fn fetch_merges_references_and_attributes() {
	let Some(base_dsn) = trag_testkit::env_dsn() else {
		eprintln!("Skipping fetch_merges_references_and_attributes; set TRAG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	seed_category(&db, "cat-brakes", None).await;
	seed_product(&db, "p1", "Brake disc", "BD-100", Some("34116792219"), Some("cat-brakes"), &[
		"ECE R90",
	], 1)
	.await;
	seed_product(&db, "p2", "Brake drum", "BD-200", None, Some("cat-brakes"), &[], 2).await;

	sqlx::query(
		"INSERT INTO product_cross_references (product_id, kind, number) VALUES ($1, $2, $3)",
	)
	.bind("p1")
	.bind("replacement")
	.bind("DF4823S")
	.execute(&db.pool)
	.await
	.expect("Failed to seed cross reference.");
	sqlx::query(
		"\
INSERT INTO product_attribute_values (product_id, name, value, numeric_value)
VALUES ($1, $2, $3, $4)",
	)
	.bind("p1")
	.bind("diameter")
	.bind("300")
	.bind(300.0_f64)
	.execute(&db.pool)
	.await
	.expect("Failed to seed attribute value.");
	sqlx::query("UPDATE products SET is_archived = TRUE WHERE id = $1")
		.bind("p2")
		.execute(&db.pool)
		.await
		.expect("Failed to archive product.");

	let source = PgCandidateSource::new(db);
	let candidates =
		source.fetch(&Pushdown::default()).await.expect("Failed to fetch candidates.");

	assert_eq!(candidates.len(), 1, "archived rows must not surface");

	let candidate = &candidates[0];

	assert_eq!(candidate.id, "p1");
	assert_eq!(candidate.oem_number.as_deref(), Some("34116792219"));
	assert_eq!(candidate.standards, ["ECE R90"]);
	assert_eq!(candidate.cross_references.len(), 1);
	assert_eq!(candidate.cross_references[0].kind, ReferenceKind::Replacement);
	assert_eq!(candidate.cross_references[0].number, "DF4823S");
	assert_eq!(candidate.attribute("diameter").and_then(|a| a.as_number()), Some(300.0));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TRAG_PG_DSN to run."]
async fn category_subtree_excludes_sibling_branches() {
	let Some(base_dsn) = trag_testkit::env_dsn() else {
		eprintln!("Skipping category_subtree_excludes_sibling_branches; set TRAG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	seed_category(&db, "root", None).await;
	seed_category(&db, "child", Some("root")).await;
	seed_category(&db, "grandchild", Some("child")).await;
	seed_category(&db, "sibling", None).await;

	let source = PgCandidateSource::new(db);
	let mut ids =
		source.category_subtree("root").await.expect("Failed to fetch category subtree.");

	ids.sort_unstable();

	assert_eq!(ids, ["child", "grandchild", "root"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TRAG_PG_DSN to run."]
async fn text_prefilter_drops_dissimilar_rows() {
	let Some(base_dsn) = trag_testkit::env_dsn() else {
		eprintln!("Skipping text_prefilter_drops_dissimilar_rows; set TRAG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	seed_product(&db, "p1", "Bosch alternator", "0986049", None, None, &[], 1).await;
	seed_product(&db, "p2", "Filter", "X123", None, None, &[], 2).await;

	let source = PgCandidateSource::new(db);
	let pushdown = Pushdown { text: Some("bosch 0986".to_string()), ..Default::default() };
	let ids: Vec<String> = source
		.fetch(&pushdown)
		.await
		.expect("Failed to fetch candidates.")
		.into_iter()
		.map(|candidate| candidate.id)
		.collect();

	assert!(ids.contains(&"p1".to_string()));
	assert!(!ids.contains(&"p2".to_string()), "zero-overlap rows fall under the bound");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TRAG_PG_DSN to run."]
async fn text_prefilter_keeps_accented_rows_for_ascii_queries() {
	let Some(base_dsn) = trag_testkit::env_dsn() else {
		eprintln!("Skipping text_prefilter_keeps_accented_rows_for_ascii_queries; set TRAG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	// "Šđž" scores 0.1 in process against the folded query "sdz", exactly at the relevance
	// floor, so the prefilter must not drop it even though lower() alone shares no trigram
	// with the query.
	seed_product(&db, "p1", "Šđž", "XK9", None, None, &[], 1).await;
	seed_product(&db, "p2", "Žičana četka 50mm", "ZC-50", None, None, &[], 2).await;

	let source = PgCandidateSource::new(db);

	for (query, id) in [("sdz", "p1"), ("zicana", "p2")] {
		let pushdown = Pushdown { text: Some(query.to_string()), ..Default::default() };
		let ids: Vec<String> = source
			.fetch(&pushdown)
			.await
			.expect("Failed to fetch candidates.")
			.into_iter()
			.map(|candidate| candidate.id)
			.collect();

		assert!(ids.contains(&id.to_string()), "query {query:?} must fetch {id}");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TRAG_PG_DSN to run."]
async fn search_runs_end_to_end_over_postgres() {
	let Some(base_dsn) = trag_testkit::env_dsn() else {
		eprintln!("Skipping search_runs_end_to_end_over_postgres; set TRAG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	seed_product(&db, "p1", "Bosch alternator", "0986049", None, None, &[], 1).await;
	seed_product(&db, "p2", "Bosch wiper blade", "3397004", None, None, &[], 2).await;
	seed_product(&db, "p3", "Filter", "X123", None, None, &[], 3).await;

	let cfg = Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 },
		},
		search: Search { fetch_timeout_ms: 5_000 },
	};
	let engine = SearchService::new(cfg, Arc::new(PgCandidateSource::new(db)));
	let first = engine
		.search(&SearchParams {
			query: Some("bosch 0986".to_string()),
			limit: 1,
			..Default::default()
		})
		.await
		.expect("Failed to search.");

	assert_eq!(first.total, 2);
	assert_eq!(first.items[0].id, "p1");

	let cursor = first.next_cursor.expect("full page must carry a cursor");
	let second = engine
		.search(&SearchParams {
			query: Some("bosch 0986".to_string()),
			limit: 1,
			cursor_score: Some(cursor.score),
			cursor_id: Some(cursor.id),
			..Default::default()
		})
		.await
		.expect("Failed to search.");

	assert_eq!(second.items[0].id, "p2");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
