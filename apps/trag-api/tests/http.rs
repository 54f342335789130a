use std::{collections::BTreeMap, sync::Arc};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use time::OffsetDateTime;
use tower::util::ServiceExt;

use trag_api::{routes, state::AppState};
use trag_config::{Config, Postgres, Search, Service, Storage};
use trag_domain::Candidate;
use trag_service::SearchService;
use trag_testkit::MemorySource;

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://localhost/unused".to_string(),
				pool_max_conns: 1,
			},
		},
		search: Search { fetch_timeout_ms: 250 },
	}
}

fn candidate(id: &str, name: &str, catalog: &str, created: i64) -> Candidate {
	Candidate {
		id: id.to_string(),
		name: name.to_string(),
		catalog_number: catalog.to_string(),
		oem_number: None,
		category_id: None,
		dimensions: serde_json::json!({}),
		technical_specs: serde_json::json!({}),
		attribute_values: BTreeMap::new(),
		standards: Vec::new(),
		cross_references: Vec::new(),
		created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000 + created)
			.expect("timestamp"),
	}
}

fn app(source: MemorySource) -> Router {
	let state = AppState::with_service(SearchService::new(test_config(), Arc::new(source)));

	routes::router(state)
}

fn bosch_corpus() -> Vec<Candidate> {
	vec![
		candidate("c1", "Bosch alternator", "0986049", 1),
		candidate("c2", "Filter", "X123", 2),
		candidate("c3", "Bosch wiper blade", "3397004", 3),
	]
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
	let response = app.oneshot(request).await.expect("Failed to call the router.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if bytes.is_empty() {
		serde_json::Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Failed to parse response.")
	};

	(status, json)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

#[tokio::test]
async fn health_ok() {
	let (status, _) = send(app(MemorySource::new(Vec::new())), get("/health")).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn post_search_returns_scored_items_in_camel_case() {
	let payload = serde_json::json!({ "query": "bosch 0986" });
	let (status, json) =
		send(app(MemorySource::new(bosch_corpus())), post_json("/v1/search", payload)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["total"], 2);
	assert_eq!(json["page"], 1);
	assert_eq!(json["limit"], 20);
	assert_eq!(json["totalPages"], 1);
	assert_eq!(json["items"][0]["id"], "c1");
	assert_eq!(json["items"][0]["catalogNumber"], "0986049");
	assert_eq!(json["items"][0]["exactMatch"], false);
	assert!(json["items"][0]["score"].is_number());
	assert!(json["nextCursor"].is_null(), "a short page must not carry a cursor");
}

#[tokio::test]
async fn get_search_matches_the_post_surface() {
	let (status, json) =
		send(app(MemorySource::new(bosch_corpus())), get("/v1/search?query=bosch%200986")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["total"], 2);
	assert_eq!(json["items"][0]["id"], "c1");
}

#[tokio::test]
async fn get_search_accepts_json_filter_parameters() {
	let uri = "/v1/search?attributes=%5B%7B%22name%22%3A%22diameter%22%2C%22operator%22%3A%22gte%22%2C%22min%22%3A50%7D%5D";
	let (status, json) = send(app(MemorySource::new(bosch_corpus())), get(uri)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["total"], 0, "no candidate carries the attribute");
}

#[tokio::test]
async fn cursor_continuation_round_trips_through_the_wire() {
	let router = app(MemorySource::new(bosch_corpus()));
	let (status, first) = send(
		router.clone(),
		post_json("/v1/search", serde_json::json!({ "query": "bosch 0986", "limit": 1 })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(first["items"][0]["id"], "c1");

	let score = first["nextCursor"]["score"].as_f64().expect("cursor score");
	let id = first["nextCursor"]["id"].as_str().expect("cursor id");
	let (status, second) = send(
		router,
		post_json(
			"/v1/search",
			serde_json::json!({ "query": "bosch 0986", "limit": 1, "cursorScore": score, "cursorId": id }),
		),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(second["items"][0]["id"], "c3");
}

#[tokio::test]
async fn validation_errors_use_the_error_envelope() {
	let payload = serde_json::json!({ "page": 0 });
	let (status, json) =
		send(app(MemorySource::new(Vec::new())), post_json("/v1/search", payload)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "validation_error");
	assert_eq!(json["field"], "$.page");
	assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn malformed_post_bodies_use_the_error_envelope() {
	let request = Request::builder()
		.method("POST")
		.uri("/v1/search")
		.header("content-type", "application/json")
		.body(Body::from(r#"{"query": "#))
		.expect("Failed to build request.");
	let (status, json) = send(app(MemorySource::new(Vec::new())), request).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "validation_error");
	assert_eq!(json["retryable"], false);
	assert!(json["message"].is_string(), "the rejection must land in the shared envelope");
}

#[tokio::test]
async fn malformed_get_filters_are_named_in_the_envelope() {
	let (status, json) =
		send(app(MemorySource::new(Vec::new())), get("/v1/search?attributes=notjson")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "validation_error");
	assert_eq!(json["field"], "attributes");
}

#[tokio::test]
async fn retrieval_failures_map_to_service_unavailable() {
	let (status, json) =
		send(app(MemorySource::failing()), post_json("/v1/search", serde_json::json!({}))).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json["error_code"], "retrieval_failure");
	assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn quick_search_returns_a_bare_item_list() {
	let corpus = vec![
		candidate("q1", "Brake disc", "BD-100", 1),
		candidate("q2", "Brake pads", "BP-200", 2),
	];
	let (status, json) =
		send(app(MemorySource::new(corpus)), get("/v1/search/quick?q=brake")).await;

	assert_eq!(status, StatusCode::OK);

	let items = json.as_array().expect("bare list");

	assert_eq!(items.len(), 2);
	assert_eq!(items[0]["id"], "q2", "ties order newest first");
}

#[tokio::test]
async fn quick_search_rejects_short_queries() {
	let (status, json) =
		send(app(MemorySource::new(Vec::new())), get("/v1/search/quick?q=br")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "validation_error");
	assert_eq!(json["field"], "$.query");
}
