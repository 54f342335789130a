use axum::{
	Json, Router,
	extract::{Query, State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;

use trag_service::{Error as ServiceError, SearchItem, SearchParams, SearchResult};

use crate::{
	query::{QueryError, RawQuickQuery, RawSearchQuery},
	state::AppState,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", get(search_get).post(search_post))
		.route("/v1/search/quick", get(quick))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_post(
	State(state): State<AppState>,
	payload: Result<Json<SearchParams>, JsonRejection>,
) -> Result<Json<SearchResult<SearchItem>>, ApiError> {
	let Json(params) = payload?;
	let response = state.service.search(&params).await?;

	Ok(Json(response))
}

async fn search_get(
	State(state): State<AppState>,
	Query(raw): Query<RawSearchQuery>,
) -> Result<Json<SearchResult<SearchItem>>, ApiError> {
	let params = raw.into_params()?;
	let response = state.service.search(&params).await?;

	Ok(Json(response))
}

async fn quick(
	State(state): State<AppState>,
	Query(raw): Query<RawQuickQuery>,
) -> Result<Json<Vec<SearchItem>>, ApiError> {
	let items = state.service.quick(&raw.into_params()).await?;

	Ok(Json(items))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	field: Option<String>,
	retryable: bool,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
	field: Option<String>,
	retryable: bool,
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let retryable = err.is_retryable();
		let message = err.to_string();

		match err {
			ServiceError::Validation { field, .. } => Self {
				status: StatusCode::BAD_REQUEST,
				error_code: "validation_error",
				message,
				field: Some(field),
				retryable,
			},
			ServiceError::Retrieval { .. } => Self {
				status: StatusCode::SERVICE_UNAVAILABLE,
				error_code: "retrieval_failure",
				message,
				field: None,
				retryable,
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		Self {
			status: err.status(),
			error_code: "validation_error",
			message: err.body_text(),
			field: None,
			retryable: false,
		}
	}
}
impl From<QueryError> for ApiError {
	fn from(err: QueryError) -> Self {
		Self {
			status: StatusCode::BAD_REQUEST,
			error_code: "validation_error",
			message: format!("Invalid request at {}: {}", err.param, err.message),
			field: Some(err.param.to_string()),
			retryable: false,
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			field: self.field,
			retryable: self.retryable,
		};

		(self.status, Json(body)).into_response()
	}
}
