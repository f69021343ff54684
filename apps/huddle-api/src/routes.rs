use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use huddle_service::{
	Error, FilterRequest, FilterResponse, SearchRequest, SearchResponse, search::REQUIRED_FIELDS,
};

const INVALID_REQUEST: &str = "INVALID_REQUEST";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/search", post(search))
		.route("/api/messages/filter", post(filter_messages))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let Json(payload) = payload.map_err(|err| {
		tracing::warn!(error = %err, "Rejected malformed search request.");

		ApiError::invalid_request(REQUIRED_FIELDS)
	})?;
	let response = state
		.service
		.search(payload)
		.await
		.map_err(|err| ApiError::from_service(Operation::Search, err))?;

	Ok(Json(response))
}

async fn filter_messages(
	State(state): State<AppState>,
	payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<FilterResponse>, ApiError> {
	let Json(payload) = payload.map_err(|err| {
		tracing::warn!(error = %err, "Rejected malformed filter request.");

		ApiError::invalid_request(format!("Invalid request body: {}", err.body_text()))
	})?;
	let response = state
		.service
		.filter_messages(payload)
		.await
		.map_err(|err| ApiError::from_service(Operation::Filter, err))?;

	Ok(Json(response))
}

#[derive(Debug, Clone, Copy)]
enum Operation {
	Search,
	Filter,
}
impl Operation {
	fn name(self) -> &'static str {
		match self {
			Self::Search => "search",
			Self::Filter => "filter",
		}
	}

	fn failure(self) -> (&'static str, &'static str) {
		match self {
			Self::Search => ("SEARCH_FAILED", "Failed to search messages"),
			Self::Filter => ("FILTER_FAILED", "Failed to filter messages"),
		}
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	error_code: &'static str,
}

/// Client-facing error. Internal causes are logged, never returned.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	error: String,
}
impl ApiError {
	fn invalid_request(error: impl Into<String>) -> Self {
		Self { status: StatusCode::BAD_REQUEST, error_code: INVALID_REQUEST, error: error.into() }
	}

	fn from_service(operation: Operation, err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => Self::invalid_request(message),
			err => {
				tracing::error!(operation = operation.name(), error = %err, "Request failed.");

				let (error_code, error) = operation.failure();

				Self {
					status: StatusCode::INTERNAL_SERVER_ERROR,
					error_code,
					error: error.to_string(),
				}
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.error, error_code: self.error_code };

		(self.status, Json(body)).into_response()
	}
}
