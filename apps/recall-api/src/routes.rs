use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use recall_service::{
	ContextRequest, ContextResponse, Error, FeedbackRequest, FeedbackResponse,
	RebuildIndexRequest, RebuildIndexResponse, SearchRequest, SearchResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/feedback", post(feedback))
		.route("/v1/context", post(context))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/admin/rebuild_index", post(rebuild_index))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn feedback(
	State(state): State<AppState>,
	payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.record_feedback(payload).await?;

	Ok(Json(response))
}

async fn context(
	State(state): State<AppState>,
	payload: Result<Json<ContextRequest>, JsonRejection>,
) -> Result<Json<ContextResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.build_context(payload).await?;

	Ok(Json(response))
}

async fn rebuild_index(
	State(state): State<AppState>,
	payload: Result<Json<RebuildIndexRequest>, JsonRejection>,
) -> Result<Json<RebuildIndexResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.rebuild_index(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into(), fields: None }
	}

	fn with_fields(mut self, fields: Vec<String>) -> Self {
		self.fields = Some(fields);

		self
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Provider { message }
			| Error::Qdrant { message }
			| Error::UpstreamUnavailable { message } =>
				Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", message),
			err @ (Error::Storage { .. }
			| Error::PartialDataMissing { .. }
			| Error::MalformedCandidate { .. }
			| Error::MaintenanceWriteFailed { .. }) => {
				tracing::error!(error = %err, "Request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal error.")
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		let status = rejection.status();
		let message = rejection.body_text();
		let fields = field_from_rejection(&message);
		let err = Self::new(status, "INVALID_REQUEST", message);

		match fields {
			Some(field) => err.with_fields(vec![field]),
			None => err,
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code.to_string(),
			message: self.message,
			fields: self.fields,
		};

		(self.status, Json(body)).into_response()
	}
}

// serde reports unknown and missing fields as "... field `name` ...".
fn field_from_rejection(message: &str) -> Option<String> {
	let start = message.find("field `")? + "field `".len();
	let len = message[start..].find('`')?;

	Some(format!("$.{}", &message[start..start + len]))
}
