//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The cached questionnaire is structurally broken.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<questree_session::Error> for ApiError {
  fn from(err: questree_session::Error) -> Self {
    use questree_session::Error;
    match err {
      Error::QuestionNotFound(id) => {
        ApiError::NotFound(format!("question {id} not found"))
      }
      Error::InvalidMove { question, reason } => {
        ApiError::BadRequest(format!("cannot move question {question}: {reason}"))
      }
      Error::Tree(e) => e.into(),
      Error::Backend(e) => ApiError::Store(e),
    }
  }
}

impl From<questree_core::Error> for ApiError {
  fn from(err: questree_core::Error) -> Self { ApiError::Conflict(err.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
