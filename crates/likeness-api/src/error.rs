//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! One variant per taxonomy entry, one status code per variant. Engine and
//! permission errors convert in so handlers can use plain `?`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use likeness_core::permission::PermissionError;
use likeness_engine::{Error as EngineError, ExtractError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  InvalidInput(String),

  /// The extractor found no face in the image. An explicit rejection,
  /// never an empty success payload.
  #[error("no face detected in the image")]
  NoFace,

  #[error("conflict: {0}")]
  Conflict(String),

  /// Extractor failure — a 5xx, not the caller's fault.
  #[error("upstream failure: {0}")]
  Upstream(String),

  /// A store operation exceeded its bounded timeout.
  #[error("store operation timed out")]
  Timeout,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthenticated(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NoFace => {
        (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
      }
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
      ApiError::Store(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self {
    match e {
      EngineError::Unauthenticated => {
        Self::Unauthenticated("token is missing, invalid, or expired".into())
      }
      EngineError::Forbidden(m) => Self::Forbidden(m),
      EngineError::UserNotFound(id) => {
        Self::NotFound(format!("user {id} not found"))
      }
      EngineError::StoreTimeout => Self::Timeout,
      EngineError::Store(e) => Self::Store(e),
      // Configuration-time failures; a running service never produces them
      // from a request, but the conversion must be total.
      EngineError::EmptySecret => {
        Self::Internal("token secret is not configured".into())
      }
      EngineError::Token(inner) => Self::Internal(inner.to_string()),
    }
  }
}

impl From<PermissionError> for ApiError {
  fn from(e: PermissionError) -> Self {
    Self::InvalidInput(e.to_string())
  }
}

impl From<ExtractError> for ApiError {
  fn from(e: ExtractError) -> Self {
    Self::Upstream(e.to_string())
  }
}
