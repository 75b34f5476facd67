//! Error types for `likeness-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The token is missing, malformed, badly signed, or expired.
  #[error("unauthenticated: token is missing, invalid, or expired")]
  Unauthenticated,

  /// The token is valid but for someone else, or the subject lacks the
  /// required capability. Distinct from [`Error::Unauthenticated`].
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  /// No token secret configured; the service must not start.
  #[error("token secret is not configured")]
  EmptySecret,

  #[error("token encoding error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  /// A store lookup exceeded its bounded timeout.
  #[error("store operation timed out")]
  StoreTimeout,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
