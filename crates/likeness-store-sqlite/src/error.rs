//! Error type for `likeness-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The email column is unique; registration with a taken address fails.
  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl likeness_core::store::StoreError for Error {
  fn is_conflict(&self) -> bool {
    matches!(self, Error::EmailTaken(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
