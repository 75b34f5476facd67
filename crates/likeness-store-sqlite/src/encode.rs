//! Encoding and decoding helpers between Rust domain types and the
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, embeddings as compact JSON float arrays.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use likeness_core::{
  face::{Embedding, FaceRecord},
  permission::PermissionSet,
  user::UserRecord,
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Embedding ───────────────────────────────────────────────────────────────

pub fn encode_embedding(e: &Embedding) -> Result<String> {
  Ok(serde_json::to_string(e)?)
}

pub fn decode_embedding(s: &str) -> Result<Embedding> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub created_at:    String,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub is_verified:   bool,
  pub permissions:   i64,
}

impl RawUser {
  pub fn into_user(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user_id:       decode_uuid(&self.user_id)?,
      created_at:    decode_dt(&self.created_at)?,
      email:         self.email,
      name:          self.name,
      password_hash: self.password_hash,
      is_verified:   self.is_verified,
      permissions:   PermissionSet::from_bits(self.permissions as u8),
    })
  }
}

/// Raw values read directly from a `faces` row.
pub struct RawFace {
  pub face_id:     String,
  pub uploaded_by: String,
  pub uploaded_at: String,
  pub blob:        Vec<u8>,
  pub embedding:   String,
  pub label:       Option<String>,
}

impl RawFace {
  pub fn into_face(self) -> Result<FaceRecord> {
    Ok(FaceRecord {
      face_id:     decode_uuid(&self.face_id)?,
      uploaded_by: decode_uuid(&self.uploaded_by)?,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      blob:        self.blob,
      embedding:   decode_embedding(&self.embedding)?,
      label:       self.label,
    })
  }
}
