//! User records and lookup keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::PermissionSet;

/// How to locate a user in the store.
///
/// An explicit discriminant rather than "inspect the payload shape" — a
/// request says which unique attribute it is matching on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum UserLookup {
  Id(Uuid),
  Email(String),
  Name(String),
}

/// A stored user. The password hash is an argon2 PHC string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
  pub user_id:       Uuid,
  pub created_at:    DateTime<Utc>,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub is_verified:   bool,
  pub permissions:   PermissionSet,
}

/// Input to [`crate::store::FaceStore::insert_user`].
/// `user_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub is_verified:   bool,
  pub permissions:   PermissionSet,
}
