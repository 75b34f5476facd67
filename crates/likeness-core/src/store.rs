//! The `FaceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `likeness-store-sqlite`).
//! Higher layers (`likeness-engine`, `likeness-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  face::{FaceRecord, NewFace},
  permission::{Capability, PermissionSet},
  user::{NewUser, UserLookup, UserRecord},
};

/// Error contract for storage backends.
///
/// API layers need one backend-independent distinction: did the operation
/// fail because a unique attribute was already taken (a client conflict),
/// or for any other reason (a server fault)?
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// True when the operation lost to an existing record on a unique
  /// attribute (e.g. a registration racing another for the same email).
  fn is_conflict(&self) -> bool {
    false
  }
}

/// Abstraction over a Likeness persistence backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FaceStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Find exactly one user by a unique attribute. `None` if absent.
  fn find_user(
    &self,
    lookup: UserLookup,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// Create and persist a new user. Fails if the email is already taken.
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Flag a user's email address as verified.
  /// Returns `false` if the user does not exist.
  fn mark_verified(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Grant or revoke one capability on a user's stored permission set.
  ///
  /// The read-modify-write runs as a single unit inside the store, so
  /// concurrent calls for different bits on the same user both land.
  /// Returns the resulting set, or `None` if the user does not exist.
  fn apply_permission(
    &self,
    user_id: Uuid,
    capability: Capability,
    grant: bool,
  ) -> impl Future<Output = Result<Option<PermissionSet>, Self::Error>> + Send + '_;

  /// Delete a user. Returns `false` if the user does not exist.
  fn delete_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Faces ─────────────────────────────────────────────────────────────

  /// Persist a new face record. The embedding is immutable from here on.
  fn insert_face(
    &self,
    input: NewFace,
  ) -> impl Future<Output = Result<FaceRecord, Self::Error>> + Send + '_;

  /// Retrieve a face by id. `None` if absent.
  fn get_face(
    &self,
    face_id: Uuid,
  ) -> impl Future<Output = Result<Option<FaceRecord>, Self::Error>> + Send + '_;

  /// Return every stored face. Used by the embedding cache for a full
  /// snapshot reload.
  fn list_faces(
    &self,
  ) -> impl Future<Output = Result<Vec<FaceRecord>, Self::Error>> + Send + '_;

  /// Replace a face's label (the only mutable field).
  /// Returns `false` if the face does not exist.
  fn update_face_label(
    &self,
    face_id: Uuid,
    label: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a face. Returns `false` if the face does not exist.
  fn delete_face(
    &self,
    face_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Number of stored faces.
  fn count_faces(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
