//! The authorization guard.
//!
//! Single admission check composed of token authentication, a user lookup,
//! and a permission test. Every state-changing or sensitive-read operation
//! goes through [`Authorizer::authorize`] with the capability it requires.

use std::time::Duration;

use tokio::time::timeout;
use uuid::Uuid;

use likeness_core::{
  permission::Capability,
  store::FaceStore,
  user::{UserLookup, UserRecord},
};

use crate::{
  error::{Error, Result},
  token::TokenService,
};

pub struct Authorizer {
  tokens: TokenService,
  /// Bound on the user lookup so a slow store cannot stall request
  /// handling indefinitely.
  store_timeout: Duration,
}

impl Authorizer {
  pub fn new(tokens: TokenService, store_timeout: Duration) -> Self {
    Self { tokens, store_timeout }
  }

  pub fn tokens(&self) -> &TokenService {
    &self.tokens
  }

  /// Authenticate `claimed` against `token` and load their record.
  ///
  /// No capability check — for operations a user may always perform on
  /// themselves (profile reads, self-deletion, email verification).
  pub async fn identify<S>(
    &self,
    store: &S,
    claimed: Uuid,
    token: &str,
  ) -> Result<UserRecord>
  where
    S: FaceStore,
  {
    self.tokens.authenticate(claimed, token)?;

    let record = timeout(self.store_timeout, store.find_user(UserLookup::Id(claimed)))
      .await
      .map_err(|_| Error::StoreTimeout)?
      .map_err(|e| Error::Store(Box::new(e)))?
      .ok_or(Error::UserNotFound(claimed))?;

    Ok(record)
  }

  /// Full admission check: token, user record, capability.
  ///
  /// Token failures propagate unchanged (401/403 asymmetry preserved);
  /// a present user lacking `capability` is [`Error::Forbidden`].
  pub async fn authorize<S>(
    &self,
    store: &S,
    claimed: Uuid,
    token: &str,
    capability: Capability,
  ) -> Result<UserRecord>
  where
    S: FaceStore,
  {
    let record = self.identify(store, claimed, token).await?;

    if !record.permissions.contains(capability) {
      tracing::debug!(user = %claimed, ?capability, "capability check failed");
      return Err(Error::Forbidden(format!(
        "user {claimed} lacks the {capability:?} capability"
      )));
    }

    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  use likeness_core::{
    face::{FaceRecord, NewFace},
    permission::PermissionSet,
    user::NewUser,
  };

  #[derive(Debug, thiserror::Error)]
  #[error("stub store failure")]
  struct StubError;

  impl likeness_core::store::StoreError for StubError {}

  /// Holds a single user; only `find_user` is reachable from the guard.
  struct OneUserStore {
    user: UserRecord,
  }

  impl FaceStore for OneUserStore {
    type Error = StubError;

    async fn find_user(
      &self,
      lookup: UserLookup,
    ) -> Result<Option<UserRecord>, StubError> {
      Ok(match lookup {
        UserLookup::Id(id) if id == self.user.user_id => {
          Some(self.user.clone())
        }
        _ => None,
      })
    }

    async fn insert_user(&self, _: NewUser) -> Result<UserRecord, StubError> { unimplemented!() }
    async fn mark_verified(&self, _: Uuid) -> Result<bool, StubError> { unimplemented!() }
    async fn apply_permission(&self, _: Uuid, _: Capability, _: bool) -> Result<Option<PermissionSet>, StubError> { unimplemented!() }
    async fn delete_user(&self, _: Uuid) -> Result<bool, StubError> { unimplemented!() }
    async fn insert_face(&self, _: NewFace) -> Result<FaceRecord, StubError> { unimplemented!() }
    async fn get_face(&self, _: Uuid) -> Result<Option<FaceRecord>, StubError> { unimplemented!() }
    async fn list_faces(&self) -> Result<Vec<FaceRecord>, StubError> { unimplemented!() }
    async fn update_face_label(&self, _: Uuid, _: Option<String>) -> Result<bool, StubError> { unimplemented!() }
    async fn delete_face(&self, _: Uuid) -> Result<bool, StubError> { unimplemented!() }
    async fn count_faces(&self) -> Result<u64, StubError> { unimplemented!() }
  }

  fn user_with(permissions: PermissionSet) -> UserRecord {
    UserRecord {
      user_id: Uuid::new_v4(),
      created_at: Utc::now(),
      email: "alice@example.com".into(),
      name: "alice".into(),
      password_hash: "$argon2id$stub".into(),
      is_verified: true,
      permissions,
    }
  }

  fn authorizer() -> Authorizer {
    Authorizer::new(
      TokenService::new("test-secret").unwrap(),
      Duration::from_secs(5),
    )
  }

  #[tokio::test]
  async fn authorize_passes_with_capability() {
    let auth = authorizer();
    let user = user_with(PermissionSet::default());
    let store = OneUserStore { user: user.clone() };
    let token = auth.tokens().issue(user.user_id).unwrap();

    let record = auth
      .authorize(&store, user.user_id, &token, Capability::Write)
      .await
      .unwrap();
    assert_eq!(record.user_id, user.user_id);
  }

  #[tokio::test]
  async fn missing_capability_is_forbidden() {
    let auth = authorizer();
    let user = user_with(PermissionSet::empty().with(Capability::Read));
    let store = OneUserStore { user: user.clone() };
    let token = auth.tokens().issue(user.user_id).unwrap();

    let err = auth
      .authorize(&store, user.user_id, &token, Capability::Write)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[tokio::test]
  async fn unknown_user_is_not_found() {
    let auth = authorizer();
    let store = OneUserStore { user: user_with(PermissionSet::default()) };
    let stranger = Uuid::new_v4();
    let token = auth.tokens().issue(stranger).unwrap();

    let err = auth
      .authorize(&store, stranger, &token, Capability::Write)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::UserNotFound(id) if id == stranger));
  }

  #[tokio::test]
  async fn someone_elses_token_is_forbidden_before_any_lookup() {
    let auth = authorizer();
    let user = user_with(PermissionSet::default());
    let store = OneUserStore { user: user.clone() };
    let other_token = auth.tokens().issue(Uuid::new_v4()).unwrap();

    let err = auth
      .authorize(&store, user.user_id, &other_token, Capability::Write)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }
}
