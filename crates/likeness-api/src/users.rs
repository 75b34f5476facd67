//! Handlers for `/user` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/user/register` | Body: `{"email","name","password"}` |
//! | `GET`  | `/user/verify-email` | `?user_id=<id>&token=<jwt>` |
//! | `POST` | `/user/login` | Body: `{"by":"email"\|"name", ...}` |
//! | `GET`  | `/user/{id}` | Bearer token must belong to `{id}` |
//! | `POST` | `/user/delete` | Deleting another user needs `DeleteUsers` |
//! | `POST` | `/user/permission` | Needs `GrantPermission` |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rand_core::OsRng;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use likeness_core::{
  permission::{Capability, PermissionSet},
  store::{FaceStore, StoreError as _},
  user::{NewUser, UserLookup},
};

use crate::{AppState, auth::Bearer, error::ApiError};

/// Produce an argon2 PHC string for `password`.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))?
      .to_string(),
  )
}

/// Check `password` against a stored PHC string.
fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub name:     String,
  pub password: String,
}

/// `POST /user/register` — open to unauthenticated callers.
///
/// Responds 201 with the new id and an email-verification token; the
/// caller cannot log in until the address is verified (unless the server
/// runs with `default_verified`).
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FaceStore,
{
  if body.email.is_empty() || body.name.is_empty() || body.password.is_empty()
  {
    return Err(ApiError::InvalidInput(
      "email, name, and password must be non-empty".into(),
    ));
  }

  let existing = state
    .store
    .find_user(UserLookup::Email(body.email.clone()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!(
      "email {} is already registered",
      body.email
    )));
  }

  // The pre-check above can lose a race against a concurrent
  // registration; the store's conflict is still the caller's 409.
  let user = state
    .store
    .insert_user(NewUser {
      email:         body.email.clone(),
      name:          body.name,
      password_hash: hash_password(&body.password)?,
      is_verified:   state.config.default_verified,
      permissions:   PermissionSet::default(),
    })
    .await
    .map_err(|e| {
      if e.is_conflict() {
        ApiError::Conflict(format!(
          "email {} is already registered",
          body.email
        ))
      } else {
        ApiError::Store(Box::new(e))
      }
    })?;

  let verify_token = state.auth.tokens().issue(user.user_id)?;

  tracing::info!(user_id = %user.user_id, "registered user");

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "user_id":      user.user_id,
      "verify_token": verify_token,
    })),
  ))
}

// ─── Verify email ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
  pub user_id: Uuid,
  pub token:   String,
}

/// `GET /user/verify-email?user_id=<id>&token=<jwt>`
pub async fn verify_email<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<VerifyParams>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  let user = state
    .auth
    .identify(&*state.store, params.user_id, &params.token)
    .await?;

  if user.is_verified {
    return Err(ApiError::Conflict("email is already verified".into()));
  }

  let updated = state
    .store
    .mark_verified(params.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !updated {
    return Err(ApiError::NotFound(format!(
      "user {} not found",
      params.user_id
    )));
  }

  Ok(Json(json!({ "user_id": params.user_id, "verified": true })))
}

// ─── Login ────────────────────────────────────────────────────────────────────

/// Login credential, discriminated on which unique attribute it carries.
#[derive(Debug, Deserialize)]
#[serde(tag = "by", rename_all = "lowercase")]
pub enum LoginBody {
  Email { email: String, password: String },
  Name { name: String, password: String },
}

/// `POST /user/login`
///
/// A wrong identifier and a wrong password produce the same response, so
/// the endpoint cannot be used to probe which emails are registered.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  let (lookup, password) = match body {
    LoginBody::Email { email, password } => {
      (UserLookup::Email(email), password)
    }
    LoginBody::Name { name, password } => (UserLookup::Name(name), password),
  };

  let rejected =
    || ApiError::InvalidInput("incorrect username or password".into());

  let user = state
    .store
    .find_user(lookup)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(rejected)?;

  if !verify_password(&password, &user.password_hash) {
    return Err(rejected());
  }
  if !user.is_verified {
    return Err(ApiError::Forbidden("email is not verified".into()));
  }

  let access_token = state.auth.tokens().issue(user.user_id)?;

  Ok(Json(json!({
    "user_id":      user.user_id,
    "access_token": access_token,
    "token_type":   "bearer",
  })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /user/{id}` — a user may only fetch their own record.
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Bearer(token): Bearer,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  let user = state.auth.identify(&*state.store, id, &token).await?;

  Ok(Json(json!({
    "user_id":     user.user_id,
    "email":       user.email,
    "name":        user.name,
    "created_at":  user.created_at,
    "is_verified": user.is_verified,
    "permissions": user.permissions.bits(),
  })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
  /// The acting (token-holding) user.
  pub user_id:   Uuid,
  /// Defaults to `user_id`: users may always delete themselves.
  #[serde(default)]
  pub target_id: Option<Uuid>,
}

/// `POST /user/delete`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
  Json(body): Json<DeleteBody>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  let target = body.target_id.unwrap_or(body.user_id);

  if target == body.user_id {
    state
      .auth
      .identify(&*state.store, body.user_id, &token)
      .await?;
  } else {
    state
      .auth
      .authorize(&*state.store, body.user_id, &token, Capability::DeleteUsers)
      .await?;
  }

  let deleted = state
    .store
    .delete_user(target)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("user {target} not found")));
  }

  tracing::info!(user_id = %target, actor = %body.user_id, "deleted user");

  Ok(Json(json!({ "deleted": target })))
}

// ─── Permission ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PermissionBody {
  /// The acting (token-holding) user.
  pub user_id:    Uuid,
  pub target_id:  Uuid,
  /// Exactly one capability bit, as its raw value (e.g. 4 for delete).
  pub capability: u16,
  pub grant:      bool,
}

/// `POST /user/permission` — grant or revoke one capability.
pub async fn permission<S>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
  Json(body): Json<PermissionBody>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  state
    .auth
    .authorize(
      &*state.store,
      body.user_id,
      &token,
      Capability::GrantPermission,
    )
    .await?;

  let capability = Capability::from_bits(body.capability)?;

  let updated = state
    .store
    .apply_permission(body.target_id, capability, body.grant)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("user {} not found", body.target_id))
    })?;

  tracing::info!(
    user_id = %body.target_id,
    actor = %body.user_id,
    capability = body.capability,
    grant = body.grant,
    "applied permission change"
  );

  Ok(Json(json!({
    "user_id":     body.target_id,
    "permissions": updated.bits(),
  })))
}
