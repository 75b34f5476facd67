//! Handlers for `/face` endpoints.
//!
//! | Method | Path | Capability |
//! |--------|------|------------|
//! | `POST` | `/face/upload` | `Write` |
//! | `POST` | `/face/match` | `Write` |
//! | `POST` | `/face/delete` | `Delete` |
//! | `POST` | `/face/label` | `Update` |
//!
//! Images travel as base64 in JSON bodies. Only PNG and JPEG are
//! accepted, decided by magic bytes rather than any client-supplied
//! content type.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Utc;
use image::ImageFormat;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use likeness_core::{
  face::NewFace,
  permission::Capability,
  store::FaceStore,
};
use likeness_engine::rank;

use crate::{AppState, auth::Bearer, error::ApiError};

/// Decode a base64 image payload and check it is PNG or JPEG.
fn decode_image(encoded: &str) -> Result<Vec<u8>, ApiError> {
  let blob = B64
    .decode(encoded)
    .map_err(|_| ApiError::InvalidInput("image is not valid base64".into()))?;

  match image::guess_format(&blob) {
    Ok(ImageFormat::Png | ImageFormat::Jpeg) => Ok(blob),
    _ => Err(ApiError::InvalidInput(
      "image must be a PNG or JPEG".into(),
    )),
  }
}

// ─── Upload ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub user_id: Uuid,
  /// Base64-encoded PNG or JPEG.
  pub image:   String,
  #[serde(default)]
  pub label:   Option<String>,
}

/// `POST /face/upload`
///
/// Extracts the embedding before anything is persisted: an image with no
/// detectable face is rejected outright and leaves no record behind.
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
  Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FaceStore,
{
  state
    .auth
    .authorize(&*state.store, body.user_id, &token, Capability::Write)
    .await?;

  let blob = decode_image(&body.image)?;
  let embedding = state
    .extractor
    .extract_checked(&blob)?
    .ok_or(ApiError::NoFace)?;

  let face = state
    .store
    .insert_face(NewFace {
      uploaded_by: body.user_id,
      blob,
      embedding,
      label: body.label,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  // The snapshot no longer reflects the store.
  state.cache.invalidate().await;

  tracing::info!(face_id = %face.face_id, user_id = %body.user_id, "stored face");

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "face_id":     face.face_id,
      "uploaded_by": face.uploaded_by,
      "uploaded_at": face.uploaded_at,
      "label":       face.label,
    })),
  ))
}

// ─── Match ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchBody {
  pub user_id: Uuid,
  /// Base64-encoded PNG or JPEG.
  pub image:   String,
  #[serde(default)]
  pub label:   Option<String>,
}

/// `POST /face/match`
///
/// Scores the probe against every stored face and returns the full
/// ranked list, best match first. When the server runs with
/// `persist_probe`, the probe is stored afterwards; ranking happens
/// first, so a probe never matches itself.
pub async fn find_match<S>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
  Json(body): Json<MatchBody>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  state
    .auth
    .authorize(&*state.store, body.user_id, &token, Capability::Write)
    .await?;

  let blob = decode_image(&body.image)?;
  let embedding = state
    .extractor
    .extract_checked(&blob)?
    .ok_or(ApiError::NoFace)?;

  let snapshot = state
    .cache
    .ensure_fresh(&*state.store, Utc::now())
    .await?;
  let matches = rank(&snapshot, &embedding);

  if state.config.persist_probe {
    state
      .store
      .insert_face(NewFace {
        uploaded_by: body.user_id,
        blob,
        embedding,
        label: body.label,
      })
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    state.cache.invalidate().await;
  }

  Ok(Json(json!({ "matches": matches })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
  pub user_id: Uuid,
  pub face_id: Uuid,
}

/// `POST /face/delete`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
  Json(body): Json<DeleteBody>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  state
    .auth
    .authorize(&*state.store, body.user_id, &token, Capability::Delete)
    .await?;

  let deleted = state
    .store
    .delete_face(body.face_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!(
      "face {} not found",
      body.face_id
    )));
  }

  state.cache.invalidate().await;

  tracing::info!(face_id = %body.face_id, user_id = %body.user_id, "deleted face");

  Ok(Json(json!({ "deleted": body.face_id })))
}

// ─── Label ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LabelBody {
  pub user_id: Uuid,
  pub face_id: Uuid,
  /// `null` clears the label.
  #[serde(default)]
  pub label:   Option<String>,
}

/// `POST /face/label` — the label is the only mutable field of a face.
pub async fn label<S>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
  Json(body): Json<LabelBody>,
) -> Result<Json<Value>, ApiError>
where
  S: FaceStore,
{
  state
    .auth
    .authorize(&*state.store, body.user_id, &token, Capability::Update)
    .await?;

  let updated = state
    .store
    .update_face_label(body.face_id, body.label.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !updated {
    return Err(ApiError::NotFound(format!(
      "face {} not found",
      body.face_id
    )));
  }

  state.cache.invalidate().await;

  Ok(Json(json!({ "face_id": body.face_id, "label": body.label })))
}
