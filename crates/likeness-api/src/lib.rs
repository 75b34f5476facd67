//! JSON REST API for Likeness.
//!
//! Exposes an axum [`Router`] backed by any [`likeness_core::store::FaceStore`]
//! and an [`EmbeddingExtractor`]. TLS and transport concerns are the
//! caller's responsibility.

pub mod auth;
pub mod error;
pub mod faces;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration as StdDuration};

use axum::{
  Router,
  routing::{get, post},
};
use chrono::Duration;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use likeness_core::store::FaceStore;
use likeness_engine::{
  Authorizer, EmbeddingCache, EmbeddingExtractor, TokenService,
  cache::DEFAULT_TTL_SECS,
};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_cache_ttl_secs() -> i64 { DEFAULT_TTL_SECS }
fn default_store_timeout_secs() -> u64 { 5 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `LIKENESS_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Process-wide token signing secret. Empty or missing is fatal at boot.
  pub token_secret: String,
  #[serde(default = "default_cache_ttl_secs")]
  pub cache_ttl_secs: i64,
  /// Bound on individual store operations inside the guard and the cache
  /// reload, so a slow store cannot stall request handling.
  #[serde(default = "default_store_timeout_secs")]
  pub store_timeout_secs: u64,
  /// Whether a match probe is persisted as a face record of its own.
  /// Off by default: matching is a read-only comparison.
  #[serde(default)]
  pub persist_probe: bool,
  /// Skip email verification for new registrations (development setups).
  #[serde(default)]
  pub default_verified: bool,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub extractor: Arc<dyn EmbeddingExtractor>,
  pub auth:      Arc<Authorizer>,
  pub cache:     Arc<EmbeddingCache>,
  pub config:    Arc<ServerConfig>,
}

// Manual impl: `S` itself need not be `Clone` behind the `Arc`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      extractor: Arc::clone(&self.extractor),
      auth:      Arc::clone(&self.auth),
      cache:     Arc::clone(&self.cache),
      config:    Arc::clone(&self.config),
    }
  }
}

impl<S: FaceStore> AppState<S> {
  /// Build the full state from configuration.
  ///
  /// Fails (and the service must not start) when the token secret is not
  /// configured.
  pub fn new(
    store: Arc<S>,
    extractor: Arc<dyn EmbeddingExtractor>,
    config: ServerConfig,
  ) -> Result<Self, likeness_engine::Error> {
    let store_timeout = StdDuration::from_secs(config.store_timeout_secs);
    let tokens = TokenService::new(&config.token_secret)?;

    Ok(Self {
      store,
      extractor,
      auth: Arc::new(Authorizer::new(tokens, store_timeout)),
      cache: Arc::new(EmbeddingCache::new(
        Duration::seconds(config.cache_ttl_secs),
        store_timeout,
      )),
      config: Arc::new(config),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: FaceStore + 'static,
{
  Router::new()
    // Users
    .route("/user/register", post(users::register::<S>))
    .route("/user/verify-email", get(users::verify_email::<S>))
    .route("/user/login", post(users::login::<S>))
    .route("/user/{id}", get(users::get_one::<S>))
    .route("/user/delete", post(users::delete::<S>))
    .route("/user/permission", post(users::permission::<S>))
    // Faces
    .route("/face/upload", post(faces::upload::<S>))
    .route("/face/match", post(faces::find_match::<S>))
    .route("/face/delete", post(faces::delete::<S>))
    .route("/face/label", post(faces::label::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
