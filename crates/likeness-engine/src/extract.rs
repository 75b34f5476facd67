//! The embedding-extractor boundary.
//!
//! Detection, landmarks, and model inference live behind this trait and
//! outside this workspace. The engine only ever sees the fixed-length
//! vector (or "no face found").

use thiserror::Error;

use likeness_core::face::{EMBEDDING_DIM, Embedding};

#[derive(Debug, Error)]
pub enum ExtractError {
  /// The extractor itself failed (model error, bad runtime state) — an
  /// upstream failure, not a negative detection result.
  #[error("embedding extraction failed: {0}")]
  Failed(String),

  /// The extractor broke the fixed-dimensionality contract.
  #[error("extractor produced a {0}-dimensional embedding, expected {EMBEDDING_DIM}")]
  Dimension(usize),
}

/// Produces a face embedding from raw image bytes.
///
/// `Ok(None)` means "no face detected" and is surfaced to callers as an
/// explicit request rejection, never a silent empty success.
pub trait EmbeddingExtractor: Send + Sync {
  fn extract(&self, blob: &[u8]) -> Result<Option<Embedding>, ExtractError>;

  /// As [`extract`](Self::extract), additionally enforcing
  /// [`EMBEDDING_DIM`] on anything the extractor returns. The scoring
  /// hot path relies on this check and does not re-measure vectors.
  fn extract_checked(
    &self,
    blob: &[u8],
  ) -> Result<Option<Embedding>, ExtractError> {
    match self.extract(blob)? {
      Some(embedding) if embedding.dim() != EMBEDDING_DIM => {
        Err(ExtractError::Dimension(embedding.dim()))
      }
      other => Ok(other),
    }
  }
}

/// Placeholder wired in by default: reports "no face" for every input.
///
/// Swapping in a real extractor (ONNX, dlib bindings, a sidecar service)
/// is a one-line change where the server builds its state.
pub struct DisabledExtractor;

impl EmbeddingExtractor for DisabledExtractor {
  fn extract(&self, _blob: &[u8]) -> Result<Option<Embedding>, ExtractError> {
    Ok(None)
  }
}
