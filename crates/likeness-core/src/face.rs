//! Face records and the embedding vector type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dimensionality of the embeddings produced by the upstream extractor.
pub const EMBEDDING_DIM: usize = 128;

// ─── Embedding ───────────────────────────────────────────────────────────────

/// A fixed-length numeric vector describing a face's distinguishing features.
///
/// The extractor boundary guarantees [`EMBEDDING_DIM`] components; lengths
/// are not re-checked in the scoring hot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
  pub fn dim(&self) -> usize { self.0.len() }

  /// Standard Euclidean (L2) distance to another embedding.
  pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
    self
      .0
      .iter()
      .zip(&other.0)
      .map(|(a, b)| (a - b) * (a - b))
      .sum::<f32>()
      .sqrt()
  }
}

// ─── Face records ────────────────────────────────────────────────────────────

/// A stored face. The embedding is immutable once written; only the label
/// may be updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRecord {
  pub face_id:     Uuid,
  pub uploaded_by: Uuid,
  /// Server-assigned timestamp; never changes after creation.
  pub uploaded_at: DateTime<Utc>,
  pub blob:        Vec<u8>,
  pub embedding:   Embedding,
  pub label:       Option<String>,
}

/// Input to [`crate::store::FaceStore::insert_face`].
/// `face_id` and `uploaded_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFace {
  pub uploaded_by: Uuid,
  pub blob:        Vec<u8>,
  pub embedding:   Embedding,
  pub label:       Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn distance_to_self_is_zero() {
    let e = Embedding(vec![0.25, -1.5, 3.0]);
    assert_eq!(e.euclidean_distance(&e), 0.0);
  }

  #[test]
  fn distance_is_symmetric() {
    let a = Embedding(vec![1.0, 0.0, 0.0]);
    let b = Embedding(vec![0.0, 1.0, 0.0]);
    assert_eq!(a.euclidean_distance(&b), b.euclidean_distance(&a));
    assert!((a.euclidean_distance(&b) - 2f32.sqrt()).abs() < 1e-6);
  }
}
