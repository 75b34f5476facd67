//! Nearest-neighbour scoring over a cache snapshot.

use std::cmp::Ordering;

use serde::Serialize;

use likeness_core::face::Embedding;

use crate::cache::Snapshot;

/// One ranked result. Higher score = more similar; the engine enforces no
/// accept threshold (callers in the reference deployment treat roughly
/// score > 1.7 as "same person", but that is their decision).
#[derive(Debug, Clone, Serialize)]
pub struct FaceMatch {
  pub label: Option<String>,
  pub score: f32,
}

/// Score `query` against every cached entry and return the full list,
/// best match first.
///
/// `score = 1 / (d + ε)` where `d` is the Euclidean distance and ε is the
/// `f32` machine epsilon — an exact match yields a large finite score
/// instead of dividing by zero. The sort is stable: equal scores keep
/// their cache order across repeated calls on the same snapshot.
pub fn rank(snapshot: &Snapshot, query: &Embedding) -> Vec<FaceMatch> {
  let mut matches: Vec<FaceMatch> = snapshot
    .entries
    .iter()
    .map(|entry| FaceMatch {
      label: entry.label.clone(),
      score: 1.0 / (query.euclidean_distance(&entry.embedding) + f32::EPSILON),
    })
    .collect();

  matches.sort_by(|a, b| {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
  });

  matches
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  use crate::cache::CachedEntry;

  fn snapshot(entries: Vec<(&str, Vec<f32>)>) -> Snapshot {
    Snapshot {
      entries:  entries
        .into_iter()
        .map(|(label, values)| CachedEntry {
          label:     Some(label.to_owned()),
          embedding: Embedding(values),
        })
        .collect(),
      built_at: Utc::now(),
    }
  }

  #[test]
  fn exact_match_scores_highest_and_finite() {
    let snap = snapshot(vec![
      ("alice", vec![1.0, 0.0, 0.0]),
      ("bob", vec![0.0, 1.0, 0.0]),
    ]);
    let ranked = rank(&snap, &Embedding(vec![1.0, 0.0, 0.0]));

    assert_eq!(ranked[0].label.as_deref(), Some("alice"));
    assert!(ranked[0].score.is_finite());
    assert!(ranked[0].score > ranked[1].score);
    // Zero distance hits the epsilon guard.
    assert_eq!(ranked[0].score, 1.0 / f32::EPSILON);
  }

  #[test]
  fn closer_embedding_ranks_first() {
    let snap = snapshot(vec![
      ("far", vec![10.0, 10.0]),
      ("near", vec![1.0, 1.1]),
    ]);
    let ranked = rank(&snap, &Embedding(vec![1.0, 1.0]));

    assert_eq!(ranked[0].label.as_deref(), Some("near"));
    assert_eq!(ranked[1].label.as_deref(), Some("far"));
  }

  #[test]
  fn full_list_is_returned_untruncated() {
    let snap = snapshot(
      (0..25)
        .map(|i| ("entry", vec![i as f32, 0.0]))
        .collect(),
    );
    assert_eq!(rank(&snap, &Embedding(vec![0.0, 0.0])).len(), 25);
  }

  #[test]
  fn equal_scores_keep_cache_order() {
    // Two entries equidistant from the query.
    let snap = snapshot(vec![
      ("left", vec![-1.0, 0.0]),
      ("right", vec![1.0, 0.0]),
    ]);
    let first = rank(&snap, &Embedding(vec![0.0, 0.0]));
    let second = rank(&snap, &Embedding(vec![0.0, 0.0]));

    assert_eq!(first[0].label.as_deref(), Some("left"));
    assert_eq!(second[0].label.as_deref(), Some("left"));
  }

  #[test]
  fn empty_snapshot_yields_empty_list() {
    let snap = snapshot(vec![]);
    assert!(rank(&snap, &Embedding(vec![0.0, 0.0])).is_empty());
  }
}
