//! Time-bounded snapshot cache of all stored face embeddings.
//!
//! Lifecycle: empty → populated(snapshot, built_at) → empty again when the
//! TTL elapses or a write invalidates it. Readers share one immutable
//! [`Snapshot`] behind an `Arc`; a reload builds a complete replacement and
//! publishes it atomically — no partial snapshot is ever observable.

use std::{sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use tokio::{
  sync::{Mutex, RwLock},
  time::timeout,
};

use likeness_core::{face::Embedding, store::FaceStore};

use crate::error::{Error, Result};

/// Default snapshot lifetime: bounds staleness without hammering the store
/// on every match request.
pub const DEFAULT_TTL_SECS: i64 = 30;

/// Default bound on the full-reload store query.
pub const DEFAULT_STORE_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Read-only projection of one stored face.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub label:     Option<String>,
  pub embedding: Embedding,
}

/// A complete, internally consistent copy of every stored face embedding
/// at the moment it was built.
#[derive(Debug)]
pub struct Snapshot {
  pub entries:  Vec<CachedEntry>,
  pub built_at: DateTime<Utc>,
}

/// The embedding cache. Construct one per service instance and share it;
/// it is not a hidden process-wide global, so tests can build isolated
/// instances and control time.
pub struct EmbeddingCache {
  ttl:           Duration,
  store_timeout: StdDuration,
  snapshot:      RwLock<Option<Arc<Snapshot>>>,
  /// Held for the duration of one reload; concurrent `ensure_fresh`
  /// callers queue here instead of each hitting the store.
  reload:        Mutex<()>,
}

impl EmbeddingCache {
  pub fn new(ttl: Duration, store_timeout: StdDuration) -> Self {
    Self {
      ttl,
      store_timeout,
      snapshot: RwLock::new(None),
      reload: Mutex::new(()),
    }
  }

  fn is_fresh(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(snapshot.built_at) <= self.ttl
  }

  async fn read_fresh(&self, now: DateTime<Utc>) -> Option<Arc<Snapshot>> {
    let guard = self.snapshot.read().await;
    guard
      .as_ref()
      .filter(|snap| self.is_fresh(snap, now))
      .cloned()
  }

  /// Return the current snapshot, reloading it first if the cache is
  /// empty or the TTL has elapsed.
  ///
  /// At most one reload runs at a time. Callers that arrive during a
  /// reload wait for it and reuse its result; a failed reload leaves the
  /// previous snapshot untouched.
  pub async fn ensure_fresh<S>(
    &self,
    store: &S,
    now: DateTime<Utc>,
  ) -> Result<Arc<Snapshot>>
  where
    S: FaceStore,
  {
    if let Some(snapshot) = self.read_fresh(now).await {
      return Ok(snapshot);
    }

    let _reload = self.reload.lock().await;

    // Another caller may have completed the reload while we queued.
    if let Some(snapshot) = self.read_fresh(now).await {
      return Ok(snapshot);
    }

    let faces = timeout(self.store_timeout, store.list_faces())
      .await
      .map_err(|_| Error::StoreTimeout)?
      .map_err(|e| Error::Store(Box::new(e)))?;

    let snapshot = Arc::new(Snapshot {
      entries: faces
        .into_iter()
        .map(|face| CachedEntry {
          label:     face.label,
          embedding: face.embedding,
        })
        .collect(),
      built_at: now,
    });

    tracing::debug!(entries = snapshot.entries.len(), "rebuilt embedding cache");

    *self.snapshot.write().await = Some(Arc::clone(&snapshot));
    Ok(snapshot)
  }

  /// Force the cache back to empty. Called after any write that changes
  /// the underlying face set, so a just-deleted or just-relabelled face
  /// is never served for the rest of a TTL window.
  pub async fn invalidate(&self) {
    *self.snapshot.write().await = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

  use likeness_core::{
    face::{FaceRecord, NewFace},
    permission::{Capability, PermissionSet},
    user::{NewUser, UserLookup, UserRecord},
  };
  use uuid::Uuid;

  #[derive(Debug, thiserror::Error)]
  #[error("stub store failure")]
  struct StubError;

  impl likeness_core::store::StoreError for StubError {}

  /// Counts `list_faces` calls; everything else is unreachable here.
  struct StubStore {
    faces:      Vec<FaceRecord>,
    list_calls: AtomicUsize,
    fail:       AtomicBool,
  }

  impl StubStore {
    fn with_faces(faces: Vec<FaceRecord>) -> Self {
      Self {
        faces,
        list_calls: AtomicUsize::new(0),
        fail: AtomicBool::new(false),
      }
    }
  }

  fn face(label: &str) -> FaceRecord {
    FaceRecord {
      face_id:     Uuid::new_v4(),
      uploaded_by: Uuid::new_v4(),
      uploaded_at: Utc::now(),
      blob:        vec![],
      embedding:   Embedding(vec![1.0, 0.0]),
      label:       Some(label.to_owned()),
    }
  }

  impl FaceStore for StubStore {
    type Error = StubError;

    async fn find_user(&self, _: UserLookup) -> Result<Option<UserRecord>, StubError> { unimplemented!() }
    async fn insert_user(&self, _: NewUser) -> Result<UserRecord, StubError> { unimplemented!() }
    async fn mark_verified(&self, _: Uuid) -> Result<bool, StubError> { unimplemented!() }
    async fn apply_permission(&self, _: Uuid, _: Capability, _: bool) -> Result<Option<PermissionSet>, StubError> { unimplemented!() }
    async fn delete_user(&self, _: Uuid) -> Result<bool, StubError> { unimplemented!() }
    async fn insert_face(&self, _: NewFace) -> Result<FaceRecord, StubError> { unimplemented!() }
    async fn get_face(&self, _: Uuid) -> Result<Option<FaceRecord>, StubError> { unimplemented!() }
    async fn update_face_label(&self, _: Uuid, _: Option<String>) -> Result<bool, StubError> { unimplemented!() }
    async fn delete_face(&self, _: Uuid) -> Result<bool, StubError> { unimplemented!() }
    async fn count_faces(&self) -> Result<u64, StubError> { unimplemented!() }

    async fn list_faces(&self) -> Result<Vec<FaceRecord>, StubError> {
      self.list_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail.load(Ordering::SeqCst) {
        return Err(StubError);
      }
      Ok(self.faces.clone())
    }
  }

  fn cache() -> EmbeddingCache {
    EmbeddingCache::new(Duration::seconds(30), DEFAULT_STORE_TIMEOUT)
  }

  #[tokio::test]
  async fn within_ttl_returns_same_snapshot_without_reload() {
    let store = StubStore::with_faces(vec![face("alice")]);
    let cache = cache();
    let now = Utc::now();

    let first = cache.ensure_fresh(&store, now).await.unwrap();
    let second = cache
      .ensure_fresh(&store, now + Duration::seconds(10))
      .await
      .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn elapsed_ttl_triggers_reload() {
    let store = StubStore::with_faces(vec![face("alice")]);
    let cache = cache();
    let now = Utc::now();

    let first = cache.ensure_fresh(&store, now).await.unwrap();
    let second = cache
      .ensure_fresh(&store, now + Duration::seconds(31))
      .await
      .unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn concurrent_callers_share_one_reload() {
    let store = Arc::new(StubStore::with_faces(vec![face("alice")]));
    let cache = Arc::new(cache());
    let now = Utc::now();

    let tasks: Vec<_> = (0..8)
      .map(|_| {
        let store = Arc::clone(&store);
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.ensure_fresh(&*store, now).await })
      })
      .collect();

    for task in tasks {
      task.await.unwrap().unwrap();
    }

    assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn invalidate_forces_repopulation() {
    let store = StubStore::with_faces(vec![face("alice")]);
    let cache = cache();
    let now = Utc::now();

    cache.ensure_fresh(&store, now).await.unwrap();
    cache.invalidate().await;
    cache.ensure_fresh(&store, now).await.unwrap();

    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn failed_reload_keeps_previous_snapshot() {
    let store = StubStore::with_faces(vec![face("alice")]);
    let cache = cache();
    let now = Utc::now();

    let first = cache.ensure_fresh(&store, now).await.unwrap();

    store.fail.store(true, Ordering::SeqCst);
    let err = cache
      .ensure_fresh(&store, now + Duration::seconds(31))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    // The stale snapshot is still published for readers within its window.
    let again = cache.ensure_fresh(&store, now).await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));
  }

  #[tokio::test]
  async fn snapshot_projects_labels_and_embeddings() {
    let store =
      StubStore::with_faces(vec![face("alice"), face("bob")]);
    let cache = cache();

    let snapshot = cache.ensure_fresh(&store, Utc::now()).await.unwrap();
    let labels: Vec<_> = snapshot
      .entries
      .iter()
      .map(|e| e.label.as_deref().unwrap())
      .collect();
    assert_eq!(labels, ["alice", "bob"]);
  }
}
