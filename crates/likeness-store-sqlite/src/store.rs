//! [`SqliteStore`] — the SQLite implementation of [`FaceStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use likeness_core::{
  face::{FaceRecord, NewFace},
  permission::{Capability, PermissionSet},
  store::FaceStore,
  user::{NewUser, UserLookup, UserRecord},
};

use crate::{
  Error, Result,
  encode::{
    RawFace, RawUser, encode_dt, encode_embedding, encode_uuid,
  },
  schema::SCHEMA,
};

const USER_COLUMNS: &str =
  "user_id, created_at, email, name, password_hash, is_verified, permissions";

const FACE_COLUMNS: &str =
  "face_id, uploaded_by, uploaded_at, blob, embedding, label";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    created_at:    row.get(1)?,
    email:         row.get(2)?,
    name:          row.get(3)?,
    password_hash: row.get(4)?,
    is_verified:   row.get(5)?,
    permissions:   row.get(6)?,
  })
}

fn face_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFace> {
  Ok(RawFace {
    face_id:     row.get(0)?,
    uploaded_by: row.get(1)?,
    uploaded_at: row.get(2)?,
    blob:        row.get(3)?,
    embedding:   row.get(4)?,
    label:       row.get(5)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Likeness store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised onto the connection's worker, which is what makes
/// [`FaceStore::apply_permission`] a safe read-modify-write.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── FaceStore impl ──────────────────────────────────────────────────────────

impl FaceStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn find_user(&self, lookup: UserLookup) -> Result<Option<UserRecord>> {
    let (column, value) = match lookup {
      UserLookup::Id(id) => ("user_id", encode_uuid(id)),
      UserLookup::Email(email) => ("email", email),
      UserLookup::Name(name) => ("name", name),
    };

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], user_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn insert_user(&self, input: NewUser) -> Result<UserRecord> {
    let user = UserRecord {
      user_id:       Uuid::new_v4(),
      created_at:    Utc::now(),
      email:         input.email,
      name:          input.name,
      password_hash: input.password_hash,
      is_verified:   input.is_verified,
      permissions:   input.permissions,
    };

    let id_str   = encode_uuid(user.user_id);
    let at_str   = encode_dt(user.created_at);
    let email    = user.email.clone();
    let name     = user.name.clone();
    let hash     = user.password_hash.clone();
    let verified = user.is_verified;
    let perms    = user.permissions.bits() as i64;

    // Existence check and insert share one closure, so they run as a
    // single unit on the connection worker.
    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO users (user_id, created_at, email, name, password_hash, is_verified, permissions)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, at_str, email, name, hash, verified, perms],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(user.email));
    }

    Ok(user)
  }

  async fn mark_verified(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_verified = 1 WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn apply_permission(
    &self,
    user_id: Uuid,
    capability: Capability,
    grant: bool,
  ) -> Result<Option<PermissionSet>> {
    let id_str = encode_uuid(user_id);
    let bit = capability.bit();

    // Read-modify-write in one closure: calls for the same user are
    // serialised on the connection worker, so concurrent grants of
    // different bits both land.
    let bits: Option<i64> = self
      .conn
      .call(move |conn| {
        let current: Option<i64> = conn
          .query_row(
            "SELECT permissions FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(None);
        };

        let updated = if grant {
          current as u8 | bit
        } else {
          current as u8 & !bit
        } as i64;

        conn.execute(
          "UPDATE users SET permissions = ?1 WHERE user_id = ?2",
          rusqlite::params![updated, id_str],
        )?;
        Ok(Some(updated))
      })
      .await?;

    Ok(bits.map(|b| PermissionSet::from_bits(b as u8)))
  }

  async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Faces ─────────────────────────────────────────────────────────────────

  async fn insert_face(&self, input: NewFace) -> Result<FaceRecord> {
    let face = FaceRecord {
      face_id:     Uuid::new_v4(),
      uploaded_by: input.uploaded_by,
      uploaded_at: Utc::now(),
      blob:        input.blob,
      embedding:   input.embedding,
      label:       input.label,
    };

    let id_str       = encode_uuid(face.face_id);
    let uploader_str = encode_uuid(face.uploaded_by);
    let at_str       = encode_dt(face.uploaded_at);
    let blob         = face.blob.clone();
    let embedding    = encode_embedding(&face.embedding)?;
    let label        = face.label.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO faces (face_id, uploaded_by, uploaded_at, blob, embedding, label)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, uploader_str, at_str, blob, embedding, label],
        )?;
        Ok(())
      })
      .await?;

    Ok(face)
  }

  async fn get_face(&self, face_id: Uuid) -> Result<Option<FaceRecord>> {
    let id_str = encode_uuid(face_id);

    let raw: Option<RawFace> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {FACE_COLUMNS} FROM faces WHERE face_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], face_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFace::into_face).transpose()
  }

  async fn list_faces(&self) -> Result<Vec<FaceRecord>> {
    let raws: Vec<RawFace> = self
      .conn
      .call(|conn| {
        let sql =
          format!("SELECT {FACE_COLUMNS} FROM faces ORDER BY uploaded_at, face_id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], face_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFace::into_face).collect()
  }

  async fn update_face_label(
    &self,
    face_id: Uuid,
    label: Option<String>,
  ) -> Result<bool> {
    let id_str = encode_uuid(face_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE faces SET label = ?1 WHERE face_id = ?2",
          rusqlite::params![label, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_face(&self, face_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(face_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM faces WHERE face_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn count_faces(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM faces", [], |row| row.get(0))?)
      })
      .await?;
    Ok(count as u64)
  }
}
