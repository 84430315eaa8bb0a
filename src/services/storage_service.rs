//! src/services/storage_service.rs
//!
//! The storage backend seam (`ObjectStore`) and its shipped implementation,
//! `StorageService`: SQLite for object metadata and local disk for payloads,
//! sharded beneath `base_path/{shard}/{shard}/{md5 of key}`. No cache, no retries.

use crate::models::object::{HttpMetadata, ObjectRecord};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::{StreamExt, stream::BoxStream};
use md5::Context;
use serde::Serialize;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Object payload as a stream of chunks.
pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// An object fetched for reading: its metadata plus a payload stream.
pub struct StoredObject {
    pub record: ObjectRecord,
    pub body: ByteStream<'static>,
}

/// Result of one backend readiness check.
#[derive(Debug, Serialize)]
pub struct ReadinessCheck {
    pub name: &'static str,
    pub ok: bool,
    pub error: Option<String>,
}

/// Operations the request router needs from a bucket.
///
/// Implementations own persistence; callers only orchestrate these calls.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Objects whose key starts with `prefix`, ordered by key, at most `limit`.
    async fn list(&self, prefix: &str, limit: usize) -> StorageResult<Vec<ObjectRecord>>;

    /// Fetch an object, `None` when the key does not exist.
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>>;

    /// Write (or overwrite) `key` with the streamed payload and metadata.
    async fn put<'a>(
        &self,
        key: &str,
        body: ByteStream<'a>,
        metadata: HttpMetadata,
    ) -> StorageResult<ObjectRecord>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Backend self-checks reported by `/readyz`.
    async fn readiness(&self) -> Vec<ReadinessCheck>;
}

/// Disk + SQLite implementation of [`ObjectStore`].
#[derive(Clone)]
pub struct StorageService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,
}

const MAX_OBJECT_KEY_LEN: usize = 1024;
const SCHEMA_SQL: &str = include_str!("../../migrations/0001_init.sql");

impl StorageService {
    /// Create a new StorageService backed by the provided SQLite pool and
    /// using `base_path` as the root directory for object payloads.
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Apply the embedded metadata schema. Safe to run repeatedly.
    pub async fn apply_schema(&self) -> StorageResult<()> {
        let statements = SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        tracing::info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Keys are stored by digest, so only emptiness and length are checked.
    fn ensure_key_valid(key: &str) -> StorageResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(StorageError::InvalidObjectKey(key.to_string()));
        }
        Ok(())
    }

    /// Payload path for a key: `base_path/{aa}/{bb}/{md5 hex of key}`, where
    /// `aa` and `bb` are the first two digest bytes. Parent directories may
    /// not exist yet.
    fn object_path(&self, key: &str) -> PathBuf {
        let digest = md5::compute(key);
        let mut path = self.base_path.clone();
        path.push(format!("{:02x}", digest[0]));
        path.push(format!("{:02x}", digest[1]));
        path.push(format!("{:x}", digest));
        path
    }

    async fn fetch_record(&self, key: &str) -> StorageResult<Option<ObjectRecord>> {
        let record = sqlx::query_as::<_, ObjectRecord>(
            "SELECT key, size_bytes, etag, content_type, cache_control, uploaded_at
             FROM objects WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&*self.db)
        .await?;
        Ok(record)
    }

    /// Remove empty directories from `start` up to (excluding) `base_path`.
    async fn prune_empty_dirs(&self, start: &Path) {
        let stop = self.base_path.as_path();
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn list(&self, prefix: &str, limit: usize) -> StorageResult<Vec<ObjectRecord>> {
        let rows = sqlx::query_as::<_, ObjectRecord>(
            "SELECT key, size_bytes, etag, content_type, cache_control, uploaded_at
             FROM objects
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key ASC
             LIMIT ?2",
        )
        .bind(prefix)
        .bind(limit as i64)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        Self::ensure_key_valid(key)?;
        let Some(record) = self.fetch_record(key).await? else {
            return Ok(None);
        };

        let file_path = self.object_path(key);
        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(key, path = %file_path.display(), "metadata present but payload missing");
                return Ok(None);
            }
            Err(err) => return Err(StorageError::Io(err)),
        };

        Ok(Some(StoredObject {
            record,
            body: ReaderStream::new(file).boxed(),
        }))
    }

    /// Streams into a temp file while computing size and MD5, renames it into
    /// place, then upserts the metadata row. Temp files are removed on error.
    async fn put<'a>(
        &self,
        key: &str,
        mut body: ByteStream<'a>,
        metadata: HttpMetadata,
    ) -> StorageResult<ObjectRecord> {
        Self::ensure_key_valid(key)?;

        let file_path = self.object_path(key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::other("object path missing parent directory"))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        while let Some(chunk_res) = body.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StorageError::Io(err));
                }
            };
            size_bytes += chunk.len() as i64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        let etag = format!("{:x}", digest.compute());
        let record = sqlx::query_as::<_, ObjectRecord>(
            r#"
            INSERT INTO objects (key, size_bytes, etag, content_type, cache_control, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                content_type = excluded.content_type,
                cache_control = excluded.cache_control,
                uploaded_at = excluded.uploaded_at
            RETURNING key, size_bytes, etag, content_type, cache_control, uploaded_at
            "#,
        )
        .bind(key)
        .bind(size_bytes)
        .bind(&etag)
        .bind(metadata.content_type)
        .bind(metadata.cache_control)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;

        debug!(key, size_bytes, etag = %record.etag, "stored object payload");
        Ok(record)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        Self::ensure_key_valid(key)?;

        let result = sqlx::query("DELETE FROM objects WHERE key = ?")
            .bind(key)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            debug!(key, "delete of missing object");
        }

        let file_path = self.object_path(key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("file {} already missing", file_path.display());
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }
        Ok(())
    }

    /// `SELECT 1` against SQLite plus a write/read/delete under `base_path`.
    async fn readiness(&self) -> Vec<ReadinessCheck> {
        let sqlite = match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await
        {
            Ok(1) => None,
            Ok(v) => Some(format!("unexpected result: {}", v)),
            Err(e) => Some(format!("error: {}", e)),
        };

        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        let disk = match fs::write(&tmp_path, b"readyz").await {
            Ok(_) => {
                let outcome = match fs::read(&tmp_path).await {
                    Ok(bytes) if bytes == b"readyz" => None,
                    Ok(_) => Some("file content mismatch".to_string()),
                    Err(e) => Some(format!("could not read tmp file: {}", e)),
                };
                let _ = fs::remove_file(&tmp_path).await;
                outcome
            }
            Err(e) => Some(format!("could not write tmp file: {}", e)),
        };

        vec![
            ReadinessCheck {
                name: "sqlite",
                ok: sqlite.is_none(),
                error: sqlite,
            },
            ReadinessCheck {
                name: "disk",
                ok: disk.is_none(),
                error: disk,
            },
        ]
    }
}
