//! FileService: the list/upload/rename/delete orchestration behind the
//! request router. It only sequences calls on the injected [`ObjectStore`].

use crate::{
    models::{
        object::{HttpMetadata, ObjectDescriptor, public_url},
        request::RenameRequest,
    },
    services::storage_service::{ObjectStore, StorageResult},
};
use bytes::Bytes;
use chrono::Utc;
use futures::{StreamExt, stream};
use std::{io, sync::Arc};
use tracing::info;

/// Maximum number of descriptors returned by one list call.
pub const LIST_LIMIT: usize = 1000;

pub const UPLOAD_CACHE_CONTROL: &str = "public, max-age=31536000";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from an upload form.
#[derive(Debug)]
pub struct UploadFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub custom_name: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    SourceMissing,
}

#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn ObjectStore>,
    public_base_url: Arc<str>,
}

impl FileService {
    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into().into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.public_base_url, key)
    }

    pub async fn list_files(&self, prefix: &str) -> StorageResult<Vec<ObjectDescriptor>> {
        let records = self.store.list(prefix, LIST_LIMIT).await?;
        info!(prefix, count = records.len(), "listed objects");

        Ok(records
            .into_iter()
            .map(|record| ObjectDescriptor::from_record(record, &self.public_base_url))
            .collect())
    }

    /// Store an uploaded file and return its public URL.
    pub async fn upload_file(&self, upload: UploadFile) -> StorageResult<String> {
        let key = upload_key(
            upload.custom_name.as_deref(),
            &upload.original_name,
            Utc::now().timestamp_millis(),
        );
        let content_type = upload
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let metadata = HttpMetadata {
            content_type: Some(content_type),
            cache_control: Some(UPLOAD_CACHE_CONTROL.to_string()),
        };

        let body = stream::iter([Ok::<_, io::Error>(upload.data)]).boxed();
        let record = self.store.put(&key, body, metadata).await?;
        info!(key = %record.key, size_bytes = record.size_bytes, "uploaded object");

        Ok(self.public_url(&record.key))
    }

    /// Copy `old_key` to `new_key` with the same metadata, then delete the
    /// source unless `keep_original`. A failure between the write and the
    /// delete leaves both objects in place.
    pub async fn rename_file(&self, req: &RenameRequest) -> StorageResult<RenameOutcome> {
        let Some(source) = self.store.get(&req.old_key).await? else {
            info!(old_key = %req.old_key, "rename source missing");
            return Ok(RenameOutcome::SourceMissing);
        };

        let metadata = source.record.http_metadata();
        self.store.put(&req.new_key, source.body, metadata).await?;

        // Deleting here when the keys match would remove the object just written.
        if !req.keep_original && req.old_key != req.new_key {
            self.store.delete(&req.old_key).await?;
        }
        info!(
            old_key = %req.old_key,
            new_key = %req.new_key,
            keep_original = req.keep_original,
            "renamed object"
        );
        Ok(RenameOutcome::Renamed)
    }

    pub async fn delete_file(&self, key: &str) -> StorageResult<()> {
        self.store.delete(key).await?;
        info!(key, "deleted object");
        Ok(())
    }
}

/// Key for an upload: the custom name when given and non-empty, otherwise
/// `uploads/<epoch millis>_<original name>`.
pub fn upload_key(custom_name: Option<&str>, original_name: &str, now_millis: i64) -> String {
    match custom_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("uploads/{}_{}", now_millis, original_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_name_wins() {
        assert_eq!(
            upload_key(Some("avatars/me.png"), "IMG_001.png", 1_700_000_000_000),
            "avatars/me.png"
        );
    }

    #[test]
    fn empty_custom_name_falls_back_to_timestamped_key() {
        assert_eq!(
            upload_key(Some(""), "IMG_001.png", 1_700_000_000_000),
            "uploads/1700000000000_IMG_001.png"
        );
        assert_eq!(upload_key(None, "cv.pdf", 42), "uploads/42_cv.pdf");
    }
}
