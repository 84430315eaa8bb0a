//! Represents an object (file) stored in the bucket.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use sqlx::FromRow;

/// HTTP metadata stored alongside an object payload.
///
/// Copied verbatim when an object is renamed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpMetadata {
    /// Content type (MIME type) served with the object.
    pub content_type: Option<String>,

    /// Cache directive served with the object.
    pub cache_control: Option<String>,
}

/// Metadata row for a single stored object.
///
/// The struct describes the payload, it does not carry the bytes.
#[derive(Clone, FromRow, Debug)]
pub struct ObjectRecord {
    /// Object key (path-like identifier, unique within the bucket).
    pub key: String,

    /// Size in bytes.
    pub size_bytes: i64,

    /// MD5 hex digest of the payload.
    pub etag: String,

    pub content_type: Option<String>,

    pub cache_control: Option<String>,

    /// When the current payload was written.
    pub uploaded_at: DateTime<Utc>,
}

impl ObjectRecord {
    pub fn http_metadata(&self) -> HttpMetadata {
        HttpMetadata {
            content_type: self.content_type.clone(),
            cache_control: self.cache_control.clone(),
        }
    }
}

/// One entry of a list response.
#[derive(Serialize, Debug, Clone)]
pub struct ObjectDescriptor {
    pub key: String,

    /// Public URL: the configured base URL joined with the key.
    pub url: String,

    pub size: i64,

    #[serde(serialize_with = "serialize_millis")]
    pub uploaded: DateTime<Utc>,
}

impl ObjectDescriptor {
    pub fn from_record(record: ObjectRecord, public_base_url: &str) -> Self {
        Self {
            url: public_url(public_base_url, &record.key),
            key: record.key,
            size: record.size_bytes,
            uploaded: record.uploaded_at,
        }
    }
}

/// Join the public base URL and an object key.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

fn serialize_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn public_url_joins_base_and_key() {
        assert_eq!(
            public_url("https://file.talentmap.my.id", "uploads/a.png"),
            "https://file.talentmap.my.id/uploads/a.png"
        );
        assert_eq!(
            public_url("https://cdn.example.com/", "a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn descriptor_serializes_uploaded_with_millis() {
        let record = ObjectRecord {
            key: "docs/cv.pdf".into(),
            size_bytes: 42,
            etag: "abc".into(),
            content_type: Some("application/pdf".into()),
            cache_control: None,
            uploaded_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
        };
        let descriptor = ObjectDescriptor::from_record(record, "https://file.talentmap.my.id");
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(json["key"], "docs/cv.pdf");
        assert_eq!(json["url"], "https://file.talentmap.my.id/docs/cv.pdf");
        assert_eq!(json["size"], 42);
        assert_eq!(json["uploaded"], "2025-03-01T12:30:00.000Z");
    }
}
