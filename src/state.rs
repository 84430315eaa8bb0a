//! Shared application state handed to every handler.

use crate::{models::request::VersionInfo, services::file_service::FileService};
use std::sync::Arc;

pub const API_VERSION: &str = "1.2.4";
pub const API_STATUS: &str = "Protected";
pub const API_MESSAGE: &str = "API Active. Access only via authorized applications.";

/// Immutable per-process state; cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub bucket_name: Arc<str>,
    /// Shared secret expected in `X-Custom-Auth` on mutating actions.
    pub auth_token: Arc<str>,
}

impl AppState {
    pub fn new(
        files: FileService,
        bucket_name: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            files,
            bucket_name: bucket_name.into().into(),
            auth_token: auth_token.into().into(),
        }
    }

    pub fn version_info(&self) -> VersionInfo {
        VersionInfo {
            version: API_VERSION,
            bucket: self.bucket_name.to_string(),
            status: API_STATUS,
            message: API_MESSAGE,
        }
    }
}
