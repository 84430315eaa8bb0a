//! Query parameters, request bodies and response payloads of the gateway API.

use serde::{Deserialize, Serialize};

/// Query params accepted on the API path.
#[derive(Debug, Default, Deserialize)]
pub struct ApiQuery {
    pub action: Option<String>,
    pub prefix: Option<String>,
}

/// The closed set of operations selected by `?action=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Version,
    List,
    Upload,
    Rename,
    Delete,
    Unsupported(String),
}

impl Action {
    /// Parse the raw `action` query value. Missing or empty means `Version`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("version") => Action::Version,
            Some("list") => Action::List,
            Some("upload") => Action::Upload,
            Some("rename") => Action::Rename,
            Some("delete") => Action::Delete,
            Some(other) => Action::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Version => "version",
            Action::List => "list",
            Action::Upload => "upload",
            Action::Rename => "rename",
            Action::Delete => "delete",
            Action::Unsupported(raw) => raw,
        }
    }
}

/// Body of `POST ?action=rename`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub old_key: String,
    pub new_key: String,
    #[serde(default)]
    pub keep_original: bool,
}

/// Body of `POST ?action=delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// Static status returned for `?action=version` or no action.
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub bucket: String,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_action_is_version() {
        assert_eq!(Action::parse(None), Action::Version);
        assert_eq!(Action::parse(Some("")), Action::Version);
        assert_eq!(Action::parse(Some("version")), Action::Version);
    }

    #[test]
    fn known_actions_parse() {
        assert_eq!(Action::parse(Some("list")), Action::List);
        assert_eq!(Action::parse(Some("upload")), Action::Upload);
        assert_eq!(Action::parse(Some("rename")), Action::Rename);
        assert_eq!(Action::parse(Some("delete")), Action::Delete);
    }

    #[test]
    fn unknown_action_keeps_raw_value() {
        let action = Action::parse(Some("Upload"));
        assert_eq!(action, Action::Unsupported("Upload".into()));
        assert_eq!(action.as_str(), "Upload");
    }

    #[test]
    fn rename_request_defaults_keep_original_to_false() {
        let req: RenameRequest =
            serde_json::from_str(r#"{"oldKey":"a.txt","newKey":"b.txt"}"#).unwrap();
        assert_eq!(req.old_key, "a.txt");
        assert_eq!(req.new_key, "b.txt");
        assert!(!req.keep_original);
    }
}
