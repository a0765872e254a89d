//! Wire models exchanged with the importer backend
//!
//! Field names follow the backend's JSON. Extra fields the backend attaches to
//! users and channels are carried in `extra` so a start-import request sends
//! rows back exactly as they were received, plus the `do_import` flag.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend-owned job descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOperation {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "importerKey", default, skip_serializing_if = "Option::is_none")]
    pub importer_key: Option<String>,
    #[serde(default)]
    pub valid: bool,
    #[serde(default = "unreported_status")]
    pub status: Phase,
}

fn unreported_status() -> Phase {
    Phase::Unknown(String::new())
}

impl ImportOperation {
    pub fn new(valid: bool, status: Phase) -> Self {
        Self {
            id: None,
            importer_key: None,
            valid,
            status,
        }
    }
}

/// Response of `getCurrentImportOperation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentOperationResponse {
    pub operation: ImportOperation,
}

/// Snapshot of discovered content once preparation completes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportFileData {
    #[serde(default)]
    pub waiting: bool,
    /// Set only when the job failed before reaching user selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Phase>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub users: Vec<ImportUser>,
    #[serde(default)]
    pub channels: Vec<ImportChannel>,
}

/// Discovered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportUser {
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_deleted: bool,
    /// Client-side selection flag
    #[serde(default = "selected_by_default")]
    pub do_import: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Discovered channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportChannel {
    pub channel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    /// Client-side selection flag
    #[serde(default = "selected_by_default")]
    pub do_import: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn selected_by_default() -> bool {
    true
}

impl ImportUser {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        is_deleted: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            email: email.into(),
            is_deleted,
            do_import: true,
            extra: Map::new(),
        }
    }
}

impl ImportChannel {
    pub fn new(channel_id: impl Into<String>, name: impl Into<String>, is_archived: bool) -> Self {
        Self {
            channel_id: channel_id.into(),
            name: name.into(),
            is_archived,
            do_import: true,
            extra: Map::new(),
        }
    }
}

/// Body of `startImport`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartImportRequest {
    pub input: StartImportInput,
}

/// Full selection, unselected rows included; the backend picks the subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartImportInput {
    pub users: Vec<ImportUser>,
    pub channels: Vec<ImportChannel>,
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_data_defaults_for_waiting_response() {
        let data: ImportFileData =
            serde_json::from_value(json!({ "waiting": true, "success": true })).unwrap();
        assert!(data.waiting);
        assert!(data.step.is_none());
        assert_eq!(data.message_count, 0);
        assert!(data.users.is_empty());
        assert!(data.channels.is_empty());
    }

    #[test]
    fn test_user_extra_fields_survive_resubmission() {
        let user: ImportUser = serde_json::from_value(json!({
            "user_id": "u1",
            "username": "ana",
            "email": "ana@example.com",
            "is_deleted": false,
            "is_bot": true
        }))
        .unwrap();

        assert!(user.do_import);
        assert_eq!(user.extra.get("is_bot"), Some(&json!(true)));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["is_bot"], json!(true));
        assert_eq!(back["do_import"], json!(true));
    }

    #[test]
    fn test_operation_missing_fields() {
        let response: CurrentOperationResponse =
            serde_json::from_value(json!({ "operation": {} })).unwrap();
        assert!(!response.operation.valid);
        assert_eq!(response.operation.status, Phase::Unknown(String::new()));
    }

    #[test]
    fn test_operation_parses_backend_shape() {
        let response: CurrentOperationResponse = serde_json::from_value(json!({
            "operation": {
                "_id": "op-1",
                "importerKey": "slack",
                "valid": true,
                "status": "importer_user_selection"
            },
            "success": true
        }))
        .unwrap();
        assert_eq!(response.operation.id.as_deref(), Some("op-1"));
        assert_eq!(response.operation.importer_key.as_deref(), Some("slack"));
        assert_eq!(response.operation.status, Phase::UserSelection);
    }

    #[test]
    fn test_start_request_shape() {
        let request = StartImportRequest {
            input: StartImportInput {
                users: vec![ImportUser::new("u1", "ana", "ana@example.com", false)],
                channels: vec![ImportChannel::new("c1", "general", false)],
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["input"]["users"][0]["user_id"], json!("u1"));
        assert_eq!(value["input"]["channels"][0]["name"], json!("general"));
    }
}
