//! Importer backend seam
//!
//! The orchestrator only talks to the backend through [`ImportBackend`].
//! [`HttpBackend`] is the REST implementation; tests substitute in-memory
//! fakes.

pub(crate) mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use chim_common::models::{CurrentOperationResponse, ImportFileData, StartImportRequest};
use thiserror::Error;

/// Backend request errors
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response; `message` is the server's error text when it sent one
    #[error("API error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Error text provided by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Request contracts of the importer backend
#[async_trait]
pub trait ImportBackend: Send + Sync {
    /// `None` means no import has been set up
    async fn get_import_file_data(&self) -> Result<Option<ImportFileData>, BackendError>;

    async fn get_current_import_operation(&self)
        -> Result<CurrentOperationResponse, BackendError>;

    async fn start_import(&self, request: &StartImportRequest) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_only_for_api_errors_with_text() {
        let with_text = BackendError::Api {
            status: 400,
            message: Some("error-importer-busy".to_string()),
        };
        assert_eq!(with_text.server_message(), Some("error-importer-busy"));

        let blank = BackendError::Api {
            status: 500,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.server_message(), None);

        assert_eq!(BackendError::Network("refused".into()).server_message(), None);
    }

    #[test]
    fn test_display() {
        let err = BackendError::Api {
            status: 403,
            message: None,
        };
        assert_eq!(err.to_string(), "API error 403: no message");
    }
}
