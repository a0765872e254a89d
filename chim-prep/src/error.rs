//! Terminal errors of the preparation page and the notices they surface
//!
//! Every variant is terminal for the orchestrator: none is retried
//! automatically. All but `SubmitFailure` end with a redirect to the import
//! history.

use crate::backend::BackendError;
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy of the preparation flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    /// No import has been set up
    #[error("importer not set up")]
    SetupMissing,

    /// Probe/network error or malformed file data
    #[error("failed to load import data")]
    LoadFailure,

    /// Backend reports the job itself failed
    #[error("import operation failed")]
    OperationFailure,

    /// Phase this client cannot classify
    #[error("unknown import state {0:?}")]
    UnknownPhase(String),

    /// Start-import request rejected
    #[error("failed to start import")]
    SubmitFailure,
}

impl PrepareError {
    /// Message key handed to the notification collaborator
    pub fn message_key(&self) -> &'static str {
        match self {
            PrepareError::SetupMissing => "Importer_not_setup",
            PrepareError::LoadFailure => "Failed_To_Load_Import_Data",
            PrepareError::OperationFailure => "Import_Operation_Failed",
            PrepareError::UnknownPhase(_) => "Unknown_Import_State",
            PrepareError::SubmitFailure => "Failed_To_Start_Import",
        }
    }

    /// Whether the page stays mounted after this error
    pub fn keeps_page(&self) -> bool {
        matches!(self, PrepareError::SubmitFailure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Error,
}

/// Message for the user; `message` is a translation key or server text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// Notice carrying the fixed key of `error`
    pub fn for_error(error: &PrepareError) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: error.message_key().to_string(),
        }
    }

    /// Notice for a backend failure: the server's own message wins over
    /// the default key of `fallback`
    pub fn from_backend(cause: &BackendError, fallback: &PrepareError) -> Self {
        match cause.server_message() {
            Some(message) => Self {
                kind: NoticeKind::Error,
                message: message.to_string(),
            },
            None => Self::for_error(fallback),
        }
    }
}

/// Terminal error together with the notice shown for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: PrepareError,
    pub notice: Notice,
}

impl Failure {
    /// Failure announced with its fixed message key
    pub fn new(error: PrepareError) -> Self {
        let notice = Notice::for_error(&error);
        Self { error, notice }
    }

    /// Failure caused by a backend error; server text wins over the key
    pub fn from_backend(cause: &BackendError, error: PrepareError) -> Self {
        let notice = Notice::from_backend(cause, &error);
        Self { error, notice }
    }
}
