//! File preparation load
//!
//! Waits for the backend to finish preparing the uploaded source, then turns
//! the snapshot into a fresh selection with every row selected.

use crate::backend::ImportBackend;
use crate::error::{Failure, PrepareError};
use crate::selection::SelectionState;
use crate::waiter::{PollingWaiter, WaitError};
use chim_common::models::ImportFileData;
use std::sync::Arc;
use tracing::{info, warn};

/// Snapshot ready for user selection
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub message_count: u64,
    pub selection: SelectionState,
}

/// Whether polling can stop. "No import set up" is final too.
pub fn is_ready(data: &Option<ImportFileData>) -> bool {
    data.as_ref().map_or(true, |data| !data.waiting)
}

/// Validate a ready snapshot
pub fn interpret(data: Option<ImportFileData>) -> Result<PreparedImport, Failure> {
    let data = data.ok_or_else(|| Failure::new(PrepareError::SetupMissing))?;

    if let Some(step) = &data.step {
        warn!(step = %step, "Import failed before user selection");
        return Err(Failure::new(PrepareError::LoadFailure));
    }

    Ok(PreparedImport {
        message_count: data.message_count,
        selection: SelectionState::load(data.users, data.channels),
    })
}

pub struct FilePreparationLoader {
    backend: Arc<dyn ImportBackend>,
    waiter: PollingWaiter,
}

impl FilePreparationLoader {
    pub fn new(backend: Arc<dyn ImportBackend>, waiter: PollingWaiter) -> Self {
        Self { backend, waiter }
    }

    /// Poll file data until ready and interpret it
    ///
    /// Returns `None` when the waiter was cancelled.
    pub async fn load(&self) -> Option<Result<PreparedImport, Failure>> {
        let backend = self.backend.clone();
        let polled = self
            .waiter
            .wait_for(
                "import file data",
                move || {
                    let backend = backend.clone();
                    async move { backend.get_import_file_data().await }
                },
                is_ready,
            )
            .await;

        match polled {
            Ok(data) => {
                let result = interpret(data);
                if let Ok(prepared) = &result {
                    info!(
                        users = prepared.selection.users.len(),
                        channels = prepared.selection.channels.len(),
                        messages = prepared.message_count,
                        "Import file data loaded"
                    );
                }
                Some(result)
            }
            Err(WaitError::Probe(e)) => {
                warn!(error = %e, "Failed to fetch import file data");
                Some(Err(Failure::from_backend(&e, PrepareError::LoadFailure)))
            }
            Err(WaitError::Cancelled) => None,
        }
    }
}
