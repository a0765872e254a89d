//! Operation status resolution
//!
//! Polls the current import operation until it leaves the waiting phases,
//! then turns its phase into exactly one next action for the page.
//!
//! | Operation | Action |
//! |---|---|
//! | `valid == false` | [`Resolution::NoActiveJob`] |
//! | ImportingStartedPhases | [`Resolution::AlreadyImporting`] |
//! | USER_SELECTION, PreparingStartedPhases, FileReadyPhases | [`Resolution::LoadDetail`] |
//! | ImportingErrorPhases | [`Resolution::Failed`] (`Import_Operation_Failed`) |
//! | DONE | [`Resolution::Finished`] |
//! | anything else | [`Resolution::Failed`] (`Unknown_Import_State`) |

use crate::backend::ImportBackend;
use crate::error::{Failure, PrepareError};
use crate::waiter::{PollingWaiter, WaitError};
use chim_common::models::ImportOperation;
use chim_common::{Phase, PhaseGroup};
use std::sync::Arc;
use tracing::{info, warn};

/// Next action decided from the backend's operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No job exists; go to the job-creation entry point
    NoActiveJob,
    /// The import run is already executing; go to the progress view
    AlreadyImporting,
    /// Preparation underway or finished; load the file snapshot
    LoadDetail(Phase),
    /// Job already finished; go to the history
    Finished,
    /// Terminal error; notify and go to the history
    Failed(Failure),
}

/// Whether polling can stop for this operation
///
/// An invalid operation is final as well: there is nothing to wait for.
pub fn is_resolved(operation: &ImportOperation) -> bool {
    !operation.valid || !operation.status.is_waiting()
}

/// Map an operation to its action
pub fn classify(operation: &ImportOperation) -> Resolution {
    if !operation.valid {
        return Resolution::NoActiveJob;
    }

    match operation.status.group() {
        PhaseGroup::ImportingStarted => Resolution::AlreadyImporting,
        PhaseGroup::UserSelection | PhaseGroup::PreparingStarted | PhaseGroup::FileReady => {
            Resolution::LoadDetail(operation.status.clone())
        }
        PhaseGroup::ImportingError => {
            Resolution::Failed(Failure::new(PrepareError::OperationFailure))
        }
        PhaseGroup::Done => Resolution::Finished,
        // Waiting is only reachable if classify is called before polling settles
        PhaseGroup::Unrecognized | PhaseGroup::Waiting => Resolution::Failed(Failure::new(
            PrepareError::UnknownPhase(operation.status.as_str().to_string()),
        )),
    }
}

pub struct OperationStatusResolver {
    backend: Arc<dyn ImportBackend>,
    waiter: PollingWaiter,
}

impl OperationStatusResolver {
    pub fn new(backend: Arc<dyn ImportBackend>, waiter: PollingWaiter) -> Self {
        Self { backend, waiter }
    }

    /// Poll until the operation is resolved and classify it
    ///
    /// Returns `None` when the waiter was cancelled. A failed request is
    /// never retried and always reports `Failed_To_Load_Import_Data`.
    pub async fn resolve(&self) -> Option<Resolution> {
        let backend = self.backend.clone();
        let polled = self
            .waiter
            .wait_for(
                "current import operation",
                move || {
                    let backend = backend.clone();
                    async move { backend.get_current_import_operation().await }
                },
                |response| is_resolved(&response.operation),
            )
            .await;

        match polled {
            Ok(response) => {
                let operation = response.operation;
                let resolution = classify(&operation);
                info!(
                    valid = operation.valid,
                    status = %operation.status,
                    resolution = ?resolution,
                    "Import operation resolved"
                );
                Some(resolution)
            }
            Err(WaitError::Probe(e)) => {
                warn!(error = %e, "Failed to fetch current import operation");
                Some(Resolution::Failed(Failure::new(PrepareError::LoadFailure)))
            }
            Err(WaitError::Cancelled) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(valid: bool, status: Phase) -> ImportOperation {
        ImportOperation::new(valid, status)
    }

    /// Collapse a resolution to the five page actions
    fn action(resolution: &Resolution) -> &'static str {
        match resolution {
            Resolution::NoActiveJob => "redirect-to-new",
            Resolution::AlreadyImporting => "redirect-to-progress",
            Resolution::LoadDetail(_) => "load-detail",
            Resolution::Failed(_) => "redirect-to-history-error",
            Resolution::Finished => "redirect-to-history-done",
        }
    }

    #[test]
    fn test_every_resolved_phase_maps_to_one_action() {
        for phase in Phase::ALL_KNOWN.iter().filter(|p| !p.is_waiting()) {
            let resolution = classify(&op(true, phase.clone()));
            let expected = match phase.group() {
                PhaseGroup::ImportingStarted => "redirect-to-progress",
                PhaseGroup::UserSelection
                | PhaseGroup::PreparingStarted
                | PhaseGroup::FileReady => "load-detail",
                PhaseGroup::ImportingError => "redirect-to-history-error",
                PhaseGroup::Done => "redirect-to-history-done",
                PhaseGroup::Waiting | PhaseGroup::Unrecognized => unreachable!(),
            };
            assert_eq!(action(&resolution), expected, "phase {}", phase);
        }
    }

    #[test]
    fn test_waiting_phases_are_not_resolved() {
        for phase in chim_common::phase::WAITING_PHASES {
            assert!(!is_resolved(&op(true, phase.clone())), "phase {}", phase);
        }
        assert!(is_resolved(&op(true, Phase::UserSelection)));
        assert!(is_resolved(&op(false, Phase::New)));
    }

    #[test]
    fn test_invalid_operation_means_no_job() {
        assert_eq!(classify(&op(false, Phase::UserSelection)), Resolution::NoActiveJob);
        assert_eq!(classify(&op(false, Phase::Failed)), Resolution::NoActiveJob);
    }

    #[test]
    fn test_load_detail_records_phase() {
        assert_eq!(
            classify(&op(true, Phase::PreparingUsers)),
            Resolution::LoadDetail(Phase::PreparingUsers)
        );
        assert_eq!(
            classify(&op(true, Phase::FileLoaded)),
            Resolution::LoadDetail(Phase::FileLoaded)
        );
    }

    #[test]
    fn test_error_phases_fail_with_operation_key() {
        for phase in chim_common::phase::IMPORTING_ERROR_PHASES {
            match classify(&op(true, phase.clone())) {
                Resolution::Failed(failure) => {
                    assert_eq!(failure.error, PrepareError::OperationFailure);
                    assert_eq!(failure.notice.message, "Import_Operation_Failed");
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_phase_fails_with_unknown_state() {
        match classify(&op(true, Phase::from("importer_time_travel"))) {
            Resolution::Failed(failure) => {
                assert_eq!(
                    failure.error,
                    PrepareError::UnknownPhase("importer_time_travel".into())
                );
                assert_eq!(failure.notice.message, "Unknown_Import_State");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
