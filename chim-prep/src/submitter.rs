//! Start-import submission

use crate::backend::ImportBackend;
use crate::error::{Failure, PrepareError};
use crate::selection::SelectionState;
use chim_common::models::{StartImportInput, StartImportRequest};
use std::sync::Arc;
use tracing::{info, warn};

/// Request carrying every row, selected or not; the backend picks the subset
pub fn build_request(selection: &SelectionState) -> StartImportRequest {
    StartImportRequest {
        input: StartImportInput {
            users: selection.users.to_vec(),
            channels: selection.channels.to_vec(),
        },
    }
}

pub struct ImportSubmitter {
    backend: Arc<dyn ImportBackend>,
}

impl ImportSubmitter {
    pub fn new(backend: Arc<dyn ImportBackend>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, request: &StartImportRequest) -> Result<(), Failure> {
        let selected_users = request.input.users.iter().filter(|u| u.do_import).count();
        let selected_channels = request.input.channels.iter().filter(|c| c.do_import).count();

        match self.backend.start_import(request).await {
            Ok(()) => {
                info!(selected_users, selected_channels, "Import started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Start import rejected");
                Err(Failure::from_backend(&e, PrepareError::SubmitFailure))
            }
        }
    }
}
