//! In-memory page state shared by the preparation chain, the progress
//! listener and user actions

use crate::selection::SelectionState;
use chim_common::Phase;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mutable state of one preparation page
#[derive(Debug, Clone, Default)]
pub struct PrepareState {
    /// True until the file snapshot has been loaded
    pub preparing: bool,
    /// Start-import request in flight
    pub importing: bool,
    /// Last pushed completion percentage; `None` until the first event
    pub progress_rate: Option<f64>,
    /// Phase recorded by the resolver before loading file data
    pub status: Option<Phase>,
    pub message_count: u64,
    pub selection: SelectionState,
}

impl PrepareState {
    /// Fresh state for a new waiting cycle
    pub fn preparing() -> Self {
        Self {
            preparing: true,
            ..Self::default()
        }
    }
}

pub type SharedState = Arc<RwLock<PrepareState>>;

pub fn shared(state: PrepareState) -> SharedState {
    Arc::new(RwLock::new(state))
}
