//! Progress payload type definitions
//!
//! Supporting types for importer progress pushed by the backend.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// Completed/total counters of the current backend phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCount {
    pub completed: u64,
    pub total: u64,
}

/// One progress push for the active job
///
/// `rate` is the completion percentage (0.0 - 100.0) of the current phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub rate: f64,
    /// Importer key of the job that produced this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<ProgressCount>,
}

impl ProgressEvent {
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate,
            key: None,
            name: None,
            step: None,
            count: None,
        }
    }
}
