//! Import phase catalog
//!
//! The backend reports the lifecycle stage of an import job as a string
//! (`importer_*`). Every known value belongs to exactly one [`PhaseGroup`];
//! values this client does not know yet are kept verbatim as
//! [`Phase::Unknown`] and classified as [`PhaseGroup::Unrecognized`].
//!
//! NEW → UPLOADING → DOWNLOADING_FILE → FILE_LOADED → PREPARING_* →
//! USER_SELECTION → IMPORTING_* → FINISHING → DONE

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-reported lifecycle stage of an import job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    New,
    Uploading,
    DownloadingFile,
    FileLoaded,
    PreparingStarted,
    PreparingUsers,
    PreparingChannels,
    PreparingMessages,
    UserSelection,
    ImportingStarted,
    ImportingUsers,
    ImportingChannels,
    ImportingMessages,
    ImportingFiles,
    Finishing,
    Done,
    Failed,
    Cancelled,
    /// Phase reported by a newer backend; wire value kept as-is
    Unknown(String),
}

/// Classification bins for the orchestrator's decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PhaseGroup {
    /// Not yet actionable by the client
    Waiting,
    /// Uploaded file parsed, preparation not started yet
    FileReady,
    /// Preparation underway
    PreparingStarted,
    /// Prepared snapshot waiting for the operator's selection
    UserSelection,
    /// The import run itself is executing
    ImportingStarted,
    /// Job terminated with a failure or was cancelled
    ImportingError,
    /// Job finished
    Done,
    /// Forward-compatibility gap
    Unrecognized,
}

pub const WAITING_PHASES: &[Phase] = &[Phase::New, Phase::Uploading, Phase::DownloadingFile];

pub const FILE_READY_PHASES: &[Phase] = &[Phase::FileLoaded];

pub const PREPARING_STARTED_PHASES: &[Phase] = &[
    Phase::PreparingStarted,
    Phase::PreparingUsers,
    Phase::PreparingChannels,
    Phase::PreparingMessages,
];

pub const IMPORTING_STARTED_PHASES: &[Phase] = &[
    Phase::ImportingStarted,
    Phase::ImportingUsers,
    Phase::ImportingChannels,
    Phase::ImportingMessages,
    Phase::ImportingFiles,
    Phase::Finishing,
];

pub const IMPORTING_ERROR_PHASES: &[Phase] = &[Phase::Failed, Phase::Cancelled];

const STATUS_PREFIX: &str = "importer_";
const STATUS_LABEL_PREFIX: &str = "importer_status_";

impl Phase {
    /// Every phase this client knows about, in lifecycle order
    pub const ALL_KNOWN: &'static [Phase] = &[
        Phase::New,
        Phase::Uploading,
        Phase::DownloadingFile,
        Phase::FileLoaded,
        Phase::PreparingStarted,
        Phase::PreparingUsers,
        Phase::PreparingChannels,
        Phase::PreparingMessages,
        Phase::UserSelection,
        Phase::ImportingStarted,
        Phase::ImportingUsers,
        Phase::ImportingChannels,
        Phase::ImportingMessages,
        Phase::ImportingFiles,
        Phase::Finishing,
        Phase::Done,
        Phase::Failed,
        Phase::Cancelled,
    ];

    /// Wire value as reported by the backend
    pub fn as_str(&self) -> &str {
        match self {
            Phase::New => "importer_new",
            Phase::Uploading => "importer_uploading",
            Phase::DownloadingFile => "importer_downloading_file",
            Phase::FileLoaded => "importer_file_loaded",
            Phase::PreparingStarted => "importer_preparing_started",
            Phase::PreparingUsers => "importer_preparing_users",
            Phase::PreparingChannels => "importer_preparing_channels",
            Phase::PreparingMessages => "importer_preparing_messages",
            Phase::UserSelection => "importer_user_selection",
            Phase::ImportingStarted => "importer_importing_started",
            Phase::ImportingUsers => "importer_importing_users",
            Phase::ImportingChannels => "importer_importing_channels",
            Phase::ImportingMessages => "importer_importing_messages",
            Phase::ImportingFiles => "importer_importing_files",
            Phase::Finishing => "importer_finishing",
            Phase::Done => "importer_done",
            Phase::Failed => "importer_import_failed",
            Phase::Cancelled => "importer_import_cancelled",
            Phase::Unknown(raw) => raw,
        }
    }

    /// Group membership. Exhaustive on purpose: a new variant does not
    /// compile until it is placed in exactly one bin.
    pub fn group(&self) -> PhaseGroup {
        match self {
            Phase::New | Phase::Uploading | Phase::DownloadingFile => PhaseGroup::Waiting,
            Phase::FileLoaded => PhaseGroup::FileReady,
            Phase::PreparingStarted
            | Phase::PreparingUsers
            | Phase::PreparingChannels
            | Phase::PreparingMessages => PhaseGroup::PreparingStarted,
            Phase::UserSelection => PhaseGroup::UserSelection,
            Phase::ImportingStarted
            | Phase::ImportingUsers
            | Phase::ImportingChannels
            | Phase::ImportingMessages
            | Phase::ImportingFiles
            | Phase::Finishing => PhaseGroup::ImportingStarted,
            Phase::Done => PhaseGroup::Done,
            Phase::Failed | Phase::Cancelled => PhaseGroup::ImportingError,
            Phase::Unknown(_) => PhaseGroup::Unrecognized,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.group() == PhaseGroup::Waiting
    }

    /// Display key for the recorded status, e.g.
    /// `importer_user_selection` → `importer_status_user_selection`.
    /// Values without the usual prefix are returned unchanged.
    pub fn status_label_key(&self) -> String {
        let raw = self.as_str();
        match raw.strip_prefix(STATUS_PREFIX) {
            Some(rest) => format!("{}{}", STATUS_LABEL_PREFIX, rest),
            None => raw.to_string(),
        }
    }
}

impl From<String> for Phase {
    fn from(raw: String) -> Self {
        Phase::ALL_KNOWN
            .iter()
            .find(|p| p.as_str() == raw)
            .cloned()
            .unwrap_or(Phase::Unknown(raw))
    }
}

impl From<&str> for Phase {
    fn from(raw: &str) -> Self {
        Phase::from(raw.to_string())
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.as_str().to_string()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_phase_in_exactly_one_group_list() {
        let lists: [(&[Phase], PhaseGroup); 5] = [
            (WAITING_PHASES, PhaseGroup::Waiting),
            (FILE_READY_PHASES, PhaseGroup::FileReady),
            (PREPARING_STARTED_PHASES, PhaseGroup::PreparingStarted),
            (IMPORTING_STARTED_PHASES, PhaseGroup::ImportingStarted),
            (IMPORTING_ERROR_PHASES, PhaseGroup::ImportingError),
        ];

        for phase in Phase::ALL_KNOWN {
            let memberships: Vec<PhaseGroup> = lists
                .iter()
                .filter(|(list, _)| list.contains(phase))
                .map(|(_, group)| *group)
                .collect();

            match phase {
                Phase::UserSelection | Phase::Done => {
                    assert!(memberships.is_empty(), "{} is individually named", phase)
                }
                _ => {
                    assert_eq!(memberships.len(), 1, "{} must be in one list", phase);
                    assert_eq!(memberships[0], phase.group());
                }
            }
        }
    }

    #[test]
    fn test_wire_values_round_trip() {
        for phase in Phase::ALL_KNOWN {
            let json = serde_json::to_string(phase).unwrap();
            let back: Phase = serde_json::from_str(&json).unwrap();
            assert_eq!(&back, phase);
        }
    }

    #[test]
    fn test_unknown_phase_is_preserved() {
        let phase: Phase = serde_json::from_str("\"importer_rewinding\"").unwrap();
        assert_eq!(phase, Phase::Unknown("importer_rewinding".to_string()));
        assert_eq!(phase.group(), PhaseGroup::Unrecognized);
        assert_eq!(serde_json::to_string(&phase).unwrap(), "\"importer_rewinding\"");
    }

    #[test]
    fn test_status_label_key() {
        assert_eq!(
            Phase::UserSelection.status_label_key(),
            "importer_status_user_selection"
        );
        assert_eq!(
            Phase::from("legacy_state").status_label_key(),
            "legacy_state"
        );
    }

    #[test]
    fn test_is_waiting() {
        assert!(Phase::New.is_waiting());
        assert!(Phase::DownloadingFile.is_waiting());
        assert!(!Phase::FileLoaded.is_waiting());
        assert!(!Phase::Unknown("x".into()).is_waiting());
    }
}
