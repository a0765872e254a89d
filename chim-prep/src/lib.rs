//! chim-prep: import preparation client
//!
//! Resolves the state of the current import job, loads the prepared
//! accounts and channels, lets the caller edit the selection and starts the
//! import. The binary in `main.rs` drives it from the command line.

pub mod backend;
pub mod cli;
pub mod error;
pub mod feed;
pub mod orchestrator;
pub mod preparation;
pub mod progress;
pub mod resolver;
pub mod selection;
pub mod state;
pub mod submitter;
pub mod view;
pub mod waiter;

pub use backend::{BackendError, HttpBackend, ImportBackend};
pub use error::{Failure, Notice, PrepareError};
pub use orchestrator::{PageSignal, PrepareImport, Route, SubmitOutcome};
pub use view::PrepareView;
