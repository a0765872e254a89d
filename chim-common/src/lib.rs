//! # CHIM Common Library
//!
//! Shared code for the chat-importer client crates:
//! - Import phase catalog and phase groups
//! - Wire models exchanged with the importer backend
//! - Event types (ImporterEvent) and the EventBus
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod phase;

pub use error::{Error, Result};
pub use phase::{Phase, PhaseGroup};
