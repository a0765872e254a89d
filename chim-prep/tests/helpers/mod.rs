//! Test Helper Utilities
//!
//! Shared fixtures and fakes for chim-prep integration tests

#![allow(dead_code, unused_imports)]

pub mod fake_backend;
pub mod fake_server;

pub use fake_backend::FakeBackend;
pub use fake_server::{FakeServer, FileDataReply, StartReply};

use chim_common::models::{
    CurrentOperationResponse, ImportChannel, ImportFileData, ImportOperation, ImportUser,
};
use chim_common::Phase;
use chim_prep::PageSignal;
use std::time::Duration;
use tokio::sync::mpsc;

pub fn operation(valid: bool, status: Phase) -> CurrentOperationResponse {
    CurrentOperationResponse {
        operation: ImportOperation::new(valid, status),
    }
}

/// Three accounts (the second one deleted) and two live channels
pub fn prepared_file_data() -> ImportFileData {
    ImportFileData {
        waiting: false,
        step: None,
        message_count: 1234,
        users: vec![
            ImportUser::new("u1", "ana", "ana@example.com", false),
            ImportUser::new("u2", "bo", "bo@example.com", true),
            ImportUser::new("u3", "cy", "cy@example.com", false),
        ],
        channels: vec![
            ImportChannel::new("c1", "general", false),
            ImportChannel::new("c2", "random", false),
        ],
    }
}

pub fn waiting_file_data() -> ImportFileData {
    ImportFileData {
        waiting: true,
        ..ImportFileData::default()
    }
}

/// Next page signal; fails the test if none arrives
pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<PageSignal>) -> PageSignal {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for a page signal")
        .expect("signal channel closed")
}

/// Poll `check` until it holds; fails the test after ~5s of (possibly paused) time
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held: {}", what);
}
