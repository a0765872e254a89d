//! Scripted in-memory importer backend

use async_trait::async_trait;
use chim_common::models::{CurrentOperationResponse, ImportFileData, StartImportRequest};
use chim_prep::{BackendError, ImportBackend};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replies are consumed in order; the last one repeats forever
struct Script<T> {
    replies: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(replies: Vec<T>) -> Self {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Self {
            replies: replies.into(),
        }
    }

    fn next(&mut self) -> T {
        if self.replies.len() > 1 {
            self.replies.pop_front().unwrap()
        } else {
            self.replies[0].clone()
        }
    }
}

pub struct FakeBackend {
    operations: Mutex<Script<Result<CurrentOperationResponse, BackendError>>>,
    file_data: Mutex<Script<Result<Option<ImportFileData>, BackendError>>>,
    start_replies: Mutex<Script<Result<(), BackendError>>>,
    start_delay: Option<Duration>,
    operation_calls: AtomicUsize,
    file_data_calls: AtomicUsize,
    submitted: Mutex<Vec<StartImportRequest>>,
}

impl FakeBackend {
    pub fn new(operation: CurrentOperationResponse) -> Self {
        Self {
            operations: Mutex::new(Script::new(vec![Ok(operation)])),
            file_data: Mutex::new(Script::new(vec![Ok(None)])),
            start_replies: Mutex::new(Script::new(vec![Ok(())])),
            start_delay: None,
            operation_calls: AtomicUsize::new(0),
            file_data_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_operations(
        self,
        replies: Vec<Result<CurrentOperationResponse, BackendError>>,
    ) -> Self {
        *self.operations.lock().unwrap() = Script::new(replies);
        self
    }

    pub fn with_file_data(self, data: Option<ImportFileData>) -> Self {
        self.with_file_data_replies(vec![Ok(data)])
    }

    pub fn with_file_data_replies(
        self,
        replies: Vec<Result<Option<ImportFileData>, BackendError>>,
    ) -> Self {
        *self.file_data.lock().unwrap() = Script::new(replies);
        self
    }

    pub fn with_start_replies(self, replies: Vec<Result<(), BackendError>>) -> Self {
        *self.start_replies.lock().unwrap() = Script::new(replies);
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn operation_calls(&self) -> usize {
        self.operation_calls.load(Ordering::SeqCst)
    }

    pub fn file_data_calls(&self) -> usize {
        self.file_data_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<StartImportRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImportBackend for FakeBackend {
    async fn get_import_file_data(&self) -> Result<Option<ImportFileData>, BackendError> {
        self.file_data_calls.fetch_add(1, Ordering::SeqCst);
        self.file_data.lock().unwrap().next()
    }

    async fn get_current_import_operation(
        &self,
    ) -> Result<CurrentOperationResponse, BackendError> {
        self.operation_calls.fetch_add(1, Ordering::SeqCst);
        self.operations.lock().unwrap().next()
    }

    async fn start_import(&self, request: &StartImportRequest) -> Result<(), BackendError> {
        self.submitted.lock().unwrap().push(request.clone());
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        self.start_replies.lock().unwrap().next()
    }
}
