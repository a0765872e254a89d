//! Import preparation orchestrator
//!
//! `PrepareImport` owns one page scope. Mounting it starts two activities:
//! the resolver → file-load chain and the progress listener. User actions
//! (toggles, submit, back) run on the caller's task. All three share one
//! [`PrepareState`] behind a lock.
//!
//! **Liveness:** every continuation re-checks the scope after acquiring the
//! state lock and before sending a signal. After [`PrepareImport::teardown`]
//! no state is mutated and no signal is delivered.

use crate::backend::ImportBackend;
use crate::error::{Failure, Notice, PrepareError};
use crate::preparation::FilePreparationLoader;
use crate::progress::ProgressEventListener;
use crate::resolver::{OperationStatusResolver, Resolution};
use crate::selection::{BulkToggle, SelectionState};
use crate::state::{shared, PrepareState, SharedState};
use crate::submitter::{build_request, ImportSubmitter};
use crate::view::PrepareView;
use crate::waiter::PollingWaiter;
use chim_common::events::EventBus;
use chim_common::models::StartImportRequest;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Navigation targets outside this page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Job-creation entry point
    NewImport,
    /// Running import progress view
    ImportProgress,
    /// Job history
    ImportHistory,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::NewImport => "admin-import-new",
            Route::ImportProgress => "admin-import-progress",
            Route::ImportHistory => "admin-import",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signals sent to the page's collaborators (router, notifier, renderer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    Redirect(Route),
    Notify(Notice),
    /// File snapshot loaded; selection is editable
    Prepared,
}

/// Result of [`PrepareImport::start_import`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Backend accepted the request
    Started,
    /// Backend rejected it; the page stays and submit is re-armed
    Failed(Failure),
    /// A submit is already running
    AlreadyInFlight,
    /// Still preparing, or the page was torn down
    NotReady,
}

/// Liveness flag plus the outgoing signal channel
#[derive(Clone)]
struct PageScope {
    session_id: Uuid,
    cancel: CancellationToken,
    signals: mpsc::UnboundedSender<PageSignal>,
}

impl PageScope {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    fn signal(&self, signal: PageSignal) {
        if !self.is_live() {
            debug!(session_id = %self.session_id, ?signal, "Dropping signal after teardown");
            return;
        }
        if self.signals.send(signal).is_err() {
            debug!(session_id = %self.session_id, "No signal receiver");
        }
    }

    fn redirect(&self, route: Route) {
        info!(session_id = %self.session_id, route = %route, "Redirecting");
        self.signal(PageSignal::Redirect(route));
    }

    /// Notify the user; errors that do not keep the page leave for the history
    fn report(&self, failure: Failure) {
        error!(
            session_id = %self.session_id,
            error = %failure.error,
            message = %failure.notice.message,
            "Import preparation failed"
        );
        let leave = !failure.error.keeps_page();
        self.signal(PageSignal::Notify(failure.notice));
        if leave {
            self.redirect(Route::ImportHistory);
        }
    }

    /// Mutate state unless the scope died while waiting for the lock
    async fn apply<F>(&self, state: &SharedState, mutate: F) -> bool
    where
        F: FnOnce(&mut PrepareState),
    {
        let mut guard = state.write().await;
        if !self.is_live() {
            debug!(session_id = %self.session_id, "Discarding result after teardown");
            return false;
        }
        mutate(&mut guard);
        true
    }
}

/// Import preparation page
pub struct PrepareImport {
    backend: Arc<dyn ImportBackend>,
    poll_interval: Duration,
    state: SharedState,
    scope: PageScope,
    listener: Option<ProgressEventListener>,
    chain: Option<JoinHandle<()>>,
}

impl PrepareImport {
    /// Create an unmounted page and the receiver for its signals
    pub fn new(
        backend: Arc<dyn ImportBackend>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<PageSignal>) {
        let (signals, rx) = mpsc::unbounded_channel();
        let page = Self {
            backend,
            poll_interval,
            state: shared(PrepareState::preparing()),
            scope: PageScope {
                session_id: Uuid::new_v4(),
                cancel: CancellationToken::new(),
                signals,
            },
            listener: None,
            chain: None,
        };
        (page, rx)
    }

    pub fn is_mounted(&self) -> bool {
        self.chain.is_some() && self.scope.is_live()
    }

    /// Start listening for progress and resolving the current operation
    ///
    /// Mounting twice is a no-op; a torn-down page cannot be mounted again.
    pub async fn mount(&mut self, bus: &EventBus) {
        if !self.scope.is_live() {
            warn!(session_id = %self.scope.session_id, "Cannot mount a torn-down page");
            return;
        }
        if self.chain.is_some() {
            debug!(session_id = %self.scope.session_id, "Already mounted");
            return;
        }

        // New waiting cycle: rate unset until the first push
        *self.state.write().await = PrepareState::preparing();

        self.listener = Some(ProgressEventListener::subscribe(
            bus,
            self.state.clone(),
            self.scope.cancel.child_token(),
        ));

        let chain = run_preparation(
            self.scope.clone(),
            self.state.clone(),
            self.backend.clone(),
            self.poll_interval,
        );
        self.chain = Some(tokio::spawn(chain));

        info!(session_id = %self.scope.session_id, "Import preparation mounted");
    }

    /// Flip one account. `None` for unknown ids or while not editable.
    pub async fn toggle_user(&self, user_id: &str) -> Option<bool> {
        self.edit(|selection| selection.users.toggle_one(user_id)).await
    }

    pub async fn toggle_all_users(&self) -> Option<BulkToggle> {
        self.edit(|selection| Some(selection.users.toggle_all())).await
    }

    /// Flip one channel. `None` for unknown ids or while not editable.
    pub async fn toggle_channel(&self, channel_id: &str) -> Option<bool> {
        self.edit(|selection| selection.channels.toggle_one(channel_id)).await
    }

    pub async fn toggle_all_channels(&self) -> Option<BulkToggle> {
        self.edit(|selection| Some(selection.channels.toggle_all())).await
    }

    /// Submit the current selection
    pub async fn start_import(&self) -> SubmitOutcome {
        let request = {
            let mut state = self.state.write().await;
            if !self.scope.is_live() || state.preparing {
                return SubmitOutcome::NotReady;
            }
            if state.importing {
                return SubmitOutcome::AlreadyInFlight;
            }
            state.importing = true;
            build_request(&state.selection)
        };

        // Detached so a dropped caller still re-arms submit
        let submit = tokio::spawn(submit_selection(
            self.scope.clone(),
            self.state.clone(),
            self.backend.clone(),
            request,
        ));
        match submit.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(session_id = %self.scope.session_id, error = %e, "Start import task failed");
                self.scope
                    .apply(&self.state, |state| state.importing = false)
                    .await;
                SubmitOutcome::Failed(Failure::new(PrepareError::SubmitFailure))
            }
        }
    }

    /// User left for the import list
    pub fn back_to_imports(&self) {
        self.scope.redirect(Route::ImportHistory);
    }

    pub async fn view(&self) -> PrepareView {
        PrepareView::from_state(&*self.state.read().await)
    }

    /// Cancel all activity. Safe to call more than once; also runs on drop.
    pub fn teardown(&mut self) {
        let was_live = self.scope.is_live();
        self.scope.cancel.cancel();

        if let Some(mut listener) = self.listener.take() {
            listener.stop();
        }
        if let Some(chain) = self.chain.take() {
            chain.abort();
        }

        if was_live {
            info!(session_id = %self.scope.session_id, "Import preparation torn down");
        }
    }

    async fn edit<R>(&self, mutate: impl FnOnce(&mut SelectionState) -> Option<R>) -> Option<R> {
        let mut state = self.state.write().await;
        if !self.scope.is_live() || state.preparing {
            return None;
        }
        mutate(&mut state.selection)
    }
}

impl Drop for PrepareImport {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Send one start request and re-arm submit whatever the result
async fn submit_selection(
    scope: PageScope,
    state: SharedState,
    backend: Arc<dyn ImportBackend>,
    request: StartImportRequest,
) -> SubmitOutcome {
    let result = ImportSubmitter::new(backend).submit(&request).await;

    let applied = scope.apply(&state, |state| state.importing = false).await;

    match result {
        Ok(()) => {
            if applied {
                scope.redirect(Route::ImportProgress);
            }
            SubmitOutcome::Started
        }
        Err(failure) => {
            if applied {
                scope.report(failure.clone());
            }
            SubmitOutcome::Failed(failure)
        }
    }
}

/// Resolver → file-load chain
async fn run_preparation(
    scope: PageScope,
    state: SharedState,
    backend: Arc<dyn ImportBackend>,
    poll_interval: Duration,
) {
    let waiter = PollingWaiter::new(poll_interval, scope.cancel.child_token());

    let resolver = OperationStatusResolver::new(backend.clone(), waiter.clone());
    let Some(resolution) = resolver.resolve().await else {
        debug!(session_id = %scope.session_id, "Operation polling cancelled");
        return;
    };

    let phase = match resolution {
        Resolution::NoActiveJob => return scope.redirect(Route::NewImport),
        Resolution::AlreadyImporting => return scope.redirect(Route::ImportProgress),
        Resolution::Finished => return scope.redirect(Route::ImportHistory),
        Resolution::Failed(failure) => return scope.report(failure),
        Resolution::LoadDetail(phase) => phase,
    };

    if !scope.apply(&state, |state| state.status = Some(phase)).await {
        return;
    }

    let loader = FilePreparationLoader::new(backend, waiter);
    let prepared = match loader.load().await {
        Some(Ok(prepared)) => prepared,
        Some(Err(failure)) => return scope.report(failure),
        None => {
            debug!(session_id = %scope.session_id, "File data polling cancelled");
            return;
        }
    };

    let applied = scope
        .apply(&state, |state| {
            state.selection = prepared.selection;
            state.message_count = prepared.message_count;
            state.preparing = false;
            state.progress_rate = None;
        })
        .await;

    if applied {
        info!(session_id = %scope.session_id, "Import ready for selection");
        scope.signal(PageSignal::Prepared);
    }
}
