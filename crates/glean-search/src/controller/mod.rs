//! Debounced, cancellable query sessions.
//!
//! A [`QueryController`] owns one search session: the displayed query, the
//! last committed results, the last error and the source being searched.
//! Keystrokes go through [`QueryController::set_query`], which debounces;
//! [`QueryController::search`] runs immediately.
//!
//! Phases move `Idle -> Debouncing -> Searching -> Idle`. A manual search
//! skips straight to `Searching`.
//!
//! Every issued search bumps a generation counter and cancels the token of
//! the request it replaces. A request only commits if the generation is
//! unchanged when it completes, so a slow, superseded backend call can never
//! overwrite newer results.

pub mod debounce;
mod items;
mod text;

pub use debounce::Debouncer;
pub use items::{ItemSearch, ItemSelectController};
pub use text::{TextChunkSearch, TextSearchController};

use crate::error::SearchError;
use async_trait::async_trait;
use glean_core::config::{ItemSelectConfig, TextSearchConfig};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The work a controller schedules: one query against one input.
#[async_trait]
pub trait QueryBackend: Send + Sync + 'static {
    /// What is searched (source text, item list). Replacing the input with
    /// an equal value keeps committed results valid.
    type Input: Clone + PartialEq + Send + Sync + 'static;
    /// What a search commits.
    type Output: Clone + Default + Send + Sync + 'static;

    /// False when searching is impossible (no backend configured). The
    /// controller then returns empty results without error.
    fn is_available(&self) -> bool;

    async fn execute(
        &self,
        query: &str,
        input: &Self::Input,
        cancel: &CancellationToken,
    ) -> Result<Self::Output, SearchError>;
}

/// Debounce and minimum-length settings for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub debounce: Duration,
    /// Queries with fewer characters (after trimming) clear results instead
    /// of searching.
    pub min_query_length: usize,
}

impl ControllerConfig {
    /// 300 ms debounce, 2 character minimum.
    #[must_use]
    pub const fn text_search() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_length: 2,
        }
    }

    /// 200 ms debounce, 1 character minimum.
    #[must_use]
    pub const fn item_select() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            min_query_length: 1,
        }
    }
}

impl From<&TextSearchConfig> for ControllerConfig {
    fn from(config: &TextSearchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_query_length: config.min_query_length,
        }
    }
}

impl From<&ItemSelectConfig> for ControllerConfig {
    fn from(config: &ItemSelectConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_query_length: config.min_query_length,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Debouncing,
    Searching,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Debouncing => "debouncing",
            Self::Searching => "searching",
        })
    }
}

/// Point-in-time view of a controller, as published to subscribers.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot<O> {
    pub query: String,
    pub results: O,
    pub phase: Phase,
    pub error: Option<SearchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchKey {
    query: String,
    input_revision: u64,
}

struct SessionState<B: QueryBackend> {
    query: String,
    results: B::Output,
    error: Option<SearchError>,
    input: B::Input,
    input_revision: u64,
    /// Bumped whenever in-flight work is superseded.
    generation: u64,
    /// Cancellation handle of the search currently running.
    in_flight: Option<CancellationToken>,
    /// Key of the search whose results are currently committed.
    last_completed: Option<SearchKey>,
    debounce_seq: u64,
    pending_debounce: Option<u64>,
    disposed: bool,
}

impl<B: QueryBackend> SessionState<B> {
    fn new(input: B::Input) -> Self {
        Self {
            query: String::new(),
            results: B::Output::default(),
            error: None,
            input,
            input_revision: 0,
            generation: 0,
            in_flight: None,
            last_completed: None,
            debounce_seq: 0,
            pending_debounce: None,
            disposed: false,
        }
    }

    fn phase(&self) -> Phase {
        if self.in_flight.is_some() {
            Phase::Searching
        } else if self.pending_debounce.is_some() {
            Phase::Debouncing
        } else {
            Phase::Idle
        }
    }

    fn snapshot(&self) -> SearchSnapshot<B::Output> {
        SearchSnapshot {
            query: self.query.clone(),
            results: self.results.clone(),
            phase: self.phase(),
            error: self.error.clone(),
        }
    }

    /// Invalidate in-flight work: its result will be discarded on arrival.
    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(cancel) = self.in_flight.take() {
            cancel.cancel();
        }
    }

    fn clear_results(&mut self) {
        self.results = B::Output::default();
        self.error = None;
        self.last_completed = None;
    }
}

struct Inner<B: QueryBackend> {
    backend: B,
    config: ControllerConfig,
    state: Mutex<SessionState<B>>,
    snapshots: watch::Sender<SearchSnapshot<B::Output>>,
}

impl<B: QueryBackend> Inner<B> {
    fn meets_min_length(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.config.min_query_length
    }

    fn publish(&self, state: &SessionState<B>) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Run one search. `debounce_ticket` identifies the timer that fired,
    /// `None` for a manual search.
    async fn search(&self, query: Option<&str>, debounce_ticket: Option<u64>) -> B::Output {
        let (key, generation, cancel, input) = {
            let mut state = self.state.lock();
            if state.disposed {
                return B::Output::default();
            }
            if debounce_ticket.is_none() || state.pending_debounce == debounce_ticket {
                state.pending_debounce = None;
            }
            if let Some(query) = query {
                query.clone_into(&mut state.query);
            }
            let query = state.query.clone();

            if !self.backend.is_available() {
                debug!("search skipped: no backend configured");
                self.publish(&state);
                return B::Output::default();
            }

            if !self.meets_min_length(&query) {
                state.supersede();
                state.clear_results();
                self.publish(&state);
                return B::Output::default();
            }

            let key = SearchKey {
                query,
                input_revision: state.input_revision,
            };

            if state.last_completed.as_ref() == Some(&key) {
                debug!(query = %key.query, "reusing committed results");
                self.publish(&state);
                return state.results.clone();
            }

            state.supersede();
            let cancel = CancellationToken::new();
            state.in_flight = Some(cancel.clone());
            self.publish(&state);
            (key, state.generation, cancel, state.input.clone())
        };

        debug!(query = %key.query, generation, "search issued");
        let mut abandon = AbandonGuard {
            inner: self,
            generation,
            armed: true,
        };
        let outcome = self.backend.execute(&key.query, &input, &cancel).await;
        abandon.armed = false;

        let mut state = self.state.lock();
        if state.disposed || state.generation != generation {
            debug!(generation, "discarding superseded search result");
            return B::Output::default();
        }
        state.in_flight = None;

        let output = match outcome {
            Ok(results) => {
                state.results = results.clone();
                state.error = None;
                state.last_completed = Some(key);
                results
            }
            Err(err) if err.is_cancellation() => {
                debug!(generation, "search cancelled");
                B::Output::default()
            }
            Err(err) => {
                warn!(code = %err.code(), "search failed: {err}");
                state.error = Some(err);
                B::Output::default()
            }
        };
        self.publish(&state);
        output
    }
}

/// Clears the in-flight marker when a search future is dropped before the
/// backend answers (caller timeout, `select!`, aborted task).
struct AbandonGuard<'a, B: QueryBackend> {
    inner: &'a Inner<B>,
    generation: u64,
    armed: bool,
}

impl<B: QueryBackend> Drop for AbandonGuard<'_, B> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state.lock();
        if state.generation != self.generation {
            return;
        }
        if let Some(cancel) = state.in_flight.take() {
            cancel.cancel();
            debug!(generation = self.generation, "search abandoned by caller");
            self.inner.publish(&state);
        }
    }
}

/// One interactive search session over a [`QueryBackend`].
///
/// Intended for a single logical owner (one UI binding). Methods take
/// `&self` and the state is internally locked, but the lock is never held
/// while the backend runs. [`set_query`](Self::set_query) and the input
/// setters spawn timers and must be called inside a Tokio runtime.
pub struct QueryController<B: QueryBackend> {
    inner: Arc<Inner<B>>,
    debouncer: Debouncer,
}

impl<B: QueryBackend> QueryController<B> {
    #[must_use]
    pub fn new(backend: B, config: ControllerConfig, input: B::Input) -> Self {
        let state = SessionState::new(input);
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                state: Mutex::new(state),
                snapshots,
            }),
            debouncer: Debouncer::new(config.debounce),
        }
    }

    #[must_use]
    pub fn config(&self) -> ControllerConfig {
        self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Update the displayed query and (re)start the debounce timer.
    ///
    /// A query below the minimum length clears results and supersedes any
    /// search in flight without scheduling new work.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        state.query.clone_from(&query);

        if !self.inner.meets_min_length(&query) {
            self.debouncer.cancel();
            state.pending_debounce = None;
            state.supersede();
            state.clear_results();
            self.inner.publish(&state);
            return;
        }

        self.schedule(state, query);
    }

    /// Search now, bypassing the debounce. `None` searches the current query.
    ///
    /// Returns the committed results, or empty when the search was skipped,
    /// cancelled, superseded or failed. Failures are available from
    /// [`error`](Self::error).
    pub async fn search(&self, query: Option<&str>) -> B::Output {
        self.debouncer.cancel();
        self.inner.search(query, None).await
    }

    /// Reset query, results and error; cancel pending and in-flight work.
    pub fn clear(&self) {
        self.debouncer.cancel();
        let mut state = self.inner.state.lock();
        state.pending_debounce = None;
        state.supersede();
        state.query.clear();
        state.clear_results();
        self.inner.publish(&state);
    }

    /// Stop the session. Safe to call more than once.
    pub fn dispose(&self) {
        self.debouncer.cancel();
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.pending_debounce = None;
        state.supersede();
        self.inner.publish(&state);
        debug!("query controller disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    #[must_use]
    pub fn query(&self) -> String {
        self.inner.state.lock().query.clone()
    }

    #[must_use]
    pub fn results(&self) -> B::Output {
        self.inner.state.lock().results.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<SearchError> {
        self.inner.state.lock().error.clone()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase()
    }

    /// True while a backend call is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Searching
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot<B::Output> {
        self.inner.state.lock().snapshot()
    }

    /// Receive a snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot<B::Output>> {
        self.inner.snapshots.subscribe()
    }

    fn input(&self) -> B::Input {
        self.inner.state.lock().input.clone()
    }

    /// Swap the searched input and re-run the current query after the
    /// debounce if it is long enough.
    fn replace_input(&self, input: B::Input) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        if state.input == input {
            return;
        }
        state.input = input;
        state.input_revision += 1;

        let query = state.query.clone();
        if self.inner.meets_min_length(&query) {
            self.schedule(state, query);
        } else {
            self.inner.publish(&state);
        }
    }

    fn schedule(&self, mut state: MutexGuard<'_, SessionState<B>>, query: String) {
        state.debounce_seq += 1;
        let ticket = state.debounce_seq;
        state.pending_debounce = Some(ticket);
        self.inner.publish(&state);
        drop(state);

        let inner: Weak<Inner<B>> = Arc::downgrade(&self.inner);
        self.debouncer.schedule(move || async move {
            if let Some(inner) = inner.upgrade() {
                inner.search(Some(&query), Some(ticket)).await;
            }
        });
    }
}

impl<B: QueryBackend> Drop for QueryController<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: QueryBackend> fmt::Debug for QueryController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("QueryController")
            .field("query", &state.query)
            .field("phase", &state.phase())
            .field("generation", &state.generation)
            .field("disposed", &state.disposed)
            .finish_non_exhaustive()
    }
}
