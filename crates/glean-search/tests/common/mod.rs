//! Shared fixtures for glean-search integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use glean_search::error::{EmbedError, SearchError};
use glean_search::{Embedder, HashingEmbedder, QueryBackend};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Hashing embedder with call accounting, scripted latency and switchable
/// failure modes.
pub struct MockEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
    delays: Mutex<VecDeque<Duration>>,
    fail: AtomicBool,
    drop_last_vector: AtomicBool,
}

impl MockEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashingEmbedder::new(256),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            delays: Mutex::new(VecDeque::new()),
            fail: AtomicBool::new(false),
            drop_last_vector: AtomicBool::new(false),
        })
    }

    /// Queue per-call latencies; calls beyond the queue answer immediately.
    pub fn push_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.delays.lock().extend(delays);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Answer with one vector too few.
    pub fn set_short_response(&self, short: bool) {
        self.drop_last_vector.store(short, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The first text of every batch, which the rankers use for the query.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(first) = texts.first() {
            self.queries.lock().push(first.clone());
        }

        let delay = self.delays.lock().pop_front().unwrap_or_default();
        if !delay.is_zero() {
            tokio::select! {
                () = cancel.cancelled() => return Err(EmbedError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbedError::Backend(anyhow::anyhow!("connection refused")));
        }

        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| self.inner.embed_one(t)).collect();
        if self.drop_last_vector.load(Ordering::SeqCst) {
            vectors.pop();
        }
        Ok(vectors)
    }
}

/// Controller backend that echoes the query after a scripted delay and never
/// looks at its cancellation token.
pub struct StubbornEcho {
    pub calls: Arc<AtomicUsize>,
    delays: Mutex<VecDeque<Duration>>,
}

impl StubbornEcho {
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                delays: Mutex::new(delays.into_iter().collect()),
            },
            calls,
        )
    }
}

#[async_trait]
impl QueryBackend for StubbornEcho {
    type Input = ();
    type Output = Vec<String>;

    fn is_available(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        query: &str,
        _input: &(),
        _cancel: &CancellationToken,
    ) -> Result<Vec<String>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().pop_front().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Ok(vec![query.to_owned()])
    }
}

pub const ARTICLE: &str = "Connection pools cap concurrent database sessions. \
    The scheduler retries failed jobs with backoff. \
    Pool exhaustion shows up as request timeouts. \
    Documentation lives next to the code.";

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
