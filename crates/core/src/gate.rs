//! Bounded-concurrency admission for upstream requests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{HomeroomError, Result};

/// Caps the number of in-flight upstream fetches.
///
/// Per-student, per-course fan-out issues one assignments call and one
/// submissions call per course; every such call runs through [`FetchGate::run`].
/// The permit is held for the duration of the wrapped future and released
/// when it finishes, whether it succeeded or failed.
#[derive(Debug, Clone)]
pub struct FetchGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl FetchGate {
    /// Create a gate admitting `limit` concurrent fetches (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Wait for a slot, then drive `fut` to completion while holding it.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| HomeroomError::Gate("fetch gate closed".into()))?;
        fut.await
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
