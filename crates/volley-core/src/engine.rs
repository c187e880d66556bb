//! `DispatchEngine`: runs one batch of concurrent attempts until the target
//! success count is reached.
//!
//! Workers share a single [`BatchProgress`] behind a mutex and enter it in
//! two short critical sections:
//!
//! ```text
//! reserve:  success < target ?  attempt = attempts++  : exit
//! call:     executor.execute(credentials[attempt % N], payload)   (unlocked)
//! record:   successes++ ; first_success_payload.get_or_insert(body)
//! ```
//!
//! Shutdown is cooperative: a worker only notices the target on its next
//! reservation, so calls already in flight may push the success count past
//! the target by at most `workers - 1`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::task::JoinSet;

use crate::credential::CredentialSet;
use crate::error::DispatchError;
use crate::executor::RequestExecutor;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval for `debug!` progress logs while a batch runs. `None` disables.
    pub status_log_interval: Option<Duration>,
    /// Stop reserving attempts once this many have been made. `None` keeps
    /// going until the target success count is reached.
    pub max_attempts: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            status_log_interval: Some(Duration::from_secs(2)),
            max_attempts: None,
        }
    }
}

/// Shared counters of a running batch.
#[derive(Debug, Default)]
struct BatchProgress {
    success_count: u64,
    attempt_count: u64,
    first_success_payload: Option<Bytes>,
}

/// Final counters of a batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub success_count: u64,
    pub attempt_count: u64,
    pub first_success_payload: Option<Bytes>,
    pub elapsed: Duration,
    /// Number of workers actually spawned.
    pub workers: usize,
}

impl BatchResult {
    /// Elapsed seconds rounded to two decimals.
    pub fn elapsed_secs_rounded(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 100.0).round() / 100.0
    }

    /// Successes still missing to reach `target`; zero on overshoot.
    pub fn remaining(&self, target: u64) -> u64 {
        target.saturating_sub(self.success_count)
    }
}

/// One concurrent execution unit.
#[derive(Debug, Clone, Copy)]
struct WorkerHandle {
    index: usize,
}

/// Everything a worker needs, shared by reference across the pool.
struct BatchShared {
    progress: Mutex<BatchProgress>,
    credentials: CredentialSet,
    payload: Bytes,
    target: u64,
    max_attempts: Option<u64>,
    executor: Arc<dyn RequestExecutor>,
}

impl BatchShared {
    /// Check the stop condition and reserve the next attempt index in one
    /// step.
    fn reserve(&self) -> Option<u64> {
        let mut progress = self.progress.lock();
        if progress.success_count >= self.target {
            return None;
        }
        if self
            .max_attempts
            .is_some_and(|max| progress.attempt_count >= max)
        {
            return None;
        }
        let attempt = progress.attempt_count;
        progress.attempt_count += 1;
        Some(attempt)
    }

    /// Count a success; the first caller also stores its body.
    fn record_success(&self, body: Bytes) {
        let mut progress = self.progress.lock();
        progress.success_count += 1;
        if progress.first_success_payload.is_none() {
            progress.first_success_payload = Some(body);
        }
    }

    fn snapshot(&self) -> (u64, u64) {
        let progress = self.progress.lock();
        (progress.success_count, progress.attempt_count)
    }
}

/// Per-worker tallies, only used for logging.
#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    attempts: u64,
    successes: u64,
}

/// Runs batches against one executor.
pub struct DispatchEngine {
    executor: Arc<dyn RequestExecutor>,
    config: EngineConfig,
}

impl DispatchEngine {
    pub fn new(executor: Arc<dyn RequestExecutor>, config: EngineConfig) -> Self {
        Self { executor, config }
    }

    /// Worker count for a batch: never more workers than successes needed.
    pub fn effective_workers(concurrency: u64, target_success_count: u64) -> usize {
        let workers = concurrency.max(1).min(target_success_count.max(1));
        usize::try_from(workers).unwrap_or(usize::MAX)
    }

    /// Run one batch to completion.
    ///
    /// Fails before spawning anything if `credentials` is empty or the
    /// target is zero.
    #[tracing::instrument(
        skip(self, credentials, payload),
        fields(endpoint = %self.executor.endpoint(), credentials = credentials.len())
    )]
    pub async fn run_batch(
        &self,
        credentials: CredentialSet,
        payload: Bytes,
        target_success_count: u64,
        concurrency: u64,
    ) -> Result<BatchResult, DispatchError> {
        if credentials.is_empty() {
            return Err(DispatchError::NoCredentials {
                scope: format!("endpoint {}", self.executor.endpoint()),
            });
        }
        if target_success_count == 0 {
            return Err(DispatchError::invalid(
                "target success count must be positive",
            ));
        }

        let workers = Self::effective_workers(concurrency, target_success_count);
        let shared = Arc::new(BatchShared {
            progress: Mutex::new(BatchProgress::default()),
            credentials,
            payload,
            target: target_success_count,
            max_attempts: self.config.max_attempts,
            executor: self.executor.clone(),
        });

        tracing::info!(
            target_success = target_success_count,
            workers,
            "starting batch"
        );

        let start = Instant::now();

        // Background tasks live in their own set so that dropping the batch
        // future aborts them along with the workers.
        let mut background: JoinSet<()> = JoinSet::new();
        if let Some(interval) = self.config.status_log_interval {
            background.spawn(log_progress(shared.clone(), interval, start));
        }

        let mut join_set = JoinSet::new();
        for index in 0..workers {
            let shared = shared.clone();
            join_set.spawn(run_worker(WorkerHandle { index }, shared));
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "worker terminated abnormally");
            }
        }

        let elapsed = start.elapsed();
        background.abort_all();

        let progress = std::mem::take(&mut *shared.progress.lock());
        let result = BatchResult {
            success_count: progress.success_count,
            attempt_count: progress.attempt_count,
            first_success_payload: progress.first_success_payload,
            elapsed,
            workers,
        };

        tracing::info!(
            success = result.success_count,
            attempts = result.attempt_count,
            captured = result.first_success_payload.is_some(),
            elapsed_ms = elapsed.as_millis() as u64,
            "batch complete"
        );

        Ok(result)
    }
}

async fn log_progress(shared: Arc<BatchShared>, interval: Duration, start: Instant) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let (success, attempts) = shared.snapshot();
        tracing::debug!(
            success,
            attempts,
            target_success = shared.target,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch progress"
        );
    }
}

async fn run_worker(worker: WorkerHandle, shared: Arc<BatchShared>) -> WorkerStats {
    let mut stats = WorkerStats::default();

    while let Some(attempt) = shared.reserve() {
        stats.attempts += 1;
        let credential = shared.credentials.for_attempt(attempt);

        match shared
            .executor
            .execute(credential, shared.payload.clone())
            .await
        {
            Ok(body) => {
                stats.successes += 1;
                shared.record_success(body);
            }
            Err(e) => {
                tracing::trace!(
                    worker = worker.index,
                    attempt,
                    kind = e.kind(),
                    error = %e,
                    "attempt failed"
                );
            }
        }
    }

    tracing::debug!(
        worker = worker.index,
        attempts = stats.attempts,
        successes = stats.successes,
        "worker finished"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttemptError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingExecutor {
        calls: AtomicU64,
        succeed: bool,
    }

    #[async_trait]
    impl RequestExecutor for CountingExecutor {
        async fn execute(&self, _credential: &str, _payload: Bytes) -> Result<Bytes, AttemptError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(Bytes::from(format!("body-{n}")))
            } else {
                Err(AttemptError::Status { status: 500 })
            }
        }

        fn endpoint(&self) -> &str {
            "mock"
        }
    }

    fn engine(succeed: bool, max_attempts: Option<u64>) -> (DispatchEngine, Arc<CountingExecutor>) {
        let exec = Arc::new(CountingExecutor {
            calls: AtomicU64::new(0),
            succeed,
        });
        let config = EngineConfig {
            status_log_interval: None,
            max_attempts,
        };
        (DispatchEngine::new(exec.clone(), config), exec)
    }

    #[test]
    fn worker_count_is_clamped_to_target() {
        assert_eq!(DispatchEngine::effective_workers(10_000, 50), 50);
        assert_eq!(DispatchEngine::effective_workers(0, 50), 1);
        assert_eq!(DispatchEngine::effective_workers(8, 0), 1);
        assert_eq!(DispatchEngine::effective_workers(3, 1_000), 3);
    }

    #[test]
    fn result_helpers() {
        let r = BatchResult {
            success_count: 12,
            attempt_count: 20,
            first_success_payload: None,
            elapsed: Duration::from_millis(1_234),
            workers: 4,
        };
        assert_eq!(r.remaining(10), 0);
        assert_eq!(r.remaining(15), 3);
        assert!((r.elapsed_secs_rounded() - 1.23).abs() < f64::EPSILON);
    }

    #[test]
    fn reserve_stops_at_target() {
        let shared = BatchShared {
            progress: Mutex::new(BatchProgress::default()),
            credentials: CredentialSet::new(["a"]),
            payload: Bytes::new(),
            target: 2,
            max_attempts: None,
            executor: Arc::new(CountingExecutor {
                calls: AtomicU64::new(0),
                succeed: true,
            }),
        };
        assert_eq!(shared.reserve(), Some(0));
        assert_eq!(shared.reserve(), Some(1));
        shared.record_success(Bytes::from_static(b"first"));
        shared.record_success(Bytes::from_static(b"second"));
        assert_eq!(shared.reserve(), None);

        let progress = shared.progress.lock();
        assert_eq!(progress.attempt_count, 2);
        assert_eq!(
            progress.first_success_payload.as_deref(),
            Some(&b"first"[..])
        );
    }

    #[tokio::test]
    async fn empty_credentials_fail_without_calls() {
        let (engine, exec) = engine(true, None);
        let err = engine
            .run_batch(CredentialSet::default(), Bytes::new(), 5, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoCredentials { .. }));
        assert_eq!(exec.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_target_is_rejected() {
        let (engine, exec) = engine(true, None);
        let err = engine
            .run_batch(CredentialSet::new(["a"]), Bytes::new(), 0, 5)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(exec.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn max_attempts_ends_a_failing_batch() {
        let (engine, exec) = engine(false, Some(25));
        let result = engine
            .run_batch(CredentialSet::new(["a", "b"]), Bytes::new(), 10, 4)
            .await
            .unwrap();
        assert_eq!(result.success_count, 0);
        assert_eq!(result.attempt_count, 25);
        assert!(result.first_success_payload.is_none());
        assert_eq!(exec.calls.load(Ordering::SeqCst), 25);
    }
}
