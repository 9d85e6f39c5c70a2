//! Per-run resolution context: cancellation, deadline and git retry policy.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ResolveError;
use crate::registry::RegistryConfig;

/// Receiving side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Sending side of a cancellation signal.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

/// Create a linked canceller/token pair.
pub fn cancellation() -> (Canceller, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (Canceller { tx }, CancelToken { rx })
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once cancellation is signalled; pends forever if the
    /// canceller is dropped first.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Fixed-delay retry policy for git tag listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub attempts: u32,
    pub delay: Duration,
    /// Bound on each attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            attempts: config.git_retries.max(1),
            delay: config.git_retry_delay,
            attempt_timeout: config.git_timeout,
        }
    }
}

/// Shared by every resolution task of one run.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    cancel: CancelToken,
    deadline: Option<Instant>,
    retry: RetryPolicy,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(CancelToken::never(), RetryPolicy::default())
    }
}

impl ResolveContext {
    pub fn new(cancel: CancelToken, retry: RetryPolicy) -> Self {
        Self {
            cancel,
            deadline: None,
            retry,
        }
    }

    /// Abort the run once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fail fast if the run is already cancelled or past its deadline.
    pub fn check(&self) -> Result<(), ResolveError> {
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled("cancellation requested".to_string()));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ResolveError::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Run `fut` unless cancellation or the deadline fires first.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, ResolveError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(ResolveError::Cancelled("cancellation requested".to_string()))
            }
            _ = deadline_elapsed(self.deadline) => {
                Err(ResolveError::Cancelled("deadline exceeded".to_string()))
            }
            result = fut => result,
        }
    }

    /// Sleep for the retry delay, honouring cancellation.
    pub async fn pause(&self) -> Result<(), ResolveError> {
        let delay = self.retry.delay;
        self.guard(async move {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
