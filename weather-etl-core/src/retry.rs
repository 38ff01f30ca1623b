use std::{future::Future, time::Duration};

use backon::{ConstantBuilder, Retryable};
use tracing::warn;

use crate::{config::RetryConfig, error::PipelineError};

/// How often and how patiently a failed task is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: usize,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            retries: cfg.retries,
            retry_delay: Duration::from_secs(cfg.retry_delay_secs),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.retry_delay)
            .with_max_times(self.retries)
    }

    /// Run `task`, retrying every failure until the policy is exhausted.
    pub async fn run<T, F, Fut>(&self, task_id: &str, task: F) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        task.retry(self.backoff())
            .notify(|err: &PipelineError, delay: Duration| {
                warn!(task_id, error = %err, ?delay, "Task failed, retrying");
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn default_policy_is_two_retries_two_minutes_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.retry_delay, Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicUsize::new(0);
        let started = tokio::time::Instant::now();

        let out = RetryPolicy::default()
            .run("flaky", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(PipelineError::EmptyDescription) } else { Ok(n) } }
            })
            .await
            .unwrap();

        assert_eq!(out, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(240));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_retries_are_exhausted() {
        let attempts = AtomicUsize::new(0);

        let err = RetryPolicy::default()
            .run("broken", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(PipelineError::EmptyDescription) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::EmptyDescription));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_runs_once() {
        let attempts = AtomicUsize::new(0);
        let policy = RetryPolicy { retries: 0, retry_delay: Duration::ZERO };

        let _ = policy
            .run("once", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(PipelineError::EmptyDescription) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
