//! Resilient invocation of the generation service
//!
//! [`ResilientInvoker`] wraps a single logical request with a per-attempt
//! timeout, a bounded number of attempts and a deterministic backoff between
//! them. It knows nothing about prompt content: the request is an opaque
//! [`LlmInvocation`] and the answer is the raw response text.
//!
//! Every attempt is reported to an [`AttemptObserver`] so logging and tests
//! can see the retry loop without changing it.

use pageforge_config::{BackoffKind, RetrySettings};
use pageforge_llm::{LlmBackend, LlmError, LlmInvocation};
use pageforge_utils::error::ForgeError;
use pageforge_utils::logging::truncate_for_log;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Delay schedule between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `2^attempt + attempt * 0.5` seconds, where `attempt` is the 1-based
    /// number of the attempt that just failed.
    Exponential,
    /// The same delay after every failure.
    Fixed(Duration),
    /// Retry immediately.
    None,
}

impl Backoff {
    /// Delay to wait after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential => {
                let a = f64::from(attempt);
                Duration::try_from_secs_f64(2f64.powf(a) + a * 0.5).unwrap_or(Duration::MAX)
            }
            Self::Fixed(delay) => *delay,
            Self::None => Duration::ZERO,
        }
    }
}

impl From<BackoffKind> for Backoff {
    fn from(kind: BackoffKind) -> Self {
        match kind {
            BackoffKind::Exponential => Self::Exponential,
            BackoffKind::None => Self::None,
        }
    }
}

/// Retry policy injected into the invoker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A policy with at least one attempt.
    #[must_use]
    pub fn new(max_attempts: u32, timeout: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout,
            backoff,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            settings.timeout,
            settings.backoff.into(),
        )
    }

    /// Policy that retries without sleeping, for deterministic tests.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::from_secs(5), Backoff::None)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Success(String),
    Failure(LlmError),
}

/// Transient record of one call to the generation service.
#[derive(Debug, Clone)]
pub struct InvocationAttempt {
    pub operation: String,
    /// 1-based attempt number
    pub attempt: u32,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

impl InvocationAttempt {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success(_))
    }
}

/// Sees every attempt and every backoff of the retry loop.
pub trait AttemptObserver: Send + Sync {
    fn on_attempt(&self, attempt: &InvocationAttempt);

    /// Called once before each retry with the delay about to be waited.
    fn on_backoff(&self, operation: &str, attempt: u32, delay: Duration);
}

/// Default observer: attempts become `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn on_attempt(&self, attempt: &InvocationAttempt) {
        match &attempt.outcome {
            AttemptOutcome::Success(text) => debug!(
                operation = %attempt.operation,
                attempt = attempt.attempt,
                elapsed_ms = attempt.elapsed.as_millis() as u64,
                response_chars = text.chars().count(),
                "Invocation succeeded"
            ),
            AttemptOutcome::Failure(err) => warn!(
                operation = %attempt.operation,
                attempt = attempt.attempt,
                elapsed_ms = attempt.elapsed.as_millis() as u64,
                error = %truncate_for_log(&err.to_string(), 256),
                "Invocation attempt failed"
            ),
        }
    }

    fn on_backoff(&self, operation: &str, attempt: u32, delay: Duration) {
        debug!(
            operation = %operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Backing off before retry"
        );
    }
}

/// Observer that keeps everything it sees.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    attempts: Arc<Mutex<Vec<InvocationAttempt>>>,
    backoffs: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attempts(&self) -> Vec<InvocationAttempt> {
        lock(&self.attempts).clone()
    }

    /// Delays announced before each retry, in order.
    #[must_use]
    pub fn backoffs(&self) -> Vec<Duration> {
        lock(&self.backoffs).clone()
    }
}

impl AttemptObserver for RecordingObserver {
    fn on_attempt(&self, attempt: &InvocationAttempt) {
        lock(&self.attempts).push(attempt.clone());
    }

    fn on_backoff(&self, _operation: &str, _attempt: u32, delay: Duration) {
        lock(&self.backoffs).push(delay);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Timeout, retry and backoff around one backend.
#[derive(Clone)]
pub struct ResilientInvoker {
    backend: Arc<dyn LlmBackend>,
    observer: Arc<dyn AttemptObserver>,
}

impl ResilientInvoker {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self::with_observer(backend, Arc::new(TracingObserver))
    }

    #[must_use]
    pub fn with_observer(backend: Arc<dyn LlmBackend>, observer: Arc<dyn AttemptObserver>) -> Self {
        Self { backend, observer }
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Run `invocation` until it succeeds or the policy's attempts are spent.
    ///
    /// Each attempt is bounded by `policy.timeout`; the invocation's own
    /// timeout is overwritten so backends see the same bound.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::ExhaustedRetries` carrying `operation` and the
    /// last attempt's error after `policy.max_attempts()` consecutive failures.
    pub async fn invoke(
        &self,
        mut invocation: LlmInvocation,
        operation: &str,
        policy: &RetryPolicy,
    ) -> Result<String, ForgeError> {
        invocation.timeout = policy.timeout;
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let result =
                match tokio::time::timeout(policy.timeout, self.backend.invoke(invocation.clone()))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::Timeout {
                        duration: policy.timeout,
                    }),
                };

            let outcome = match result {
                Ok(response) => AttemptOutcome::Success(response.raw_response),
                Err(err) => AttemptOutcome::Failure(err),
            };
            let record = InvocationAttempt {
                operation: operation.to_string(),
                attempt,
                elapsed: started.elapsed(),
                outcome,
            };
            self.observer.on_attempt(&record);

            let last_error = match record.outcome {
                AttemptOutcome::Success(text) => return Ok(text),
                AttemptOutcome::Failure(err) => err,
            };

            if attempt >= max_attempts {
                return Err(ForgeError::ExhaustedRetries {
                    operation: operation.to_string(),
                    attempts: max_attempts,
                    last_error,
                });
            }

            let delay = policy.backoff.delay(attempt);
            self.observer.on_backoff(operation, attempt, delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}
