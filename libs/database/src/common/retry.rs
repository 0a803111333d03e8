use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for fallible async operations
///
/// `max_attempts` counts every invocation, including the first one. The delay
/// slept after the n-th failed attempt is
/// `initial_delay_ms * backoff_multiplier^(n-1)`, capped at `max_delay_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,

    /// Delay before the second attempt in milliseconds
    pub initial_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (typically 2.0)
    pub backoff_multiplier: f64,

    /// Whether to add jitter to prevent thundering herd
    pub use_jitter: bool,
}

impl RetryConfig {
    /// Create a new retry configuration with defaults
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - initial_delay_ms: 2000
    /// - max_delay_ms: 30000
    /// - backoff_multiplier: 2.0
    /// - use_jitter: false
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self) -> Self {
        self.use_jitter = true;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Backoff delay to sleep after `failed_attempt` (1-based) failed, before jitter.
    pub fn delay_after_attempt(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let scaled = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis((scaled as u64).min(self.max_delay_ms))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 2000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            use_jitter: false,
        }
    }
}

/// Load the retry policy from environment variables
///
/// - `RETRY_MAX_ATTEMPTS` (default: 3)
/// - `RETRY_INITIAL_DELAY_MS` (default: 2000)
/// - `RETRY_MAX_DELAY_MS` (default: 30000)
/// - `RETRY_BACKOFF_MULTIPLIER` (default: 2.0)
/// - `RETRY_JITTER` (default: false)
#[cfg(feature = "config")]
impl core_config::FromEnv for RetryConfig {
    fn from_env() -> Result<Self, core_config::ConfigError> {
        use core_config::env_parse_or;

        let defaults = Self::default();
        Ok(Self {
            max_attempts: env_parse_or("RETRY_MAX_ATTEMPTS", defaults.max_attempts)?,
            initial_delay_ms: env_parse_or("RETRY_INITIAL_DELAY_MS", defaults.initial_delay_ms)?,
            max_delay_ms: env_parse_or("RETRY_MAX_DELAY_MS", defaults.max_delay_ms)?,
            backoff_multiplier: env_parse_or(
                "RETRY_BACKOFF_MULTIPLIER",
                defaults.backoff_multiplier,
            )?,
            use_jitter: env_parse_or("RETRY_JITTER", defaults.use_jitter)?,
        })
    }
}

/// Retry an async operation, re-invoking it only for errors accepted by `should_retry`
///
/// `notify` runs after a retryable failure, right before the backoff sleep, with
/// the error, the 1-based number of the attempt that failed, and the delay about
/// to be slept. The sleep is a tokio timer, so the worker thread stays free
/// while waiting.
///
/// Resolves to the first success, or to the last error once attempts are
/// exhausted or a non-retryable error occurs.
pub async fn retry_notify<F, Fut, T, E, P, N>(
    mut operation: F,
    config: &RetryConfig,
    should_retry: P,
    mut notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    N: FnMut(&E, u32, Duration),
{
    let max_attempts = config.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !should_retry(&e) => {
                debug!(attempt, error = %e, "Operation failed with non-retryable error");
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                warn!(attempts = attempt, error = %e, "Operation failed, retries exhausted");
                return Err(e);
            }
            Err(e) => {
                let base = config.delay_after_attempt(attempt);
                let delay = if config.use_jitter {
                    apply_jitter(base)
                } else {
                    base
                };

                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                notify(&e, attempt, delay);

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retry an async operation for errors accepted by `should_retry`
///
/// # Example
/// ```ignore
/// use database::common::retry::{retry_when, RetryConfig};
///
/// let users = retry_when(
///     || repository.list(),
///     &RetryConfig::default(),
///     |e: &UserError| e.is_transient(),
/// )
/// .await?;
/// ```
pub async fn retry_when<F, Fut, T, E, P>(
    operation: F,
    config: &RetryConfig,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    retry_notify(operation, config, should_retry, |_, _, _| {}).await
}

/// Retry an async operation with exponential backoff, treating every error as transient
///
/// # Example
/// ```ignore
/// use database::common::retry::{retry_with_backoff, RetryConfig};
///
/// let config = RetryConfig::new().with_max_attempts(5).with_initial_delay(500);
///
/// let db = retry_with_backoff(|| database::postgres::connect(&db_url), config).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_when(operation, &config, |_| true).await
}

/// Simplified retry with default configuration
///
/// Makes up to 3 attempts with delays of 2s and 4s in between.
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

/// Apply jitter to a delay to prevent thundering herd
///
/// Uses a random value between 50% and 100% of the original delay
fn apply_jitter(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    // 0.5 to 1.0, seeded from a fresh RandomState
    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    Duration::from_millis((delay.as_millis() as f64 * random_factor) as u64)
}
