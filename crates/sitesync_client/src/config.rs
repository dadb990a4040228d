//! Configuration for the sync client.

use std::time::Duration;

/// Configuration for a [`crate::SyncClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Build being edited.
    pub build_id: String,
    /// Project owning the build.
    pub project_id: String,
    /// Server base URL.
    pub endpoint: String,
    /// Maximum transactions per flush.
    pub batch_limit: usize,
    /// Retry configuration.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Creates a configuration for one build.
    pub fn new(
        build_id: impl Into<String>,
        project_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            build_id: build_id.into(),
            project_id: project_id.into(),
            endpoint: endpoint.into(),
            batch_limit: 128,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the maximum transactions per flush.
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Backoff policy for [`crate::SyncClient::flush_with_retry`].
///
/// Delays grow geometrically from `initial_delay` up to `max_delay`,
/// with optional jitter of up to 25% so clients recovering from the
/// same outage do not flush in lockstep.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per flush, counting the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Cap applied to every computed delay.
    pub max_delay: Duration,
    /// Geometric growth factor between attempts.
    pub backoff_multiplier: f64,
    /// Whether delays carry jitter.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// A single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the delay before the second attempt.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the geometric growth factor.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Disables jitter, making delays deterministic.
    pub fn without_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Returns the delay to sleep before attempt `attempt` (0-indexed;
    /// the first attempt never waits).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = attempt.saturating_sub(1) as i32;
        let mut delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        delay = delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            delay += delay * 0.25 * jitter_fraction();
        }
        Duration::from_secs_f64(delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Clock-derived fraction in `[0, 1)`; spreads retries without an RNG
/// dependency.
fn jitter_fraction() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1024) / 1024.0
}
