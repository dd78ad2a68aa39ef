use std::time::Duration;

// ============================================================================
// Exponential Backoff Retry Policy
// ============================================================================
//
// Bounds how many times a conflicting store transaction is re-run and how
// long to wait between attempts. The transaction runner in `store` drives the
// loop; this module only owns the policy and the delay arithmetic.
//
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// More attempts with shorter pauses, for hot documents such as the order counter
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// Fail fast
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            attempt: 0,
            delay: self.initial_delay,
            config: self.clone(),
        }
    }
}

/// Attempt counter plus the next delay to sleep, advanced once per failed attempt.
#[derive(Debug)]
pub struct Backoff {
    attempt: u32,
    delay: Duration,
    config: RetryConfig,
}

impl Backoff {
    /// Registers a new attempt and returns its 1-based number.
    pub fn start_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
    }

    /// Returns the delay to wait now and grows the next one.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.delay;
        let grown = Duration::from_millis(
            ((self.delay.as_millis() as f64) * self.config.multiplier) as u64,
        );
        self.delay = grown.min(self.config.max_delay);
        current
    }
}

/// Check if an error is transient (should retry) or permanent (should not retry)
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}
