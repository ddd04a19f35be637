//! Bounded retry with exponential backoff.
//!
//! Used at exactly one place: re-localizing a drifted span, where the live
//! text is re-read on every attempt. Everything else in the linker treats a
//! failure as final.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Attempt count and backoff for [`retry_with_backoff`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub max_attempts: u32,
    /// Pause after the first failed attempt, in milliseconds
    pub initial_backoff_ms: u64,
    /// Factor applied to the pause after each further failure
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 10,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` attempts and the default backoff.
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Set the initial pause.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff_ms = backoff.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Set the backoff factor.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Pause before attempt `attempt + 1` (attempts are 1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_backoff_ms as f64 * factor).min(u64::MAX as f64);
        Duration::from_millis(millis as u64)
    }
}

/// Run `op` until it yields a value or the attempts run out.
///
/// `op` receives the 1-based attempt number. There is no pause after the last
/// attempt.
pub fn retry_with_backoff<T, F>(policy: &RetryPolicy, mut op: F) -> Option<T>
where
    F: FnMut(u32) -> Option<T>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(value) = op(attempt) {
            return Some(value);
        }
        if attempt < attempts {
            let pause = policy.backoff_after(attempt);
            log::debug!("Attempt {}/{} failed, retrying in {:?}", attempt, attempts, pause);
            thread::sleep(pause);
        }
    }
    None
}
