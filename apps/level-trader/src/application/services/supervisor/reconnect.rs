//! Reconnect pause with exponential backoff and jitter

use std::time::Duration;

use rand::Rng;

/// Pause between a teardown and the next connection attempt.
///
/// Uses the "Full Jitter" algorithm: each pause is uniform in
/// `[0, min(max, initial * multiplier^attempt))`. The number of attempts is
/// not bounded here; the supervisor's failure budget decides when to give up.
#[derive(Debug, Clone)]
pub struct ReconnectPause {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    attempt: u32,
}

impl ReconnectPause {
    /// Create with custom parameters.
    #[must_use]
    pub const fn with_params(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            attempt: 0,
        }
    }

    /// Next pause, growing with every call until [`Self::reset`].
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn next_pause(&mut self) -> Duration {
        let base_ms = self.initial.as_millis() as f64;
        let exponential =
            base_ms * self.multiplier.powi(i32::try_from(self.attempt).unwrap_or(i32::MAX));
        let capped = exponential.min(self.max.as_millis() as f64);
        self.attempt = self.attempt.saturating_add(1);

        if capped <= 0.0 || !capped.is_finite() {
            return Duration::ZERO;
        }
        let jitter = rand::rng().random_range(0.0..capped);
        Duration::from_millis(jitter as u64)
    }

    /// Reset after a successful connection.
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Pauses handed out since the last reset.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ReconnectPause {
    fn default() -> Self {
        Self::with_params(Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_pause_grows_within_cap() {
        let mut pause =
            ReconnectPause::with_params(Duration::from_millis(100), Duration::from_secs(10), 2.0);

        assert!(pause.next_pause() <= Duration::from_millis(100));
        assert!(pause.next_pause() <= Duration::from_millis(200));
        assert_eq!(pause.attempt(), 2);
    }

    #[test]
    fn reconnect_pause_max_cap() {
        let mut pause =
            ReconnectPause::with_params(Duration::from_secs(1), Duration::from_secs(5), 10.0);

        for _ in 0..8 {
            assert!(pause.next_pause() <= Duration::from_secs(5));
        }
    }

    #[test]
    fn reconnect_pause_zero_initial() {
        let mut pause = ReconnectPause::with_params(Duration::ZERO, Duration::from_secs(5), 2.0);
        assert_eq!(pause.next_pause(), Duration::ZERO);
        assert_eq!(pause.next_pause(), Duration::ZERO);
    }

    #[test]
    fn reconnect_pause_reset() {
        let mut pause = ReconnectPause::default();
        let _ = pause.next_pause();
        let _ = pause.next_pause();
        assert_eq!(pause.attempt(), 2);

        pause.reset();
        assert_eq!(pause.attempt(), 0);
    }
}
