use std::time::{Duration, Instant};

/// Minimum spacing between two splats emitted from detected motion.
pub const MOTION_SPLAT_INTERVAL: Duration = Duration::from_millis(50);

/// Lets at most one event through per interval of monotonic time.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MOTION_SPLAT_INTERVAL)
    }
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether an event may fire at `now`. Records `now` as the last emission if so.
    ///
    /// The first call always succeeds. A clock that steps backwards never opens the gate early.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };

        if ready {
            self.last = Some(now);
        }

        ready
    }

    /// Forgets the last emission.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
