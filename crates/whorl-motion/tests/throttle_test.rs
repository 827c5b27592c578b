//! Emission throttling under a fast synthetic capture clock.

use std::time::{Duration, Instant};

use whorl_motion::throttle::{RateLimiter, MOTION_SPLAT_INTERVAL};

#[test]
fn test_ten_ms_ticks_emit_at_most_every_fifty_ms() {
    let start = Instant::now();
    let mut limiter = RateLimiter::default();

    let emitted: Vec<Duration> = (0..200)
        .map(|tick| Duration::from_millis(10 * tick))
        .filter(|&offset| limiter.try_acquire(start + offset))
        .collect();

    assert_eq!(emitted.first(), Some(&Duration::ZERO));
    for pair in emitted.windows(2) {
        assert!(pair[1] - pair[0] >= MOTION_SPLAT_INTERVAL, "emissions at {:?}", pair);
    }

    // 2 s of ticks gate down to one emission per 50 ms.
    assert_eq!(emitted.len(), 40);
}

#[test]
fn test_jittered_ticks_still_respect_the_interval() {
    let start = Instant::now();
    let mut limiter = RateLimiter::default();

    let mut offset = Duration::ZERO;
    let mut last = None;
    for step in [7, 13, 9, 11, 3, 17, 10, 10, 29, 1, 22, 8].iter().cycle().take(300) {
        offset += Duration::from_millis(*step);

        if limiter.try_acquire(start + offset) {
            if let Some(previous) = last {
                assert!(offset - previous >= MOTION_SPLAT_INTERVAL);
            }
            last = Some(offset);
        }
    }

    assert!(last.is_some());
}
