//! Tick arithmetic and time sources
//!
//! Edge timestamps are hardware ticks: a free-running 32-bit microsecond
//! counter that wraps. Everything in this module treats ticks as modular
//! values:
//! - `tick_diff` for the width between two edges
//! - `TickSource` for anything that can read the current tick
//! - `MonotonicTicks` backed by the host clock
//! - `FixedTicks` for tests and simulations
//!
//! Configuration durations use `fugit` types; `to_std` converts them for
//! the blocking calls that need `std::time::Duration`.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fugit::MillisDurationU32;

/// Hardware tick in microseconds (wrapping)
pub type Tick = u32;

/// Microseconds elapsed from `earlier` to `later`, across wraparound
///
/// ```rust
/// use pulsebridge_core::time::tick_diff;
///
/// assert_eq!(tick_diff(150, 100), 50);
/// assert_eq!(tick_diff(20, u32::MAX - 9), 30);
/// ```
#[inline]
pub const fn tick_diff(later: Tick, earlier: Tick) -> u32 {
    later.wrapping_sub(earlier)
}

/// Source of the current hardware tick
pub trait TickSource {
    /// Current tick
    fn now(&self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for Arc<T> {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Tick source backed by the host's monotonic clock
///
/// Starts at `offset` when created and advances one tick per microsecond.
#[derive(Debug, Clone)]
pub struct MonotonicTicks {
    started: Instant,
    offset: Tick,
}

impl MonotonicTicks {
    /// Start counting from zero
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Start counting from `offset`
    ///
    /// Useful to exercise wraparound without waiting an hour.
    pub fn with_offset(offset: Tick) -> Self {
        Self {
            started: Instant::now(),
            offset,
        }
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicTicks {
    fn now(&self) -> Tick {
        // Truncation is the wrap.
        let elapsed = self.started.elapsed().as_micros() as u32;
        self.offset.wrapping_add(elapsed)
    }
}

/// Manually driven tick source
///
/// Shared by reference between a test and the code under test.
#[derive(Debug, Default)]
pub struct FixedTicks {
    tick: AtomicU32,
}

impl FixedTicks {
    /// Start at `tick`
    pub const fn new(tick: Tick) -> Self {
        Self {
            tick: AtomicU32::new(tick),
        }
    }

    /// Jump to `tick`
    pub fn set(&self, tick: Tick) {
        self.tick.store(tick, Ordering::Relaxed);
    }

    /// Move forward by `us` microseconds, wrapping
    pub fn advance(&self, us: u32) -> Tick {
        self.tick.fetch_add(us, Ordering::Relaxed).wrapping_add(us)
    }
}

impl TickSource for FixedTicks {
    fn now(&self) -> Tick {
        self.tick.load(Ordering::Relaxed)
    }
}

/// Convert a millisecond duration for blocking std calls
pub fn to_std(duration: MillisDurationU32) -> Duration {
    Duration::from_millis(u64::from(duration.to_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_wraps() {
        assert_eq!(tick_diff(10, 5), 5);
        assert_eq!(tick_diff(0, u32::MAX), 1);
        assert_eq!(tick_diff(5, 10), u32::MAX - 4);
    }

    #[test]
    fn fixed_ticks_advance_and_wrap() {
        let ticks = FixedTicks::new(u32::MAX - 1);
        assert_eq!(ticks.advance(3), 1);
        assert_eq!(ticks.now(), 1);

        ticks.set(1000);
        assert_eq!(ticks.now(), 1000);
    }

    #[test]
    fn monotonic_ticks_move_forward() {
        let ticks = MonotonicTicks::with_offset(u32::MAX - 5);
        let first = ticks.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(tick_diff(ticks.now(), first) >= 1000);
    }

    #[test]
    fn fugit_conversion() {
        assert_eq!(to_std(MillisDurationU32::millis(18)), Duration::from_millis(18));
    }
}
