//! Time-Related Constants
//!
//! Default timing for the consumer loop. Ticks themselves are plain
//! microseconds; see `crate::time`.

/// Upper bound for a single blocking wait inside `run` (milliseconds).
///
/// Keeps the loop responsive to its keepalive dropping to zero even when
/// no event arrives.
pub const DEFAULT_WAIT_SLICE_MS: u32 = 100;
