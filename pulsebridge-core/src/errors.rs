//! Error Types for the Edge Event Bridge
//!
//! ## Design Philosophy
//!
//! Bridge errors are returned from producer threads (inside raw edge
//! callbacks) and from the consumer loop, so they follow the same rules:
//!
//! 1. **Small Size**: Every variant is a few bytes of inline data.
//!
//! 2. **No Heap Allocation**: Messages are `&'static str` only.
//!
//! 3. **Copy Semantics**: Errors can be logged on one path and returned on
//!    another without cloning.
//!
//! ## Error Categories
//!
//! ### Precondition Violations
//! - `InvalidLine`: A line number outside the configured range
//! - `InvalidLevel`: A raw level value the hardware cannot report
//! - `InvalidConfig`: A configuration rejected at bridge construction
//!
//! ### Invariant Breaches
//! - `MailboxProtocolViolation`: A release without a matching publish.
//!   Unreachable through the public dispatch path; fatal if it occurs.
//!
//! ### Lifecycle
//! - `ConsumerAlreadyAttached`: A second event loop was requested
//! - `Closed`: The consumer is gone and the mailbox refuses new events
//!
//! ### External
//! - `Gpio`: The GPIO client reported a failure
//!
//! Sensor-level failures (bad checksum, out-of-range values, timeouts) are
//! not errors at this layer. They are reported as reading status values by
//! the sensor crates.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use pulsebridge_core::{Bridge, BridgeError};
//!
//! let bridge = Bridge::with_defaults();
//! let mut event_loop = bridge.event_loop()?;
//!
//! match event_loop.register_isr(40, None) {
//!     Err(BridgeError::InvalidLine { line, max }) => {
//!         assert_eq!((line, max), (40, 31));
//!     }
//!     other => panic!("unexpected: {:?}", other.map(|h| h.is_some())),
//! }
//! # Ok::<(), BridgeError>(())
//! ```

use thiserror_no_std::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure reported by the external GPIO client
///
/// Mirrors the daemon convention of a negative status code plus the name of
/// the call that produced it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("gpio error {code} in {call}")]
pub struct GpioError {
    /// Negative status code returned by the client
    pub code: i32,
    /// Name of the failing call
    pub call: &'static str,
}

impl GpioError {
    /// Create an error for `call` with status `code`
    pub const fn new(code: i32, call: &'static str) -> Self {
        Self { code, call }
    }
}

/// Bridge errors - kept small and `Copy`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// Line number outside the valid range
    #[error("line {line} outside valid range [0, {max}]")]
    InvalidLine {
        /// The rejected line number
        line: u32,
        /// Highest valid line number
        max: u8,
    },

    /// Raw level value outside low/high/timeout
    #[error("invalid level {level}")]
    InvalidLevel {
        /// The rejected raw level
        level: u32,
    },

    /// Internal mailbox invariant broken (release without publish)
    #[error("mailbox protocol violation: {reason}")]
    MailboxProtocolViolation {
        /// Which invariant was broken
        reason: &'static str,
    },

    /// An event loop is already attached to this bridge
    #[error("an event loop is already attached to this bridge")]
    ConsumerAlreadyAttached,

    /// The consumer has shut down and no longer accepts events
    #[error("bridge closed")]
    Closed,

    /// Configuration rejected at construction time
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which constraint failed
        reason: &'static str,
    },

    /// External GPIO client failure
    #[error("{0}")]
    Gpio(#[from] GpioError),
}

/// Configuration loading errors
///
/// Separate from [`BridgeError`] because parse and I/O failures carry
/// owned messages.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config: {0}")]
    Io(String),

    /// The configuration text is not valid JSON for the target type
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The configuration parsed but violates a constraint
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}
