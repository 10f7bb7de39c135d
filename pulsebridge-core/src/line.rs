//! Line identifiers and raw hardware values
//!
//! The hardware hands raw `u32` values to edge callbacks. They are converted
//! to these types at the bridge boundary so nothing past the mailbox ever
//! sees an unchecked line number or level.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::gpio::{
    EDGE_EITHER, EDGE_FALLING, EDGE_RISING, LEVEL_HIGH, LEVEL_LOW, LEVEL_TIMEOUT, MODE_INPUT,
    MODE_OUTPUT,
};
use crate::errors::{BridgeError, BridgeResult};

/// A validated GPIO line number
///
/// Only constructible through [`LineId::new`], which checks the number
/// against the configured upper bound, so a `LineId` always indexes a
/// registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LineId(u8);

impl LineId {
    /// Validate `raw` against `max_line`
    pub fn new(raw: u32, max_line: u8) -> BridgeResult<Self> {
        if raw > u32::from(max_line) {
            return Err(BridgeError::InvalidLine {
                line: raw,
                max: max_line,
            });
        }
        Ok(Self(raw as u8))
    }

    /// Line number as used by the hardware
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Registry slot index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit in a per-line mask
    pub(crate) const fn mask(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Line level reported with an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Line is low
    Low,
    /// Line is high
    High,
    /// Watchdog fired with no edge in its window
    Timeout,
}

impl Level {
    /// Decode the raw level passed to edge callbacks
    pub fn from_raw(raw: u32) -> BridgeResult<Self> {
        match raw {
            LEVEL_LOW => Ok(Level::Low),
            LEVEL_HIGH => Ok(Level::High),
            LEVEL_TIMEOUT => Ok(Level::Timeout),
            level => Err(BridgeError::InvalidLevel { level }),
        }
    }

    /// Raw encoding
    pub const fn raw(self) -> u32 {
        match self {
            Level::Low => LEVEL_LOW,
            Level::High => LEVEL_HIGH,
            Level::Timeout => LEVEL_TIMEOUT,
        }
    }
}

/// Transition condition for a raw edge callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Low to high
    Rising,
    /// High to low
    Falling,
    /// Any transition
    Either,
}

impl EdgeKind {
    /// Raw encoding
    pub const fn raw(self) -> u32 {
        match self {
            EdgeKind::Rising => EDGE_RISING,
            EdgeKind::Falling => EDGE_FALLING,
            EdgeKind::Either => EDGE_EITHER,
        }
    }

    /// Whether an edge ending at `level` satisfies this condition
    ///
    /// Watchdog timeouts are delivered to every callback regardless of the
    /// condition.
    pub const fn matches(self, level: Level) -> bool {
        match (self, level) {
            (_, Level::Timeout) => true,
            (EdgeKind::Either, _) => true,
            (EdgeKind::Rising, Level::High) => true,
            (EdgeKind::Falling, Level::Low) => true,
            _ => false,
        }
    }
}

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// High impedance input
    Input,
    /// Driven output
    Output,
}

impl Mode {
    /// Raw encoding
    pub const fn raw(self) -> u32 {
        match self {
            Mode::Input => MODE_INPUT,
            Mode::Output => MODE_OUTPUT,
        }
    }
}
