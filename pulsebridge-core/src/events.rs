//! Edge Events Carried Across the Bridge
//!
//! ## Overview
//!
//! An [`EdgeEvent`] is the only thing that crosses from a producer thread to
//! the consumer. It is a plain `Copy` value: line, level, tick. Nothing
//! borrowed, nothing allocated, so writing it into the mailbox slot is a
//! single store under the lock.
//!
//! ## Event Classes
//!
//! The hardware delivers two kinds of callback that are subscribed
//! independently:
//!
//! ```text
//! Isr   : edge-triggered callbacks on a chosen condition (rising/falling/either)
//! Alert : every level change on a line, plus watchdog timeouts
//! ```
//!
//! Each class has its own mailbox and registry, so a slow alert handler
//! never holds up ISR delivery bookkeeping and vice versa. No ordering is
//! defined between the two classes.

use core::fmt;

use serde::Serialize;

use crate::line::{Level, LineId};
use crate::time::Tick;

/// Which callback family an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum EventClass {
    /// Edge-triggered callbacks
    Isr = 0,
    /// Level-change alerts
    Alert = 1,
}

impl EventClass {
    /// Both classes, in dispatch preference order
    pub const ALL: [EventClass; 2] = [EventClass::Isr, EventClass::Alert];

    /// Array index for per-class tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            EventClass::Isr => "isr",
            EventClass::Alert => "alert",
        }
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One hardware edge, as published by a producer thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeEvent {
    /// Line that changed
    pub line: LineId,
    /// Level after the change
    pub level: Level,
    /// Hardware tick of the change
    pub tick: Tick,
}

impl EdgeEvent {
    /// Build an event
    pub const fn new(line: LineId, level: Level, tick: Tick) -> Self {
        Self { line, level, tick }
    }
}

impl fmt::Display for EdgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} @{}", self.line, self.level, self.tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_indices_are_distinct() {
        assert_eq!(EventClass::Isr.index(), 0);
        assert_eq!(EventClass::Alert.index(), 1);
        assert_eq!(EventClass::Alert.to_string(), "alert");
    }

    #[test]
    fn event_is_small() {
        assert!(core::mem::size_of::<EdgeEvent>() <= 8);
    }

    #[test]
    fn event_display() {
        let event = EdgeEvent::new(LineId::new(18, 31).unwrap(), Level::High, 1234);
        assert_eq!(event.to_string(), "GPIO18 High @1234");
    }
}
