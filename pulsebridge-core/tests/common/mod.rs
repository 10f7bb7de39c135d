//! Shared helpers for bridge integration tests
//!
//! - Recording handlers that capture `(line, level, tick)` on the consumer
//! - Loop pumping with a deadline, so a broken bridge fails instead of hanging
//! - Line construction shorthand

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pulsebridge_core::{EventLoop, Handler, Level, LineId};

/// Upper bound for any single wait in these tests
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Captured handler invocation
pub type Seen = (u8, Level, u32);

/// Handler plus the log it appends to
pub struct Recorder {
    log: Rc<RefCell<Vec<Seen>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A handler that appends to this recorder
    pub fn handler(&self) -> Handler {
        let log = Rc::clone(&self.log);
        Box::new(move |line, level, tick| log.borrow_mut().push((line.get(), level, tick)))
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.log.borrow().clone()
    }
}

/// Line on the default 0..=31 bank
pub fn line(raw: u32) -> LineId {
    LineId::new(raw, 31).expect("test line in range")
}

/// Dispatch until `done` holds or the deadline passes
///
/// Returns whether `done` became true.
pub fn pump_until(event_loop: &mut EventLoop, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TEST_DEADLINE;
    while !done() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        event_loop
            .run_once(Some(remaining.min(Duration::from_millis(50))))
            .expect("dispatch failed");
    }
    true
}
