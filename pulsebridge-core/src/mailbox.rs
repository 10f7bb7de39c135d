//! Single-Slot Edge Event Mailbox
//!
//! ## Overview
//!
//! The mailbox carries exactly one in-flight [`EdgeEvent`] per event class
//! from a producer thread to the consumer. It is a binary semaphore with a
//! payload:
//!
//! ```text
//!            publish()                         dispatch
//!  Empty ──────────────────▶ Occupied(event) ─────────────▶ Empty
//!    ▲   wait while occupied      │ peek → handler → release   │
//!    └────────────────────────────┴────────────────────────────┘
//! ```
//!
//! ## Backpressure
//!
//! A publisher returns as soon as its event is in the slot, but the slot is
//! not released until the consumer has run the handler. The next publisher
//! blocks in [`publish`](EdgeEventMailbox::publish) until then, which stalls
//! the hardware callback thread it runs on. Memory is bounded to one event,
//! the consumer never sees a torn or overwritten event, and delivery order
//! equals publish-completion order.
//!
//! ## Cross-Thread Release
//!
//! The lock is acquired on a producer thread and released on the consumer
//! thread. A `MutexGuard` cannot move between threads, so occupancy is a
//! state behind a short-lived lock with a condition variable for waiting
//! publishers.
//!
//! ## Shutdown
//!
//! [`close`](EdgeEventMailbox::close) wakes every blocked publisher with
//! [`BridgeError::Closed`]. The event loop closes its mailboxes when it is
//! dropped so producer threads never hang on a consumer that is gone.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::errors::{BridgeError, BridgeResult};
use crate::events::{EdgeEvent, EventClass};
use crate::wake::{LoopSignal, WakeToken};

#[derive(Debug, Default)]
struct Slot {
    event: Option<EdgeEvent>,
    closed: bool,
}

/// Mailbox traffic counters
///
/// Relaxed atomics; for monitoring only.
#[derive(Debug, Default)]
pub struct MailboxStats {
    /// Events written into the slot
    pub published: AtomicU32,
    /// Events released by the consumer
    pub released: AtomicU32,
    /// Publishes that had to wait for the slot
    pub contended: AtomicU32,
}

impl MailboxStats {
    /// Published minus released: 0 or 1 while the protocol holds
    pub fn in_flight(&self) -> u32 {
        self.published
            .load(Ordering::Relaxed)
            .wrapping_sub(self.released.load(Ordering::Relaxed))
    }
}

/// One-event mailbox for a single event class
#[derive(Debug)]
pub struct EdgeEventMailbox {
    class: EventClass,
    slot: Mutex<Slot>,
    released: Condvar,
    signal: Arc<LoopSignal>,
    stats: MailboxStats,
}

impl EdgeEventMailbox {
    /// Empty mailbox for `class`, waking the consumer through `signal`
    pub fn new(class: EventClass, signal: Arc<LoopSignal>) -> Self {
        Self {
            class,
            slot: Mutex::new(Slot::default()),
            released: Condvar::new(),
            signal,
            stats: MailboxStats::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Event class served by this mailbox
    pub fn class(&self) -> EventClass {
        self.class
    }

    /// Write `event` and wake the consumer. Callable from any thread.
    ///
    /// Blocks while a previous event is still being dispatched. Returns with
    /// the slot still occupied; only the consumer frees it.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Closed`] if the mailbox is closed before or while
    /// waiting.
    pub fn publish(&self, event: EdgeEvent) -> BridgeResult<()> {
        let mut slot = self.lock();
        if slot.event.is_some() && !slot.closed {
            self.stats.contended.fetch_add(1, Ordering::Relaxed);
        }
        while slot.event.is_some() && !slot.closed {
            slot = self
                .released
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if slot.closed {
            return Err(BridgeError::Closed);
        }
        slot.event = Some(event);
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        drop(slot);

        self.signal.wake(WakeToken::new(self.class, event.line));
        Ok(())
    }

    /// Current in-flight event, leaving the slot occupied
    pub fn peek(&self) -> Option<EdgeEvent> {
        self.lock().event
    }

    /// Free the slot so the next publisher can proceed
    ///
    /// # Errors
    ///
    /// [`BridgeError::MailboxProtocolViolation`] if the slot is already
    /// empty (double release, or release without publish).
    pub fn release(&self) -> BridgeResult<()> {
        self.consume_and_release().map(|_| ())
    }

    /// Take the in-flight event and free the slot in one step
    ///
    /// # Errors
    ///
    /// [`BridgeError::MailboxProtocolViolation`] if nothing was published.
    pub fn consume_and_release(&self) -> BridgeResult<EdgeEvent> {
        let mut slot = self.lock();
        let event = slot.event.take().ok_or(BridgeError::MailboxProtocolViolation {
            reason: "release without a published event",
        })?;
        self.stats.released.fetch_add(1, Ordering::Relaxed);
        drop(slot);

        self.released.notify_one();
        Ok(event)
    }

    /// Refuse further events and wake all blocked publishers
    ///
    /// An event already in the slot stays readable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.released.notify_all();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Traffic counters
    pub fn stats(&self) -> &MailboxStats {
        &self.stats
    }
}
