//! Event Dispatch Loop
//!
//! ## Overview
//!
//! The [`EventLoop`] is the consumer side of the bridge. It owns both
//! callback registries and runs on exactly one thread; it is neither `Send`
//! nor `Sync`, since registered handlers are plain `FnMut` closures that may
//! capture `Rc`/`RefCell` state.
//!
//! ## Dispatch
//!
//! ```text
//! wake token (class, line)
//!     │
//!     ▼
//! peek class mailbox ── empty ──▶ Spurious (no-op)
//!     │ event
//!     ▼
//! registry[class].lookup(event.line)
//!     │ Some(handler)            │ None
//!     ▼                          ▼
//! handler(line, level, tick)   NoHandler
//!     │                          │
//!     └───────── release ◀───────┘
//! ```
//!
//! The mailbox is released only after the handler returns, so the producer
//! of the next event stays blocked for the whole handler run. Handlers have
//! no access to the loop or the mailbox; they cannot re-enter dispatch.
//!
//! ## Loop Lifetime
//!
//! Each channel holding a handler keeps the loop alive. [`EventLoop::run`]
//! returns once no handler is installed and no wake is pending.

use core::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bridge::{EdgePublisher, Shared};
use crate::constants::gpio::MAX_ADDRESSABLE_LINE;
use crate::constants::time::DEFAULT_WAIT_SLICE_MS;
use crate::errors::{BridgeError, BridgeResult};
use crate::events::{EdgeEvent, EventClass};
use crate::gpio::{CallbackId, GpioClient};
use crate::line::EdgeKind;
use crate::registry::CallbackRegistry;
use crate::wake::{Handler, WakeToken};

/// What a single dispatch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler for the event's line ran
    Delivered(EdgeEvent),
    /// The event was consumed but its line has no handler
    NoHandler(EdgeEvent),
    /// The mailbox was empty
    Spurious,
}

impl DispatchOutcome {
    /// Event consumed by this dispatch, if any
    pub fn event(&self) -> Option<EdgeEvent> {
        match self {
            DispatchOutcome::Delivered(event) | DispatchOutcome::NoHandler(event) => Some(*event),
            DispatchOutcome::Spurious => None,
        }
    }

    /// Whether a handler ran
    pub fn delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered(_))
    }
}

/// Single-threaded consumer of a [`Bridge`](crate::Bridge)
pub struct EventLoop {
    shared: Arc<Shared>,
    registries: [CallbackRegistry; 2],
}

impl EventLoop {
    pub(crate) fn new(shared: Arc<Shared>) -> BridgeResult<Self> {
        let max_line = shared.config.max_line;
        if max_line > MAX_ADDRESSABLE_LINE {
            return Err(BridgeError::InvalidConfig {
                reason: "max_line exceeds addressable range",
            });
        }
        let registries = [
            CallbackRegistry::new(EventClass::Isr, &shared.signal, max_line)?,
            CallbackRegistry::new(EventClass::Alert, &shared.signal, max_line)?,
        ];
        Ok(Self { shared, registries })
    }

    /// Producer handle for the bridge this loop consumes
    pub fn publisher(&self) -> EdgePublisher {
        EdgePublisher::from_shared(Arc::clone(&self.shared))
    }

    /// Registry for `class`
    pub fn registry(&self, class: EventClass) -> &CallbackRegistry {
        &self.registries[class.index()]
    }

    fn registry_mut(&mut self, class: EventClass) -> &mut CallbackRegistry {
        &mut self.registries[class.index()]
    }

    /// Install or clear the handler for `line` in `class`
    ///
    /// Returns the previously installed handler.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidLine`] if `line` is out of range.
    pub fn register(
        &mut self,
        class: EventClass,
        line: u32,
        handler: Option<Handler>,
    ) -> BridgeResult<Option<Handler>> {
        self.registry_mut(class).register(line, handler)
    }

    /// [`register`](Self::register) in the ISR class
    pub fn register_isr(&mut self, line: u32, handler: Option<Handler>) -> BridgeResult<Option<Handler>> {
        self.register(EventClass::Isr, line, handler)
    }

    /// [`register`](Self::register) in the alert class
    pub fn register_alert(&mut self, line: u32, handler: Option<Handler>) -> BridgeResult<Option<Handler>> {
        self.register(EventClass::Alert, line, handler)
    }

    /// Clear the handler for `line` in `class`
    pub fn unregister(&mut self, class: EventClass, line: u32) -> BridgeResult<Option<Handler>> {
        self.register(class, line, None)
    }

    /// Register `handler` and route the client's raw callbacks for `line`
    /// into this loop
    ///
    /// The alert class always subscribes to every transition; `edge` applies
    /// to the ISR class only. A previous raw subscription on the same channel
    /// is cancelled. If the client rejects the registration, the previous
    /// handler is restored.
    pub fn subscribe<G: GpioClient + ?Sized>(
        &mut self,
        gpio: &G,
        class: EventClass,
        line: u32,
        edge: EdgeKind,
        handler: Handler,
    ) -> BridgeResult<CallbackId> {
        let line_id = self.registry(class).line(line)?;
        let edge = match class {
            EventClass::Isr => edge,
            EventClass::Alert => EdgeKind::Either,
        };

        let previous = self.register(class, line, Some(handler))?;
        let callback = self.publisher().raw_callback(class);
        let id = match gpio.register_raw_edge_callback(line_id, edge, callback) {
            Ok(id) => id,
            Err(err) => {
                self.register(class, line, previous)?;
                return Err(err.into());
            }
        };

        let replaced = self
            .registry_mut(class)
            .channel_mut(line_id)?
            .set_raw_callback(Some(id));
        if let Some(old) = replaced {
            if let Err(err) = gpio.cancel_raw_edge_callback(old) {
                log_warn!("failed to cancel {} on {}: {}", old, line_id, err);
            }
        }
        log_debug!("subscribed {} {} {:?} as {}", class, line_id, edge, id);
        Ok(id)
    }

    /// Cancel the raw callback for `line` and remove its handler
    ///
    /// Once this returns the handler is never invoked again. An event that was
    /// already in flight is still consumed and reported as
    /// [`DispatchOutcome::NoHandler`].
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidLine`], or [`BridgeError::Gpio`] if the client
    /// failed to cancel. The handler is removed in both cases.
    pub fn unsubscribe<G: GpioClient + ?Sized>(
        &mut self,
        gpio: &G,
        class: EventClass,
        line: u32,
    ) -> BridgeResult<Option<Handler>> {
        let line_id = self.registry(class).line(line)?;
        let raw = self
            .registry_mut(class)
            .channel_mut(line_id)?
            .set_raw_callback(None);
        let cancelled = match raw {
            Some(id) => gpio.cancel_raw_edge_callback(id),
            None => Ok(()),
        };
        let previous = self.unregister(class, line)?;
        log_debug!("unsubscribed {} {}", class, line_id);
        cancelled?;
        Ok(previous)
    }

    /// Consume the in-flight event of `token.class` and run its handler
    ///
    /// # Errors
    ///
    /// [`BridgeError::MailboxProtocolViolation`] if the slot was emptied
    /// behind the loop's back.
    pub fn dispatch(&mut self, token: WakeToken) -> BridgeResult<DispatchOutcome> {
        let Some(event) = self.shared.mailbox(token.class).peek() else {
            log_trace!("spurious wake {}", token);
            return Ok(DispatchOutcome::Spurious);
        };

        let outcome = match self.registry_mut(token.class).lookup(event.line) {
            Some(handler) => {
                handler(event.line, event.level, event.tick);
                DispatchOutcome::Delivered(event)
            }
            None => DispatchOutcome::NoHandler(event),
        };
        self.shared.mailbox(token.class).release()?;

        log_trace!("dispatched {} {} ({})", token.class, event, outcome.delivered());
        Ok(outcome)
    }

    /// Block for the next wake token
    ///
    /// `None` waits indefinitely.
    pub fn next_wake(&self, timeout: Option<Duration>) -> Option<WakeToken> {
        self.shared.signal.wait(timeout)
    }

    /// Wait up to `timeout` for a wake, then dispatch everything pending
    ///
    /// Returns the number of events consumed.
    pub fn run_once(&mut self, timeout: Option<Duration>) -> BridgeResult<usize> {
        let Some(first) = self.next_wake(timeout) else {
            return Ok(0);
        };
        let mut consumed = usize::from(self.dispatch(first)?.event().is_some());
        consumed += self.drain()?;
        Ok(consumed)
    }

    /// Dispatch every pending wake without blocking
    pub fn drain(&mut self) -> BridgeResult<usize> {
        let mut consumed = 0;
        while let Some(token) = self.shared.signal.try_take() {
            if self.dispatch(token)?.event().is_some() {
                consumed += 1;
            }
        }
        Ok(consumed)
    }

    /// Dispatch until `duration` has elapsed
    pub fn run_for(&mut self, duration: Duration) -> BridgeResult<usize> {
        let deadline = Instant::now() + duration;
        let mut consumed = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(consumed);
            }
            consumed += self.run_once(Some(remaining))?;
        }
    }

    /// Dispatch until the loop is no longer alive
    pub fn run(&mut self) -> BridgeResult<usize> {
        let slice = Duration::from_millis(u64::from(DEFAULT_WAIT_SLICE_MS));
        let mut consumed = 0;
        while self.is_alive() {
            consumed += self.run_once(Some(slice))?;
        }
        Ok(consumed)
    }

    /// Whether any handler is installed or any wake is pending
    pub fn is_alive(&self) -> bool {
        self.keepalive_count() > 0 || self.shared.signal.has_pending()
    }

    /// Number of channels holding a handler, across both classes
    pub fn keepalive_count(&self) -> usize {
        self.shared.signal.keepalive_count()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.shared.close();
        log_debug!("event loop detached; mailboxes closed");
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("max_line", &self.shared.config.max_line)
            .field("isr_active", &self.registry(EventClass::Isr).active_count())
            .field("alert_active", &self.registry(EventClass::Alert).active_count())
            .finish()
    }
}
