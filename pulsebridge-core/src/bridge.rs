//! Bridge: Producer Handles and Consumer Attachment
//!
//! ## Overview
//!
//! A [`Bridge`] owns the state that producer threads can reach: one mailbox
//! per event class and the wake signal they share. It hands out two kinds of
//! access:
//!
//! ```text
//!                  ┌──────────────── Bridge ────────────────┐
//! EdgePublisher ──▶│ Isr mailbox ─┐                         │
//!  (any thread,    │              ├─▶ LoopSignal ──▶ EventLoop (one thread,
//!   cloneable)  ──▶│ Alert mailbox┘                         │   owns registries)
//!                  └────────────────────────────────────────┘
//! ```
//!
//! - [`EdgePublisher`]: `Send + Sync + Clone`, used from raw edge callbacks
//! - [`EventLoop`]: the single consumer, attached once per bridge
//!
//! The registries are not part of the shared state. They live in the event
//! loop, so handlers never cross threads and need not be `Send`.
//!
//! ## Global Bridge
//!
//! Raw callbacks registered with a C-style daemon have no user data pointer
//! to carry a bridge around. [`struct@GLOBAL_BRIDGE`] is a lazily created
//! process-wide bridge with the default configuration for that case.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::config::BridgeConfig;
use crate::dispatch::EventLoop;
use crate::errors::{BridgeError, BridgeResult};
use crate::events::{EdgeEvent, EventClass};
use crate::gpio::RawEdgeCallback;
use crate::line::{Level, LineId};
use crate::mailbox::EdgeEventMailbox;
use crate::time::Tick;
use crate::wake::LoopSignal;

lazy_static! {
    /// Process-wide bridge with the default configuration
    pub static ref GLOBAL_BRIDGE: Bridge = Bridge::with_defaults();
}

/// State reachable from producer threads
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: BridgeConfig,
    pub(crate) signal: Arc<LoopSignal>,
    mailboxes: [EdgeEventMailbox; 2],
    consumer_attached: AtomicBool,
}

impl Shared {
    fn new(config: BridgeConfig) -> Self {
        let signal = Arc::new(LoopSignal::new(config.max_line));
        let mailboxes = EventClass::ALL.map(|class| EdgeEventMailbox::new(class, Arc::clone(&signal)));
        Self {
            config,
            signal,
            mailboxes,
            consumer_attached: AtomicBool::new(false),
        }
    }

    pub(crate) fn mailbox(&self, class: EventClass) -> &EdgeEventMailbox {
        &self.mailboxes[class.index()]
    }

    pub(crate) fn close(&self) {
        for mailbox in &self.mailboxes {
            mailbox.close();
        }
    }
}

/// Cross-thread edge event bridge
///
/// Cloning a `Bridge` clones the handle, not the state.
#[derive(Debug, Clone)]
pub struct Bridge {
    shared: Arc<Shared>,
}

impl Bridge {
    /// Bridge with a validated configuration
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidConfig`] if the configuration fails validation.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        config
            .validate()
            .map_err(|_| BridgeError::InvalidConfig {
                reason: "max_line exceeds addressable range",
            })?;
        Ok(Self {
            shared: Arc::new(Shared::new(config)),
        })
    }

    /// Bridge covering the user GPIO bank
    pub fn with_defaults() -> Self {
        Self {
            shared: Arc::new(Shared::new(BridgeConfig::default())),
        }
    }

    /// The process-wide bridge
    pub fn global() -> &'static Bridge {
        &GLOBAL_BRIDGE
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// New producer handle
    pub fn publisher(&self) -> EdgePublisher {
        EdgePublisher {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Attach the consumer
    ///
    /// Succeeds once per bridge. The returned loop closes the mailboxes when
    /// dropped, and the bridge stays closed after that.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ConsumerAlreadyAttached`] on every call after the first.
    pub fn event_loop(&self) -> BridgeResult<EventLoop> {
        if self
            .shared
            .consumer_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BridgeError::ConsumerAlreadyAttached);
        }
        log_debug!("event loop attached (max_line {})", self.shared.config.max_line);
        EventLoop::new(Arc::clone(&self.shared))
    }

    /// Mailbox for `class`, for inspection
    pub fn mailbox(&self, class: EventClass) -> &EdgeEventMailbox {
        self.shared.mailbox(class)
    }
}

/// Producer handle: publishes edge events from any thread
#[derive(Debug, Clone)]
pub struct EdgePublisher {
    shared: Arc<Shared>,
}

impl EdgePublisher {
    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Publish `event` into the `class` mailbox
    ///
    /// Blocks until the previous event of that class has been dispatched.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidLine`] if the line exceeds this bridge's range
    /// - [`BridgeError::Closed`] if the consumer is gone
    pub fn publish(&self, class: EventClass, event: EdgeEvent) -> BridgeResult<()> {
        let max = self.shared.config.max_line;
        if event.line.get() > max {
            return Err(BridgeError::InvalidLine {
                line: u32::from(event.line.get()),
                max,
            });
        }
        self.shared.mailbox(class).publish(event)?;
        log_trace!("published {} {}", class, event);
        Ok(())
    }

    /// Validate raw callback arguments and publish them
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidLine`], [`BridgeError::InvalidLevel`], or
    /// [`BridgeError::Closed`].
    pub fn publish_raw(&self, class: EventClass, gpio: u32, level: u32, tick: Tick) -> BridgeResult<()> {
        let line = LineId::new(gpio, self.shared.config.max_line)?;
        let level = Level::from_raw(level)?;
        self.publish(class, EdgeEvent::new(line, level, tick))
    }

    /// Raw callback for a GPIO client, publishing into `class`
    ///
    /// Failures cannot be returned through the client, so they are logged.
    pub fn raw_callback(&self, class: EventClass) -> RawEdgeCallback {
        let publisher = self.clone();
        Arc::new(move |gpio, level, tick| {
            if let Err(err) = publisher.publish_raw(class, gpio, level, tick) {
                log_warn!("dropped {} edge on gpio {} at {}: {}", class, gpio, tick, err);
            }
        })
    }
}
