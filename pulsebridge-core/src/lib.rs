//! Cross-thread GPIO edge event bridge
//!
//! Moves edge events from the threads a GPIO daemon calls back on into a
//! single-threaded consumer, one event per class at a time.
//!
//! Key properties:
//! - At most one event in flight per event class; producers block until the
//!   consumer has run the handler
//! - Handlers run only on the consumer thread and need not be `Send`
//! - FIFO per class, no coalescing of events, nothing dropped
//!
//! ```no_run
//! use pulsebridge_core::{Bridge, EdgeKind, EventClass, SimulatedGpio};
//!
//! let gpio = SimulatedGpio::new();
//! let bridge = Bridge::with_defaults();
//! let mut event_loop = bridge.event_loop()?;
//!
//! event_loop.subscribe(
//!     &gpio,
//!     EventClass::Isr,
//!     18,
//!     EdgeKind::Rising,
//!     Box::new(|line, level, tick| println!("{line} {level:?} @{tick}")),
//! )?;
//! event_loop.run()?;
//! # Ok::<(), pulsebridge_core::BridgeError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod bridge;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod gpio;
pub mod line;
pub mod mailbox;
pub mod registry;
#[cfg(feature = "sim")]
pub mod sim;
pub mod time;
pub mod wake;

// Public API
pub use bridge::{Bridge, EdgePublisher, GLOBAL_BRIDGE};
pub use config::BridgeConfig;
pub use dispatch::{DispatchOutcome, EventLoop};
pub use errors::{BridgeError, BridgeResult, ConfigError, GpioError};
pub use events::{EdgeEvent, EventClass};
pub use gpio::{CallbackId, GpioClient, RawEdgeCallback};
pub use line::{EdgeKind, Level, LineId, Mode};
pub use mailbox::EdgeEventMailbox;
pub use registry::CallbackRegistry;
#[cfg(feature = "sim")]
pub use sim::{Release, SimDevice, SimEdge, SimulatedGpio};
pub use time::{tick_diff, Tick};
pub use wake::{GpioWakeChannel, Handler, WakeToken};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
