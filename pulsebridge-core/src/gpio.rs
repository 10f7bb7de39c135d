//! GPIO Client Boundary
//!
//! The bridge does not talk to hardware itself. Everything it needs from the
//! GPIO daemon is expressed by the [`GpioClient`] trait: line mode and level,
//! the current hardware tick, and raw edge callback registration.
//!
//! ## Design Philosophy
//!
//! - **Object safe**: Sequencers take `&dyn GpioClient` or a generic, so a
//!   daemon transport and the in-memory simulator are interchangeable
//! - **Raw at the edge**: Callbacks receive the daemon's raw `u32` values on
//!   the daemon's thread; validation happens in the publisher, not here
//! - **Thread safe**: The client is `Send + Sync` because its callbacks run on
//!   threads it owns
//!
//! ## Raw Callback Contract
//!
//! ```text
//! daemon thread ──▶ RawEdgeCallback(gpio, level, tick)
//!                        │
//!                        └──▶ EdgePublisher::publish_raw ──▶ mailbox
//! ```
//!
//! A raw callback may block (the mailbox applies backpressure). Clients must
//! tolerate that and must not hold internal locks while invoking callbacks.

use core::fmt;
use std::sync::Arc;

use crate::errors::GpioError;
use crate::line::{EdgeKind, Level, LineId, Mode};
use crate::time::Tick;

/// Raw callback invoked by the client as `(gpio, level, tick)`
pub type RawEdgeCallback = Arc<dyn Fn(u32, u32, u32) + Send + Sync>;

/// Handle for a registered raw callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u32);

impl CallbackId {
    /// Wrap a client-issued id
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Client-issued id
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb#{}", self.0)
    }
}

/// Operations the bridge and sensor sequencers need from a GPIO daemon
///
/// ## Implementation Notes
///
/// - Failures are reported as [`GpioError`] with the daemon's negative status
///   code and the name of the failing call
/// - `current_tick` is the same 32-bit microsecond counter that stamps edges
/// - After `cancel_raw_edge_callback` returns, no new invocation of the
///   callback may start; one already running is allowed to finish
pub trait GpioClient: Send + Sync {
    /// Set the direction of `line`
    fn configure_mode(&self, line: LineId, mode: Mode) -> Result<(), GpioError>;

    /// Drive `line` to `level`
    fn set_level(&self, line: LineId, level: Level) -> Result<(), GpioError>;

    /// Read the current level of `line`
    fn read_level(&self, line: LineId) -> Result<Level, GpioError>;

    /// Current hardware tick
    fn current_tick(&self) -> Tick;

    /// Invoke `callback` on the client's thread whenever `line` makes a
    /// transition matching `edge`
    fn register_raw_edge_callback(
        &self,
        line: LineId,
        edge: EdgeKind,
        callback: RawEdgeCallback,
    ) -> Result<CallbackId, GpioError>;

    /// Stop invoking the callback registered as `id`
    fn cancel_raw_edge_callback(&self, id: CallbackId) -> Result<(), GpioError>;
}

impl<G: GpioClient + ?Sized> GpioClient for Arc<G> {
    fn configure_mode(&self, line: LineId, mode: Mode) -> Result<(), GpioError> {
        (**self).configure_mode(line, mode)
    }

    fn set_level(&self, line: LineId, level: Level) -> Result<(), GpioError> {
        (**self).set_level(line, level)
    }

    fn read_level(&self, line: LineId) -> Result<Level, GpioError> {
        (**self).read_level(line)
    }

    fn current_tick(&self) -> Tick {
        (**self).current_tick()
    }

    fn register_raw_edge_callback(
        &self,
        line: LineId,
        edge: EdgeKind,
        callback: RawEdgeCallback,
    ) -> Result<CallbackId, GpioError> {
        (**self).register_raw_edge_callback(line, edge, callback)
    }

    fn cancel_raw_edge_callback(&self, id: CallbackId) -> Result<(), GpioError> {
        (**self).cancel_raw_edge_callback(id)
    }
}
