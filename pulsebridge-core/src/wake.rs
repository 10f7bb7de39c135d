//! Wake Channels: Waking the Consumer from Any Thread
//!
//! ## Overview
//!
//! Every line has one wake channel per event class. Publishing to the
//! mailbox marks the channel's token pending; the consumer blocks in
//! [`LoopSignal::wait`] until some channel is signaled and then pulls the
//! mailbox.
//!
//! ```text
//! producer thread                      consumer thread
//!   publish(event)                        wait() ──┐
//!     write slot                                   │ blocked
//!     wake(Isr, GPIO18) ──── condvar ────▶ token ◀─┘
//!     (returns, slot held)                dispatch(token)
//! ```
//!
//! ## Coalescing
//!
//! Pending wakes are a bitmask per class, one bit per line. Signaling a
//! channel that is already pending is a no-op, like an async handle that has
//! not run yet. This never loses events: the mailbox only holds one event
//! per class, and the producer of the next one is blocked until the current
//! one is released.
//!
//! ## Keepalive
//!
//! A channel that holds a handler keeps a reference on the signal. The
//! consumer loop treats "no references and nothing pending" as idle, so an
//! unused line never keeps [`run`](crate::dispatch::EventLoop::run) from
//! returning.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::events::EventClass;
use crate::gpio::CallbackId;
use crate::line::{Level, LineId};
use crate::time::Tick;

/// High-level edge handler, run on the consumer thread
///
/// Receives `(line, level, tick)`. Handlers have no access to the mailbox or
/// the registry, so they cannot re-enter dispatch.
pub type Handler = Box<dyn FnMut(LineId, Level, Tick)>;

/// Identifies which channel woke the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WakeToken {
    /// Event class of the channel
    pub class: EventClass,
    /// Line of the channel
    pub line: LineId,
}

impl WakeToken {
    /// Token for `line` in `class`
    pub const fn new(class: EventClass, line: LineId) -> Self {
        Self { class, line }
    }
}

impl fmt::Display for WakeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.line)
    }
}

#[derive(Debug, Default)]
struct WakeState {
    /// One bit per line, per class
    pending: [u64; 2],
    /// Class to try first on the next take, alternated for fairness
    next_class: usize,
}

impl WakeState {
    fn take(&mut self, max_line: u8) -> Option<WakeToken> {
        for offset in 0..EventClass::ALL.len() {
            let index = (self.next_class + offset) % EventClass::ALL.len();
            let bits = self.pending[index];
            if bits == 0 {
                continue;
            }
            let bit = bits.trailing_zeros();
            self.pending[index] &= !(1u64 << bit);
            self.next_class = (index + 1) % EventClass::ALL.len();
            let class = EventClass::ALL[index];
            // Bits are only ever set from validated line ids.
            let line = LineId::new(bit, max_line).ok()?;
            return Some(WakeToken::new(class, line));
        }
        None
    }

    fn any_pending(&self) -> bool {
        self.pending.iter().any(|bits| *bits != 0)
    }
}

/// Shared wake primitive: condition variable plus pending bitmask
#[derive(Debug)]
pub struct LoopSignal {
    state: Mutex<WakeState>,
    cond: Condvar,
    keepalive: AtomicUsize,
    max_line: u8,
}

impl LoopSignal {
    /// Signal with room for lines `0..=max_line`
    pub fn new(max_line: u8) -> Self {
        Self {
            state: Mutex::new(WakeState::default()),
            cond: Condvar::new(),
            keepalive: AtomicUsize::new(0),
            max_line,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `token` pending and wake the consumer. Callable from any thread.
    pub fn wake(&self, token: WakeToken) {
        let mut state = self.lock();
        state.pending[token.class.index()] |= token.line.mask();
        drop(state);
        self.cond.notify_one();
    }

    /// Take one pending token without blocking
    pub fn try_take(&self) -> Option<WakeToken> {
        self.lock().take(self.max_line)
    }

    /// Block until a token is pending or `timeout` elapses
    ///
    /// `None` waits indefinitely.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<WakeToken> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();
        loop {
            if let Some(token) = state.take(self.max_line) {
                return Some(token);
            }
            state = match deadline {
                None => self.cond.wait(state).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.cond
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Whether any channel is signaled but not yet taken
    pub fn has_pending(&self) -> bool {
        self.lock().any_pending()
    }

    /// Number of channels currently holding a keepalive reference
    pub fn keepalive_count(&self) -> usize {
        self.keepalive.load(Ordering::Acquire)
    }

    fn acquire_ref(&self) {
        self.keepalive.fetch_add(1, Ordering::AcqRel);
    }

    fn release_ref(&self) {
        self.keepalive.fetch_sub(1, Ordering::AcqRel);
    }
}

/// One line's wake channel within a registry
///
/// Created eagerly for every line and kept for the lifetime of the event
/// loop; only the handler it holds changes.
pub struct GpioWakeChannel {
    token: WakeToken,
    signal: Arc<LoopSignal>,
    handler: Option<Handler>,
    raw_callback: Option<CallbackId>,
}

impl GpioWakeChannel {
    pub(crate) fn new(token: WakeToken, signal: Arc<LoopSignal>) -> Self {
        Self {
            token,
            signal,
            handler: None,
            raw_callback: None,
        }
    }

    /// Token this channel signals with
    pub fn token(&self) -> WakeToken {
        self.token
    }

    /// Whether a handler is installed
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Install `handler` (or clear it with `None`), returning the previous one
    ///
    /// Moves the keepalive reference along with handler presence.
    pub fn replace_handler(&mut self, handler: Option<Handler>) -> Option<Handler> {
        match (self.handler.is_some(), handler.is_some()) {
            (false, true) => self.signal.acquire_ref(),
            (true, false) => self.signal.release_ref(),
            _ => {}
        }
        core::mem::replace(&mut self.handler, handler)
    }

    /// Mutable access for invocation
    pub fn handler_mut(&mut self) -> Option<&mut Handler> {
        self.handler.as_mut()
    }

    /// Raw client callback feeding this channel, if subscribed
    pub fn raw_callback(&self) -> Option<CallbackId> {
        self.raw_callback
    }

    pub(crate) fn set_raw_callback(&mut self, id: Option<CallbackId>) -> Option<CallbackId> {
        core::mem::replace(&mut self.raw_callback, id)
    }
}

impl Drop for GpioWakeChannel {
    fn drop(&mut self) {
        if self.handler.take().is_some() {
            self.signal.release_ref();
        }
    }
}

impl fmt::Debug for GpioWakeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioWakeChannel")
            .field("token", &self.token)
            .field("has_handler", &self.handler.is_some())
            .field("raw_callback", &self.raw_callback)
            .finish()
    }
}
