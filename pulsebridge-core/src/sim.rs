//! In-Memory GPIO Backend
//!
//! ## Overview
//!
//! [`SimulatedGpio`] implements [`GpioClient`] without hardware. It keeps a
//! mode and level per line and delivers raw edge callbacks from its own
//! thread, the way a GPIO daemon client does:
//!
//! ```text
//! caller thread                 delivery thread
//!   set_level / inject ──mpsc──▶ match callbacks by line + edge kind
//!   configure_mode(Input)        │
//!     └─ device.on_release ─────▶└─▶ callback(gpio, level, tick)
//!                                      (may block on the mailbox)
//! ```
//!
//! Edges are queued in order and delivered one at a time, so a blocked
//! callback holds back every later edge, like a real callback thread.
//!
//! ## Devices
//!
//! A [`SimDevice`] attached to a line answers when the line is released
//! from output to input, returning the edge train it drives onto the wire.
//! Sensor crates implement it to model their protocol.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::constants::gpio::{MAX_USER_LINE, STATUS_BAD_LEVEL, STATUS_BAD_LINE, STATUS_CALLBACK_NOT_FOUND};
use crate::errors::GpioError;
use crate::gpio::{CallbackId, GpioClient, RawEdgeCallback};
use crate::line::{EdgeKind, Level, LineId, Mode};
use crate::time::{tick_diff, MonotonicTicks, Tick, TickSource};

/// One edge driven by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimEdge {
    /// Level after the edge
    pub level: Level,
    /// Tick of the edge
    pub tick: Tick,
}

impl SimEdge {
    /// Edge to `level` at `tick`
    pub const fn new(level: Level, tick: Tick) -> Self {
        Self { level, tick }
    }
}

/// Line released by the host after driving it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    /// Line that was released
    pub line: LineId,
    /// Tick at which the pull-up took the line high
    pub tick: Tick,
    /// How long the host held the line low before releasing, if it did
    pub held_low_us: Option<u32>,
}

/// Device wired to a simulated line
pub trait SimDevice: Send {
    /// Edges the device drives after the host releases the line
    ///
    /// Ticks are absolute and must not precede `release.tick`.
    fn on_release(&mut self, release: Release) -> Vec<SimEdge>;
}

#[derive(Debug, Clone, Copy)]
struct Delivery {
    line: LineId,
    level: Level,
    tick: Tick,
}

struct RawEntry {
    id: CallbackId,
    line: LineId,
    edge: EdgeKind,
    callback: RawEdgeCallback,
}

struct LineState {
    mode: Mode,
    level: Level,
    low_since: Option<Tick>,
    device: Option<Box<dyn SimDevice>>,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            mode: Mode::Input,
            level: Level::High,
            low_since: None,
            device: None,
        }
    }
}

type CallbackTable = Arc<Mutex<Vec<RawEntry>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated GPIO client
pub struct SimulatedGpio {
    max_line: u8,
    ticks: Box<dyn TickSource + Send + Sync>,
    lines: Mutex<Vec<LineState>>,
    callbacks: CallbackTable,
    next_id: AtomicU32,
    queue: Mutex<Sender<Delivery>>,
}

impl SimulatedGpio {
    /// Simulator for the user GPIO bank, ticking with the host clock
    pub fn new() -> Self {
        Self::with_tick_source(MAX_USER_LINE, MonotonicTicks::new())
    }

    /// Simulator for lines `0..=max_line` driven by `ticks`
    pub fn with_tick_source<T>(max_line: u8, ticks: T) -> Self
    where
        T: TickSource + Send + Sync + 'static,
    {
        let callbacks: CallbackTable = Arc::new(Mutex::new(Vec::new()));
        let (sender, receiver) = mpsc::channel();
        let table = Arc::clone(&callbacks);
        thread::spawn(move || deliver_loop(&table, &receiver));

        Self {
            max_line,
            ticks: Box::new(ticks),
            lines: Mutex::new((0..=max_line).map(|_| LineState::default()).collect()),
            callbacks,
            next_id: AtomicU32::new(0),
            queue: Mutex::new(sender),
        }
    }

    fn check(&self, line: LineId, call: &'static str) -> Result<usize, GpioError> {
        if line.get() > self.max_line {
            return Err(GpioError::new(STATUS_BAD_LINE, call));
        }
        Ok(line.index())
    }

    fn enqueue(&self, line: LineId, level: Level, tick: Tick) {
        // Fails only if a callback panicked and took the delivery thread down.
        if lock(&self.queue).send(Delivery { line, level, tick }).is_err() {
            log_warn!("sim delivery thread gone; dropped edge on {}", line);
        }
    }

    /// Wire `device` to `line`, replacing any previous device
    pub fn attach<D: SimDevice + 'static>(&self, line: LineId, device: D) -> Result<(), GpioError> {
        let index = self.check(line, "attach")?;
        lock(&self.lines)[index].device = Some(Box::new(device));
        Ok(())
    }

    /// Drive an external edge onto `line` at the current tick
    pub fn inject(&self, line: LineId, level: Level) -> Result<Tick, GpioError> {
        let tick = self.current_tick();
        self.inject_at(line, level, tick)?;
        Ok(tick)
    }

    /// Drive an external edge onto `line` with an explicit tick
    pub fn inject_at(&self, line: LineId, level: Level, tick: Tick) -> Result<(), GpioError> {
        let index = self.check(line, "inject")?;
        if level == Level::Timeout {
            return Err(GpioError::new(STATUS_BAD_LEVEL, "inject"));
        }
        lock(&self.lines)[index].level = level;
        self.enqueue(line, level, tick);
        Ok(())
    }

    /// Deliver a watchdog timeout for `line`
    pub fn watchdog_timeout(&self, line: LineId) -> Result<Tick, GpioError> {
        self.check(line, "watchdog")?;
        let tick = self.current_tick();
        self.enqueue(line, Level::Timeout, tick);
        Ok(tick)
    }

    /// Number of raw callbacks currently registered
    pub fn callback_count(&self) -> usize {
        lock(&self.callbacks).len()
    }

    /// Current mode of `line`
    pub fn mode(&self, line: LineId) -> Result<Mode, GpioError> {
        let index = self.check(line, "get_mode")?;
        Ok(lock(&self.lines)[index].mode)
    }
}

impl Default for SimulatedGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SimulatedGpio {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedGpio")
            .field("max_line", &self.max_line)
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

fn deliver_loop(table: &Mutex<Vec<RawEntry>>, receiver: &Receiver<Delivery>) {
    while let Ok(delivery) = receiver.recv() {
        let matching: Vec<CallbackId> = lock(table)
            .iter()
            .filter(|entry| entry.line == delivery.line && entry.edge.matches(delivery.level))
            .map(|entry| entry.id)
            .collect();
        for id in matching {
            // Looked up again per call: an earlier callback may have cancelled it.
            let callback = lock(table)
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| Arc::clone(&entry.callback));
            // Called without the table lock: a callback may block on the bridge.
            if let Some(callback) = callback {
                callback(u32::from(delivery.line.get()), delivery.level.raw(), delivery.tick);
            }
        }
    }
}

impl GpioClient for SimulatedGpio {
    fn configure_mode(&self, line: LineId, mode: Mode) -> Result<(), GpioError> {
        let index = self.check(line, "set_mode")?;
        let tick = self.current_tick();

        let mut lines = lock(&self.lines);
        let state = &mut lines[index];
        let released = state.mode == Mode::Output && mode == Mode::Input;
        state.mode = mode;
        if !released {
            return Ok(());
        }

        let held_low_us = state.low_since.take().map(|since| tick_diff(tick, since));
        let mut edges = Vec::new();
        if state.level != Level::High {
            // Pull-up takes the released line high.
            state.level = Level::High;
            edges.push(SimEdge::new(Level::High, tick));
        }
        if let Some(device) = state.device.as_mut() {
            edges.extend(device.on_release(Release {
                line,
                tick,
                held_low_us,
            }));
        }
        if let Some(last) = edges.last() {
            state.level = last.level;
        }
        drop(lines);

        for edge in edges {
            self.enqueue(line, edge.level, edge.tick);
        }
        Ok(())
    }

    fn set_level(&self, line: LineId, level: Level) -> Result<(), GpioError> {
        let index = self.check(line, "write")?;
        if level == Level::Timeout {
            return Err(GpioError::new(STATUS_BAD_LEVEL, "write"));
        }
        let tick = self.current_tick();

        let mut lines = lock(&self.lines);
        let state = &mut lines[index];
        state.mode = Mode::Output;
        let changed = state.level != level;
        state.level = level;
        state.low_since = match level {
            Level::Low => state.low_since.or(Some(tick)),
            _ => None,
        };
        drop(lines);

        if changed {
            self.enqueue(line, level, tick);
        }
        Ok(())
    }

    fn read_level(&self, line: LineId) -> Result<Level, GpioError> {
        let index = self.check(line, "read")?;
        Ok(lock(&self.lines)[index].level)
    }

    fn current_tick(&self) -> Tick {
        self.ticks.now()
    }

    fn register_raw_edge_callback(
        &self,
        line: LineId,
        edge: EdgeKind,
        callback: RawEdgeCallback,
    ) -> Result<CallbackId, GpioError> {
        self.check(line, "callback")?;
        let id = CallbackId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.callbacks).push(RawEntry {
            id,
            line,
            edge,
            callback,
        });
        Ok(id)
    }

    fn cancel_raw_edge_callback(&self, id: CallbackId) -> Result<(), GpioError> {
        let mut callbacks = lock(&self.callbacks);
        let position = callbacks
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(GpioError::new(STATUS_CALLBACK_NOT_FOUND, "callback_cancel"))?;
        callbacks.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedTicks;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    fn line(raw: u32) -> LineId {
        LineId::new(raw, 31).unwrap()
    }

    fn recorder() -> (RawEdgeCallback, Receiver<(u32, u32, u32)>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let callback: RawEdgeCallback = Arc::new(move |g, l, t| {
            let _ = tx.lock().unwrap().send((g, l, t));
        });
        (callback, rx)
    }

    #[test]
    fn rising_callback_filters_falling_edges() {
        let ticks = Arc::new(FixedTicks::new(100));
        let gpio = SimulatedGpio::with_tick_source(31, Arc::clone(&ticks));
        let (callback, rx) = recorder();
        gpio.register_raw_edge_callback(line(4), EdgeKind::Rising, callback).unwrap();

        gpio.inject(line(4), Level::Low).unwrap();
        ticks.advance(50);
        gpio.inject(line(4), Level::High).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok((4, 1, 150)));
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(20)),
            Err(RecvTimeoutError::Timeout)
        );
    }

    #[test]
    fn release_pulls_line_high() {
        let gpio = SimulatedGpio::new();
        let (callback, rx) = recorder();
        gpio.register_raw_edge_callback(line(7), EdgeKind::Either, callback).unwrap();

        gpio.set_level(line(7), Level::Low).unwrap();
        assert_eq!(gpio.mode(line(7)), Ok(Mode::Output));
        gpio.configure_mode(line(7), Mode::Input).unwrap();

        let (_, first, _) = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let (_, second, _) = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!((first, second), (0, 1));
        assert_eq!(gpio.read_level(line(7)), Ok(Level::High));
    }

    #[test]
    fn cancelled_callback_not_found_twice() {
        let gpio = SimulatedGpio::new();
        let (callback, _rx) = recorder();
        let id = gpio
            .register_raw_edge_callback(line(2), EdgeKind::Falling, callback)
            .unwrap();
        assert_eq!(gpio.callback_count(), 1);

        gpio.cancel_raw_edge_callback(id).unwrap();
        assert_eq!(
            gpio.cancel_raw_edge_callback(id),
            Err(GpioError::new(STATUS_CALLBACK_NOT_FOUND, "callback_cancel"))
        );
    }

    #[test]
    fn callback_cancelled_mid_delivery_is_skipped() {
        let gpio = Arc::new(SimulatedGpio::new());
        let victim: Arc<Mutex<Option<CallbackId>>> = Arc::default();

        let canceller: RawEdgeCallback = {
            let gpio = Arc::downgrade(&gpio);
            let victim = Arc::clone(&victim);
            Arc::new(move |_, _, _| {
                let id = victim.lock().unwrap().take();
                if let (Some(gpio), Some(id)) = (gpio.upgrade(), id) {
                    gpio.cancel_raw_edge_callback(id).unwrap();
                }
            })
        };
        gpio.register_raw_edge_callback(line(6), EdgeKind::Either, canceller).unwrap();
        let (cancelled, cancelled_rx) = recorder();
        let id = gpio.register_raw_edge_callback(line(6), EdgeKind::Either, cancelled).unwrap();
        *victim.lock().unwrap() = Some(id);
        let (marker, marker_rx) = recorder();
        gpio.register_raw_edge_callback(line(8), EdgeKind::Either, marker).unwrap();

        gpio.inject(line(6), Level::Low).unwrap();
        gpio.inject(line(8), Level::Low).unwrap();

        // Edges are delivered in order, so line 6 is fully handled by now.
        assert!(marker_rx.recv_timeout(Duration::from_secs(1)).is_ok());
        assert_eq!(cancelled_rx.try_recv(), Err(mpsc::TryRecvError::Empty));
        assert_eq!(gpio.callback_count(), 2);
    }

    #[test]
    fn out_of_range_line_rejected() {
        let gpio = SimulatedGpio::with_tick_source(7, FixedTicks::new(0));
        assert_eq!(
            gpio.set_level(line(9), Level::High),
            Err(GpioError::new(STATUS_BAD_LINE, "write"))
        );
    }

    #[test]
    fn watchdog_reaches_rising_callbacks() {
        let gpio = SimulatedGpio::with_tick_source(31, FixedTicks::new(77));
        let (callback, rx) = recorder();
        gpio.register_raw_edge_callback(line(3), EdgeKind::Rising, callback).unwrap();

        gpio.watchdog_timeout(line(3)).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok((3, 2, 77)));
    }

    struct Echo;

    impl SimDevice for Echo {
        fn on_release(&mut self, release: Release) -> Vec<SimEdge> {
            assert!(release.held_low_us.is_some());
            vec![
                SimEdge::new(Level::Low, release.tick + 10),
                SimEdge::new(Level::High, release.tick + 20),
            ]
        }
    }

    #[test]
    fn device_answers_release() {
        let gpio = SimulatedGpio::with_tick_source(31, FixedTicks::new(1000));
        gpio.attach(line(5), Echo).unwrap();
        let (callback, rx) = recorder();
        gpio.register_raw_edge_callback(line(5), EdgeKind::Rising, callback).unwrap();

        gpio.set_level(line(5), Level::Low).unwrap();
        gpio.configure_mode(line(5), Mode::Input).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok((5, 1, 1000)));
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok((5, 1, 1020)));
    }
}
