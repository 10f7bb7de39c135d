//! Sensor Read Sequencer
//!
//! ## Overview
//!
//! One call to [`SensorReadSequencer::read_sensor`] performs a complete
//! DHT22 transaction on the consumer thread:
//!
//! ```text
//! 1. line → input                      (idle, pulled up)
//! 2. fresh decoder armed at now()      subscribe decoder.feed on rising edges
//! 3. line → output, low, hold 18 ms    trigger
//!    line → input                      release; sensor answers
//! 4. up to 5 × (run loop 50 ms, poll)  stop early on Complete / Aborted
//! 5. unsubscribe                       always, whatever happened above
//! 6. Complete → its reading; anything else → Timeout
//! ```
//!
//! Edges arrive through the bridge while the loop runs, so the decoder is
//! only ever touched on the calling thread and can live in an
//! `Rc<RefCell<_>>` shared with its handler.
//!
//! ## Failure Model
//!
//! Sensor problems are data: a bad checksum, implausible values, an aborted
//! frame, or silence all come back as `Ok` with a non-good status. Only
//! precondition and GPIO client failures are `Err`, and they are returned
//! after the subscription has been removed. The sequencer never retries.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;

use pulsebridge_core::time::to_std;
use pulsebridge_core::{
    BridgeResult, EdgeKind, EventClass, EventLoop, GpioClient, Level, LineId, Mode,
};

use crate::config::SensorConfig;
use crate::decoder::TimingFrameDecoder;
use crate::reading::DecodedReading;

/// Runs read transactions against one GPIO client
#[derive(Debug)]
pub struct SensorReadSequencer<'g, G: GpioClient + ?Sized> {
    gpio: &'g G,
    config: SensorConfig,
}

impl<'g, G: GpioClient + ?Sized> SensorReadSequencer<'g, G> {
    /// Sequencer using `config`
    pub fn new(gpio: &'g G, config: SensorConfig) -> Self {
        Self { gpio, config }
    }

    /// Sequencer with datasheet defaults
    pub fn with_defaults(gpio: &'g G) -> Self {
        Self::new(gpio, SensorConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Trigger the sensor on `line` and decode its answer
    ///
    /// Blocks for the trigger pulse plus up to the poll budget, dispatching
    /// `event_loop` meanwhile. Other subscriptions on the loop keep being
    /// served.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidLine`](pulsebridge_core::BridgeError::InvalidLine)
    /// for an out-of-range line, or
    /// [`BridgeError::Gpio`](pulsebridge_core::BridgeError::Gpio) if the
    /// client fails. Sensor failures are reported through
    /// [`DecodedReading::status`].
    pub fn read_sensor(&self, event_loop: &mut EventLoop, line: u32) -> BridgeResult<DecodedReading> {
        let line_id = event_loop.registry(EventClass::Isr).line(line)?;
        self.gpio.configure_mode(line_id, Mode::Input)?;

        let decoder = Rc::new(RefCell::new(TimingFrameDecoder::from_config(&self.config)));
        decoder.borrow_mut().arm(self.gpio.current_tick());

        let sink = Rc::clone(&decoder);
        event_loop.subscribe(
            self.gpio,
            EventClass::Isr,
            line,
            EdgeKind::Rising,
            Box::new(move |_, level, tick| {
                if level != Level::Timeout {
                    sink.borrow_mut().feed(tick);
                }
            }),
        )?;
        log_debug!("dht read on {} armed", line_id);

        let outcome = self.trigger_and_poll(event_loop, line_id, &decoder);

        let unsubscribed = event_loop.unsubscribe(self.gpio, EventClass::Isr, line);
        // Release any edge still parked in the mailbox for this read.
        let drained = event_loop.drain();

        let reading = outcome?;
        unsubscribed?;
        drained?;
        log_debug!("dht read on {}: {}", line_id, reading);
        Ok(reading)
    }

    fn trigger_and_poll(
        &self,
        event_loop: &mut EventLoop,
        line: LineId,
        decoder: &RefCell<TimingFrameDecoder>,
    ) -> BridgeResult<DecodedReading> {
        self.gpio.configure_mode(line, Mode::Output)?;
        self.gpio.set_level(line, Level::Low)?;
        thread::sleep(to_std(self.config.trigger_low()));
        self.gpio.configure_mode(line, Mode::Input)?;

        let interval = to_std(self.config.poll_interval());
        for attempt in 1..=self.config.poll_attempts {
            event_loop.run_for(interval)?;
            match decoder.borrow().poll() {
                Ok(reading) => return Ok(reading),
                Err(nb::Error::Other(aborted)) => {
                    log_warn!("dht read on {} failed: {}", line, aborted);
                    return Ok(DecodedReading::timeout());
                }
                Err(nb::Error::WouldBlock) => {
                    log_trace!("dht read on {}: no frame after poll {}", line, attempt);
                }
            }
        }

        log_warn!(
            "dht read on {} timed out after {} ms",
            line,
            self.config.poll_budget().to_millis()
        );
        Ok(DecodedReading::timeout())
    }
}
