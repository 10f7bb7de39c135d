//! Timing Frame Decoder
//!
//! ## Overview
//!
//! Turns rising-edge ticks into a [`DecodedReading`]. The decoder only ever
//! sees timestamps; it measures the interval between consecutive rising
//! edges and classifies it as a zero bit, a one bit, or garbage.
//!
//! ## State Machine
//!
//! ```text
//!            gap > frame start (from any state)
//!   ┌──────────────────────────────────────────────┐
//!   ▼                                              │
//! Idle ──gap > start──▶ Collecting ──40 bits──▶ Complete
//!                          │
//!                          └──width out of band──▶ Aborted
//! ```
//!
//! - The edge that ends the long idle gap opens the frame
//! - The next `preamble_edges` edges are the sensor's response pulses and
//!   carry no data
//! - Each later width is `[60, 100]` µs for a zero, `(100, 150]` µs for a one
//! - Bits shift in most-significant first; the 40th bit decodes the frame
//!
//! `Complete` and `Aborted` are sticky until the next long gap, so trailing
//! edges after a frame never corrupt the result.
//!
//! ## Non-Blocking Polling
//!
//! [`TimingFrameDecoder::poll`] follows the `nb` convention: `WouldBlock`
//! while a frame may still complete, the reading once it has, and
//! [`FrameAborted`] if the frame was abandoned.

use heapless::HistoryBuffer;
use pulsebridge_core::time::{tick_diff, Tick};
use thiserror_no_std::Error;

use crate::config::{PulseTiming, SensorConfig, SensorLimits};
use crate::constants::WIDTH_HISTORY;
use crate::frame::{FrameStatus, TimingFrame};
use crate::reading::DecodedReading;

/// A frame abandoned on an out-of-band pulse width
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("frame aborted at bit {at_bit}: width {width_us} us")]
pub struct FrameAborted {
    /// Index of the bit being read (0-based)
    pub at_bit: u8,
    /// The rejected rising-to-rising width
    pub width_us: u32,
}

/// Decoder progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecoderState {
    /// Waiting for a frame start
    Idle,
    /// Inside a frame
    Collecting {
        /// Data bits accepted so far
        bits: u8,
    },
    /// 40 bits received and decoded
    Complete(DecodedReading),
    /// Frame abandoned
    Aborted(FrameAborted),
}

/// Rising-edge decoder for one sensor
#[derive(Debug)]
pub struct TimingFrameDecoder {
    timing: PulseTiming,
    limits: SensorLimits,
    last_tick: Tick,
    frame: TimingFrame,
    state: DecoderState,
    widths: HistoryBuffer<u32, WIDTH_HISTORY>,
}

impl TimingFrameDecoder {
    /// Decoder with explicit thresholds and limits
    pub fn new(timing: PulseTiming, limits: SensorLimits) -> Self {
        Self {
            timing,
            limits,
            last_tick: 0,
            frame: TimingFrame::start(timing.preamble_edges),
            state: DecoderState::Idle,
            widths: HistoryBuffer::new(),
        }
    }

    /// Decoder configured from `config`
    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(config.timing, config.limits)
    }

    /// Reset to `Idle` with `tick` as the reference for the next gap
    pub fn arm(&mut self, tick: Tick) {
        self.last_tick = tick;
        self.state = DecoderState::Idle;
        self.frame = TimingFrame::start(self.timing.preamble_edges);
        self.widths.clear();
    }

    /// Current state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Frame accumulated so far
    pub fn frame(&self) -> &TimingFrame {
        &self.frame
    }

    /// Most recent widths, oldest first
    pub fn recent_widths(&self) -> impl Iterator<Item = &u32> + '_ {
        self.widths.oldest_ordered()
    }

    /// Account for a rising edge at `tick`
    pub fn feed(&mut self, tick: Tick) -> DecoderState {
        let gap = tick_diff(tick, self.last_tick);
        self.last_tick = tick;

        if self.timing.is_frame_start(gap) {
            self.frame = TimingFrame::start(self.timing.preamble_edges);
            self.widths.clear();
            self.state = DecoderState::Collecting { bits: 0 };
            log_trace!("frame start after {} us", gap);
            return self.state;
        }

        if !matches!(self.state, DecoderState::Collecting { .. }) {
            return self.state;
        }

        self.widths.write(gap);
        if self.frame.in_preamble() {
            self.frame.skip_edge();
            return self.state;
        }

        let at_bit = self.frame.accepted_bits();
        let Some(bit) = self.timing.classify(gap) else {
            let aborted = FrameAborted { at_bit, width_us: gap };
            log_warn!("{}; recent widths {:?}", aborted, self.widths.oldest_ordered().collect::<Vec<_>>());
            self.state = DecoderState::Aborted(aborted);
            return self.state;
        };

        self.state = match self.frame.push_bit(bit) {
            FrameStatus::Collecting => DecoderState::Collecting {
                bits: self.frame.accepted_bits(),
            },
            FrameStatus::Complete => {
                let reading = DecodedReading::from_frame(self.frame.bytes(), &self.limits);
                log_trace!("frame complete: {}", reading);
                DecoderState::Complete(reading)
            }
        };
        self.state
    }

    /// Reading if the frame completed
    ///
    /// # Errors
    ///
    /// - `WouldBlock` while idle or collecting
    /// - `Other(FrameAborted)` if the frame was abandoned
    pub fn poll(&self) -> nb::Result<DecodedReading, FrameAborted> {
        match self.state {
            DecoderState::Complete(reading) => Ok(reading),
            DecoderState::Aborted(aborted) => Err(nb::Error::Other(aborted)),
            DecoderState::Idle | DecoderState::Collecting { .. } => Err(nb::Error::WouldBlock),
        }
    }
}

impl Default for TimingFrameDecoder {
    fn default() -> Self {
        Self::new(PulseTiming::default(), SensorLimits::default())
    }
}
