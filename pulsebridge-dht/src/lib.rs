//! DHT22 reads over the pulsebridge edge bridge
//!
//! ## Overview
//!
//! A DHT22 answers an 18 ms low trigger with 40 bits encoded as pulse
//! widths. This crate decodes them from nothing but rising-edge timestamps
//! delivered by [`pulsebridge_core`], and sequences a complete read:
//!
//! ```text
//! SensorReadSequencer ──trigger──▶ GpioClient
//!        │                              │ rising edges (daemon thread)
//!        ▼                              ▼
//!   EventLoop ◀──── EdgeEventMailbox ◀── EdgePublisher
//!        │
//!        ▼
//! TimingFrameDecoder ──40 bits──▶ DecodedReading
//! ```
//!
//! ```no_run
//! use pulsebridge_core::{Bridge, SimulatedGpio};
//! use pulsebridge_dht::SensorReadSequencer;
//!
//! let gpio = SimulatedGpio::new();
//! let bridge = Bridge::with_defaults();
//! let mut event_loop = bridge.event_loop()?;
//!
//! let reading = SensorReadSequencer::with_defaults(&gpio).read_sensor(&mut event_loop, 4)?;
//! println!("{reading}");
//! # Ok::<(), pulsebridge_core::BridgeError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod config;
pub mod constants;
pub mod decoder;
pub mod frame;
pub mod reading;
pub mod sequencer;
#[cfg(feature = "sim")]
pub mod sim;

// Public API
pub use config::{PulseTiming, SensorConfig, SensorLimits};
pub use decoder::{DecoderState, FrameAborted, TimingFrameDecoder};
pub use frame::{FrameStatus, TimingFrame};
pub use reading::{DecodedReading, ReadingStatus};
pub use sequencer::SensorReadSequencer;
#[cfg(feature = "sim")]
pub use sim::{Dht22Device, Fault};
