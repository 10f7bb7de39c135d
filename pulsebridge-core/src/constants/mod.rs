//! Constants for PulseBridge Core
//!
//! Centralized, documented constants for line numbering, raw hardware values,
//! client status codes, and loop timing. Every value carries its unit in the
//! name.
//!
//! ## Organization
//!
//! - **Gpio**: Line ranges, raw level/edge/mode values, client status codes
//! - **Time**: Loop timing defaults

/// Line ranges, raw hardware encodings, and client status codes.
pub mod gpio;

/// Event loop timing.
pub mod time;
