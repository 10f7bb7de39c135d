//! DHT22 Protocol Constants
//!
//! Timing, frame layout, plausibility limits and status codes for the
//! DHT22 (AM2302) single-wire protocol. Every value carries its unit in
//! the name.
//!
//! ```text
//! host   ‾‾‾‾\____18ms____/‾‾‾‾
//! sensor                       \__80__/‾‾80‾‾\_50_/‾26|70‾\_50_/‾ ... ‾\_50_/‾‾
//!                                            │  bit 0    │  bit 1          end
//! ```
//!
//! Only rising edges are timed. The width of a bit is the rising-to-rising
//! interval: 50 µs low plus 26 µs (zero) or 70 µs (one) high.

// ===== TRIGGER AND POLLING =====

/// How long the host holds the line low to request a reading (milliseconds).
///
/// Datasheet minimum is 1 ms; 18 ms also wakes DHT11-compatible parts.
pub const TRIGGER_LOW_MS: u32 = 18;

/// Interval between completion checks after the trigger (milliseconds).
pub const POLL_INTERVAL_MS: u32 = 50;

/// Completion checks before a read is reported as timed out.
///
/// With the default interval this gives a 250 ms budget; a full frame takes
/// about 5 ms.
pub const POLL_ATTEMPTS: u8 = 5;

// ===== PULSE WIDTHS =====

/// Idle gap that marks the start of a frame (microseconds).
///
/// Any rising-edge interval longer than this resets the decoder.
pub const FRAME_START_GAP_US: u32 = 10_000;

/// Shortest width accepted as a zero bit (microseconds, inclusive).
pub const ZERO_MIN_US: u32 = 60;

/// Longest width accepted as a zero bit (microseconds, inclusive).
pub const ZERO_MAX_US: u32 = 100;

/// Longest width accepted as a one bit (microseconds, inclusive).
///
/// Ones occupy `(ZERO_MAX_US, ONE_MAX_US]`.
pub const ONE_MAX_US: u32 = 150;

/// Rising edges after the frame start that carry no data.
///
/// The sensor's 80 µs response pulses produce two rising edges before the
/// first data bit.
pub const PREAMBLE_EDGES: u8 = 2;

const _: () = assert!(ZERO_MIN_US < ZERO_MAX_US && ZERO_MAX_US < ONE_MAX_US);
const _: () = assert!(ONE_MAX_US < FRAME_START_GAP_US);

// ===== FRAME LAYOUT =====

/// Data bits per frame.
pub const FRAME_BITS: u8 = 40;

/// Bytes per frame.
pub const FRAME_BYTES: usize = 5;

/// Pulse widths kept for diagnostics.
///
/// A little more than one frame, so an aborted frame can be logged whole.
pub const WIDTH_HISTORY: usize = 48;

const _: () = assert!(FRAME_BITS as usize == FRAME_BYTES * 8);
const _: () = assert!(WIDTH_HISTORY >= FRAME_BITS as usize + PREAMBLE_EDGES as usize);

// ===== PLAUSIBILITY LIMITS =====

/// Highest humidity accepted (%RH).
///
/// Above the physical 100% to leave room for sensor overshoot near
/// saturation.
pub const MAX_HUMIDITY_PCT: f32 = 110.0;

/// Lowest temperature accepted (°C). Datasheet range is -40 °C.
pub const MIN_TEMPERATURE_C: f32 = -50.0;

/// Highest temperature accepted (°C). Datasheet range is 80 °C.
pub const MAX_TEMPERATURE_C: f32 = 135.0;

// ===== STATUS CODES =====

/// Reading decoded and plausible.
pub const STATUS_GOOD: u8 = 0;

/// Checksum byte does not match the data bytes.
pub const STATUS_BAD_CHECKSUM: u8 = 1;

/// Checksum matched but the values are implausible.
pub const STATUS_BAD_DATA: u8 = 2;

/// No complete frame within the poll budget.
pub const STATUS_TIMEOUT: u8 = 3;
