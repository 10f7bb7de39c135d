//! GPIO Line Ranges and Raw Encodings
//!
//! Values follow the Raspberry Pi GPIO daemon conventions, since that is the
//! platform the raw callbacks come from.

// ===== LINE RANGES =====

/// Highest user-addressable GPIO line.
///
/// Lines 0-31 form the user bank on every Raspberry Pi model. Callback
/// registration is only supported on this bank.
pub const MAX_USER_LINE: u8 = 31;

/// Highest GPIO line the hardware can address at all.
///
/// Configurations may raise `max_line` up to this value. The wake bitmask
/// holds one bit per line, so this must stay below 64.
pub const MAX_ADDRESSABLE_LINE: u8 = 53;

const _: () = assert!(MAX_ADDRESSABLE_LINE < 64, "wake bitmask is a u64");

// ===== RAW LEVELS =====

/// Raw level reported for a low line.
pub const LEVEL_LOW: u32 = 0;

/// Raw level reported for a high line.
pub const LEVEL_HIGH: u32 = 1;

/// Raw level reported when a watchdog fires with no edge.
pub const LEVEL_TIMEOUT: u32 = 2;

// ===== RAW EDGE CONDITIONS =====

/// Callback on low-to-high transitions.
pub const EDGE_RISING: u32 = 0;

/// Callback on high-to-low transitions.
pub const EDGE_FALLING: u32 = 1;

/// Callback on any transition.
pub const EDGE_EITHER: u32 = 2;

// ===== RAW MODES =====

/// Line configured as input.
pub const MODE_INPUT: u32 = 0;

/// Line configured as output.
pub const MODE_OUTPUT: u32 = 1;

// ===== CLIENT STATUS CODES =====

/// Line number rejected by the client.
pub const STATUS_BAD_LINE: i32 = -2;

/// Level value rejected by the client.
pub const STATUS_BAD_LEVEL: i32 = -5;

/// Callback id not known to the client.
pub const STATUS_CALLBACK_NOT_FOUND: i32 = -2004;
