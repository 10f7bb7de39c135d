//! Sensor configuration
//!
//! Defaults follow the DHT22 datasheet. All fields are optional in JSON:
//!
//! ```rust
//! use pulsebridge_dht::SensorConfig;
//!
//! let config = SensorConfig::from_json_str(r#"{ "poll_attempts": 8, "timing": { "one_max_us": 160 } }"#)?;
//! assert_eq!(config.poll_attempts, 8);
//! assert_eq!(config.timing.one_max_us, 160);
//! assert_eq!(config.timing.zero_max_us, 100);
//! # Ok::<(), pulsebridge_core::ConfigError>(())
//! ```

use std::fs;
use std::path::Path;

use fugit::{MicrosDurationU32, MillisDurationU32};
use pulsebridge_core::ConfigError;
use serde::{Deserialize, Serialize};

use crate::constants::{
    FRAME_START_GAP_US, MAX_HUMIDITY_PCT, MAX_TEMPERATURE_C, MIN_TEMPERATURE_C, ONE_MAX_US,
    POLL_ATTEMPTS, POLL_INTERVAL_MS, PREAMBLE_EDGES, TRIGGER_LOW_MS, ZERO_MAX_US, ZERO_MIN_US,
};

/// Pulse width thresholds used by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PulseTiming {
    /// Gap that starts a new frame (µs, exclusive)
    pub frame_start_gap_us: u32,
    /// Shortest zero bit (µs, inclusive)
    pub zero_min_us: u32,
    /// Longest zero bit (µs, inclusive)
    pub zero_max_us: u32,
    /// Longest one bit (µs, inclusive)
    pub one_max_us: u32,
    /// Edges skipped after the frame start
    pub preamble_edges: u8,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            frame_start_gap_us: FRAME_START_GAP_US,
            zero_min_us: ZERO_MIN_US,
            zero_max_us: ZERO_MAX_US,
            one_max_us: ONE_MAX_US,
            preamble_edges: PREAMBLE_EDGES,
        }
    }
}

impl PulseTiming {
    /// Bit value for a rising-to-rising width, or `None` if it is neither
    pub fn classify(&self, width_us: u32) -> Option<bool> {
        if (self.zero_min_us..=self.zero_max_us).contains(&width_us) {
            Some(false)
        } else if width_us > self.zero_max_us && width_us <= self.one_max_us {
            Some(true)
        } else {
            None
        }
    }

    /// Whether `gap_us` marks a frame start
    pub fn is_frame_start(&self, gap_us: u32) -> bool {
        gap_us > self.frame_start_gap_us
    }

    /// Frame start gap as a duration
    pub fn frame_start_gap(&self) -> MicrosDurationU32 {
        MicrosDurationU32::micros(self.frame_start_gap_us)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.zero_min_us < self.zero_max_us && self.zero_max_us < self.one_max_us) {
            return Err(ConfigError::Invalid("bit widths must satisfy zero_min < zero_max < one_max"));
        }
        if self.one_max_us >= self.frame_start_gap_us {
            return Err(ConfigError::Invalid("frame start gap must exceed the longest bit"));
        }
        Ok(())
    }
}

/// Plausibility limits applied to decoded values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorLimits {
    /// Highest accepted humidity (%RH, inclusive)
    pub max_humidity: f32,
    /// Lowest accepted temperature (°C, inclusive)
    pub min_temperature: f32,
    /// Highest accepted temperature (°C, inclusive)
    pub max_temperature: f32,
}

impl Default for SensorLimits {
    fn default() -> Self {
        Self {
            max_humidity: MAX_HUMIDITY_PCT,
            min_temperature: MIN_TEMPERATURE_C,
            max_temperature: MAX_TEMPERATURE_C,
        }
    }
}

impl SensorLimits {
    /// Whether a decoded pair is plausible
    pub fn accepts(&self, humidity: f32, temperature: f32) -> bool {
        humidity <= self.max_humidity
            && temperature >= self.min_temperature
            && temperature <= self.max_temperature
    }
}

/// Everything a read needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Trigger pulse length (ms)
    pub trigger_low_ms: u32,
    /// Interval between completion checks (ms)
    pub poll_interval_ms: u32,
    /// Completion checks before timing out
    pub poll_attempts: u8,
    /// Decoder thresholds
    pub timing: PulseTiming,
    /// Plausibility limits
    pub limits: SensorLimits,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            trigger_low_ms: TRIGGER_LOW_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            poll_attempts: POLL_ATTEMPTS,
            timing: PulseTiming::default(),
            limits: SensorLimits::default(),
        }
    }
}

impl SensorConfig {
    /// Trigger pulse length
    pub fn trigger_low(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.trigger_low_ms)
    }

    /// Interval between completion checks
    pub fn poll_interval(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.poll_interval_ms)
    }

    /// Total time a read waits for a frame after triggering
    pub fn poll_budget(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.poll_interval_ms.saturating_mul(u32::from(self.poll_attempts)))
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_low_ms == 0 {
            return Err(ConfigError::Invalid("trigger_low_ms must be at least 1"));
        }
        if self.poll_attempts == 0 || self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll budget must be non-zero"));
        }
        if self.limits.min_temperature >= self.limits.max_temperature {
            return Err(ConfigError::Invalid("min_temperature must be below max_temperature"));
        }
        self.timing.validate()
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&text)
    }
}
