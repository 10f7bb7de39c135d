//! Decoded readings and their status
//!
//! A reading is produced once per completed frame, or as a timeout when no
//! frame completed. Sensor failures are values here, not errors: a flaky
//! wire must not abort a monitoring loop.

use core::fmt;

use serde::Serialize;
use thiserror_no_std::Error;

use crate::config::SensorLimits;
use crate::constants::{STATUS_BAD_CHECKSUM, STATUS_BAD_DATA, STATUS_GOOD, STATUS_TIMEOUT};

/// Outcome of a read
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    /// Checksum matched and values are plausible
    #[error("good")]
    Good,
    /// Checksum byte does not match the data bytes
    #[error("checksum mismatch")]
    BadChecksum,
    /// Values outside the plausibility limits
    #[error("values out of range")]
    BadRange,
    /// No complete frame within the poll budget
    #[error("sensor timeout")]
    Timeout,
}

impl ReadingStatus {
    /// Numeric code used by the daemon helpers
    pub const fn code(self) -> u8 {
        match self {
            ReadingStatus::Good => STATUS_GOOD,
            ReadingStatus::BadChecksum => STATUS_BAD_CHECKSUM,
            ReadingStatus::BadRange => STATUS_BAD_DATA,
            ReadingStatus::Timeout => STATUS_TIMEOUT,
        }
    }
}

/// Humidity and temperature from one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedReading {
    /// Relative humidity (%RH)
    pub humidity: f32,
    /// Temperature (°C)
    pub temperature: f32,
    /// How the reading was obtained
    pub status: ReadingStatus,
}

impl DecodedReading {
    /// Decode frame bytes in accumulator layout
    /// (`[checksum, temp_lo, temp_hi, hum_lo, hum_hi]`)
    ///
    /// A checksum mismatch yields zeroed values. A range failure keeps the
    /// decoded values for diagnostics.
    pub fn from_frame(bytes: [u8; 5], limits: &SensorLimits) -> Self {
        let [checksum, temp_lo, temp_hi, hum_lo, hum_hi] = bytes;
        let sum = temp_lo
            .wrapping_add(temp_hi)
            .wrapping_add(hum_lo)
            .wrapping_add(hum_hi);
        if sum != checksum {
            return Self::with_status(ReadingStatus::BadChecksum);
        }

        let humidity = f32::from(u16::from_be_bytes([hum_hi, hum_lo])) / 10.0;
        let magnitude = f32::from(u16::from_be_bytes([temp_hi & 0x7F, temp_lo])) / 10.0;
        let temperature = if temp_hi & 0x80 != 0 { -magnitude } else { magnitude };

        // A line stuck low reads as all zeros, which passes the checksum.
        let status = if bytes == [0; 5] || !limits.accepts(humidity, temperature) {
            ReadingStatus::BadRange
        } else {
            ReadingStatus::Good
        };

        Self {
            humidity,
            temperature,
            status,
        }
    }

    /// Reading for a read that never completed a frame
    pub const fn timeout() -> Self {
        Self::with_status(ReadingStatus::Timeout)
    }

    const fn with_status(status: ReadingStatus) -> Self {
        Self {
            humidity: 0.0,
            temperature: 0.0,
            status,
        }
    }

    /// Whether the values can be trusted
    pub fn is_good(&self) -> bool {
        self.status == ReadingStatus::Good
    }

    /// `(humidity, temperature)` if good, the status otherwise
    pub fn into_result(self) -> Result<(f32, f32), ReadingStatus> {
        match self.status {
            ReadingStatus::Good => Ok((self.humidity, self.temperature)),
            status => Err(status),
        }
    }
}

impl fmt::Display for DecodedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} °C, {:.1} %RH ({})",
            self.temperature, self.humidity, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accumulator-layout bytes for raw sensor words
    fn frame(humidity: u16, temperature: u16) -> [u8; 5] {
        let [hum_hi, hum_lo] = humidity.to_be_bytes();
        let [temp_hi, temp_lo] = temperature.to_be_bytes();
        let checksum = hum_hi
            .wrapping_add(hum_lo)
            .wrapping_add(temp_hi)
            .wrapping_add(temp_lo);
        [checksum, temp_lo, temp_hi, hum_lo, hum_hi]
    }

    #[test]
    fn decodes_nominal_frame() {
        let reading = DecodedReading::from_frame(frame(0x025D, 0x00C9), &SensorLimits::default());
        assert_eq!(reading.status, ReadingStatus::Good);
        assert_eq!(reading.humidity, 60.5);
        assert_eq!(reading.temperature, 20.1);
        assert_eq!(reading.to_string(), "20.1 °C, 60.5 %RH (good)");
    }

    #[test]
    fn checksum_is_sum_of_data_bytes() {
        // 0x00 + 0xC9 + 0x02 + 0x5D wraps to 0x28.
        assert_eq!(frame(0x025D, 0x00C9)[0], 0x28);
    }

    #[test]
    fn checksum_bit_flips_are_detected() {
        let limits = SensorLimits::default();
        let good = frame(0x025D, 0x00C9);
        for bit in 0..8 {
            let mut bad = good;
            bad[0] ^= 1 << bit;
            let reading = DecodedReading::from_frame(bad, &limits);
            assert_eq!(reading.status, ReadingStatus::BadChecksum, "bit {bit}");
            assert_eq!((reading.humidity, reading.temperature), (0.0, 0.0));
        }
    }

    #[test]
    fn sign_bit_negates_temperature() {
        let reading = DecodedReading::from_frame(frame(450, 0x8000 | 101), &SensorLimits::default());
        assert_eq!(reading.temperature, -10.1);
        assert!(reading.is_good());
    }

    #[test]
    fn range_boundaries() {
        let limits = SensorLimits::default();
        let at = |hum, temp| DecodedReading::from_frame(frame(hum, temp), &limits).status;

        assert_eq!(at(1100, 200), ReadingStatus::Good);
        assert_eq!(at(1101, 200), ReadingStatus::BadRange);
        assert_eq!(at(500, 0x8000 | 500), ReadingStatus::Good);
        assert_eq!(at(500, 0x8000 | 501), ReadingStatus::BadRange);
        assert_eq!(at(500, 1350), ReadingStatus::Good);
        assert_eq!(at(500, 1351), ReadingStatus::BadRange);
    }

    #[test]
    fn all_zero_frame_is_bad_range() {
        let reading = DecodedReading::from_frame([0; 5], &SensorLimits::default());
        assert_eq!(reading.status, ReadingStatus::BadRange);
    }

    #[test]
    fn status_codes_and_results() {
        assert_eq!(ReadingStatus::Good.code(), 0);
        assert_eq!(ReadingStatus::BadChecksum.code(), 1);
        assert_eq!(ReadingStatus::BadRange.code(), 2);
        assert_eq!(ReadingStatus::Timeout.code(), 3);

        assert_eq!(DecodedReading::timeout().into_result(), Err(ReadingStatus::Timeout));
        assert_eq!(DecodedReading::timeout().status.to_string(), "sensor timeout");
    }
}
