//! Simulated DHT22
//!
//! [`Dht22Device`] plugs into [`SimulatedGpio`](pulsebridge_core::SimulatedGpio)
//! and answers a trigger with a correctly timed edge train, optionally with
//! an injected fault.
//!
//! Pulse shape after the host releases the line at `t`:
//!
//! ```text
//! t+30   low    response low (80 µs)
//! t+110  high   response high (80 µs)
//! t+190  low    start of bit 0
//! per bit: 50 µs low, then 26 µs (zero) or 70 µs (one) high
//! after bit 39: 50 µs low, then released high
//! ```

use pulsebridge_core::sim::{Release, SimDevice, SimEdge};
use pulsebridge_core::{Level, Tick};

use crate::constants::FRAME_BYTES;

/// Delay before the sensor answers a release (µs)
const RESPONSE_DELAY_US: u32 = 30;
/// Response pulse, each half (µs)
const RESPONSE_HALF_US: u32 = 80;
/// Low phase before every bit and before the final release (µs)
const BIT_LOW_US: u32 = 50;
/// High phase of a zero bit (µs)
const ZERO_HIGH_US: u32 = 26;
/// High phase of a one bit (µs)
const ONE_HIGH_US: u32 = 70;
/// High phase of a glitched bit: wide enough to leave the one band (µs)
const GLITCH_HIGH_US: u32 = 130;
/// Shortest trigger the sensor responds to (µs)
const MIN_TRIGGER_US: u32 = 1_000;

/// Fault injected into the next answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip the lowest checksum bit
    FlipChecksumBit,
    /// Never answer
    Silent,
    /// Stretch the high phase of one bit (0-based) out of band
    GlitchAt(u8),
}

/// DHT22 model answering with a fixed frame
#[derive(Debug, Clone)]
pub struct Dht22Device {
    wire: [u8; FRAME_BYTES],
    fault: Option<Fault>,
}

impl Dht22Device {
    /// Sensor reporting `humidity` (%RH) and `temperature` (°C)
    pub fn new(humidity: f32, temperature: f32) -> Self {
        Self::from_wire(encode_frame(humidity, temperature))
    }

    /// Sensor sending `wire` verbatim, in wire order
    /// (`[hum_hi, hum_lo, temp_hi, temp_lo, checksum]`)
    pub fn from_wire(wire: [u8; FRAME_BYTES]) -> Self {
        Self {
            wire,
            fault: None,
        }
    }

    /// Inject `fault` into every answer
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Frame sent on the next answer, in wire order
    pub fn wire(&self) -> [u8; FRAME_BYTES] {
        let mut wire = self.wire;
        if self.fault == Some(Fault::FlipChecksumBit) {
            wire[FRAME_BYTES - 1] ^= 0x01;
        }
        wire
    }
}

impl SimDevice for Dht22Device {
    fn on_release(&mut self, release: Release) -> Vec<SimEdge> {
        let triggered = release.held_low_us.is_some_and(|held| held >= MIN_TRIGGER_US);
        if !triggered || self.fault == Some(Fault::Silent) {
            return Vec::new();
        }
        let glitch = match self.fault {
            Some(Fault::GlitchAt(bit)) => Some(bit),
            _ => None,
        };
        pulse_train(self.wire(), release.tick, glitch)
    }
}

/// Wire-order frame for physical values, with a valid checksum
///
/// Values are rounded to one decimal; negative temperatures set the sign bit.
pub fn encode_frame(humidity: f32, temperature: f32) -> [u8; FRAME_BYTES] {
    let humidity = (humidity * 10.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    let magnitude = (temperature.abs() * 10.0).round().clamp(0.0, f32::from(0x7FFF_u16)) as u16;
    let temperature = if temperature < 0.0 { magnitude | 0x8000 } else { magnitude };

    let [hum_hi, hum_lo] = humidity.to_be_bytes();
    let [temp_hi, temp_lo] = temperature.to_be_bytes();
    let checksum = hum_hi
        .wrapping_add(hum_lo)
        .wrapping_add(temp_hi)
        .wrapping_add(temp_lo);
    [hum_hi, hum_lo, temp_hi, temp_lo, checksum]
}

/// Edges the sensor drives for `wire` after a release at `release`
///
/// `glitch` stretches the high phase of that bit out of band.
pub fn pulse_train(wire: [u8; FRAME_BYTES], release: Tick, glitch: Option<u8>) -> Vec<SimEdge> {
    let mut edges = Vec::with_capacity(4 + FRAME_BYTES * 16);
    let mut tick = release.wrapping_add(RESPONSE_DELAY_US);
    edges.push(SimEdge::new(Level::Low, tick));
    tick = tick.wrapping_add(RESPONSE_HALF_US);
    edges.push(SimEdge::new(Level::High, tick));
    tick = tick.wrapping_add(RESPONSE_HALF_US);
    edges.push(SimEdge::new(Level::Low, tick));

    let bits = wire
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| byte & (1 << bit) != 0));
    for (index, bit) in bits.enumerate() {
        tick = tick.wrapping_add(BIT_LOW_US);
        edges.push(SimEdge::new(Level::High, tick));
        let high = match (glitch, bit) {
            (Some(g), _) if usize::from(g) == index => GLITCH_HIGH_US,
            (_, true) => ONE_HIGH_US,
            (_, false) => ZERO_HIGH_US,
        };
        tick = tick.wrapping_add(high);
        edges.push(SimEdge::new(Level::Low, tick));
    }

    tick = tick.wrapping_add(BIT_LOW_US);
    edges.push(SimEdge::new(Level::High, tick));
    edges
}

/// Rising-edge ticks the host sees for `wire`, including the release edge
pub fn rising_ticks(wire: [u8; FRAME_BYTES], release: Tick) -> Vec<Tick> {
    core::iter::once(release)
        .chain(
            pulse_train(wire, release, None)
                .into_iter()
                .filter(|edge| edge.level == Level::High)
                .map(|edge| edge.tick),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsebridge_core::LineId;

    fn release(held_low_us: Option<u32>) -> Release {
        Release {
            line: LineId::new(4, 31).unwrap(),
            tick: 1_000,
            held_low_us,
        }
    }

    #[test]
    fn encodes_nominal_values() {
        assert_eq!(encode_frame(60.5, 20.1), [0x02, 0x5D, 0x00, 0xC9, 0x28]);
        assert_eq!(encode_frame(45.0, -10.1), [0x01, 0xC2, 0x80, 0x65, 0xA8]);
    }

    #[test]
    fn rising_edges_have_protocol_gaps() {
        let ticks = rising_ticks(encode_frame(60.5, 20.1), 0);
        assert_eq!(ticks.len(), 43);
        assert_eq!(ticks[1] - ticks[0], 110);
        assert_eq!(ticks[2] - ticks[1], 130);
        // First data byte 0x02: six zeros, a one, a zero.
        let widths: Vec<u32> = ticks.windows(2).skip(2).take(8).map(|w| w[1] - w[0]).collect();
        assert_eq!(widths, [76, 76, 76, 76, 76, 76, 120, 76]);
    }

    #[test]
    fn short_trigger_is_ignored() {
        let mut device = Dht22Device::new(50.0, 20.0);
        assert!(device.on_release(release(Some(500))).is_empty());
        assert!(device.on_release(release(None)).is_empty());
        assert_eq!(device.on_release(release(Some(18_000))).len(), 84);
    }

    #[test]
    fn faults() {
        let mut silent = Dht22Device::new(50.0, 20.0).with_fault(Fault::Silent);
        assert!(silent.on_release(release(Some(18_000))).is_empty());

        let flipped = Dht22Device::new(60.5, 20.1).with_fault(Fault::FlipChecksumBit);
        assert_eq!(flipped.wire()[4], 0x29);
    }
}
