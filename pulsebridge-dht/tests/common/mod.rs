//! Shared helpers for DHT integration tests
//!
//! - Wire frames from raw sensor words
//! - Rising-edge trains with caller-chosen bit widths
//! - Loop and simulator setup for sequencer runs

#![allow(dead_code)]

use pulsebridge_core::Tick;

/// Gaps between the frame start edge and the first data edge
pub const PREAMBLE_GAPS: [u32; 2] = [110, 130];

/// Wire-order frame for raw humidity and temperature words
pub fn wire(humidity: u16, temperature: u16) -> [u8; 5] {
    let [hum_hi, hum_lo] = humidity.to_be_bytes();
    let [temp_hi, temp_lo] = temperature.to_be_bytes();
    let checksum = hum_hi
        .wrapping_add(hum_lo)
        .wrapping_add(temp_hi)
        .wrapping_add(temp_lo);
    [hum_hi, hum_lo, temp_hi, temp_lo, checksum]
}

/// Wire bits, most significant first
pub fn bits(wire: [u8; 5]) -> Vec<bool> {
    wire.iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| byte & (1 << bit) != 0))
        .collect()
}

/// Rising-edge ticks for `wire` starting at `start`
///
/// `width` picks the rising-to-rising width of bit `i` given its value.
pub fn edge_train(start: Tick, wire: [u8; 5], mut width: impl FnMut(usize, bool) -> u32) -> Vec<Tick> {
    let mut tick = start;
    let mut out = vec![tick];
    for gap in PREAMBLE_GAPS {
        tick = tick.wrapping_add(gap);
        out.push(tick);
    }
    for (index, bit) in bits(wire).into_iter().enumerate() {
        tick = tick.wrapping_add(width(index, bit));
        out.push(tick);
    }
    out
}

/// Nominal widths: 76 µs for a zero, 120 µs for a one
pub fn nominal(_: usize, bit: bool) -> u32 {
    if bit {
        120
    } else {
        76
    }
}
