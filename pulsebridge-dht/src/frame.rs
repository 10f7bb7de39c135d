//! 40-bit timing frame accumulator
//!
//! Bits are shifted in most-significant first, so the first byte on the wire
//! ends up in the highest byte of the accumulator. Read back little-endian,
//! the layout is:
//!
//! ```text
//! bytes():  [0]       [1]      [2]      [3]     [4]
//!           checksum  temp_lo  temp_hi  hum_lo  hum_hi
//! wire:     5th       4th      3rd      2nd     1st
//! ```

use crate::constants::FRAME_BITS;

/// Whether the frame still accepts bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Fewer than 40 bits accepted
    Collecting,
    /// Exactly 40 bits accepted
    Complete,
}

/// Accumulator for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingFrame {
    acc: u64,
    bit_count: i32,
    status: FrameStatus,
}

impl TimingFrame {
    /// Empty frame that skips `preamble_edges` edges before the first bit
    pub fn start(preamble_edges: u8) -> Self {
        Self {
            acc: 0,
            bit_count: -i32::from(preamble_edges),
            status: FrameStatus::Collecting,
        }
    }

    /// Signed edge counter: negative while in the preamble
    pub fn bit_count(&self) -> i32 {
        self.bit_count
    }

    /// Data bits accepted so far
    pub fn accepted_bits(&self) -> u8 {
        self.bit_count.clamp(0, i32::from(FRAME_BITS)) as u8
    }

    /// Whether the next edge is still a preamble edge
    pub fn in_preamble(&self) -> bool {
        self.bit_count < 0
    }

    /// Current status
    pub fn status(&self) -> FrameStatus {
        self.status
    }

    /// Count a preamble edge without taking a bit
    pub fn skip_edge(&mut self) {
        if self.in_preamble() {
            self.bit_count += 1;
        }
    }

    /// Shift in one data bit
    ///
    /// Ignored once the frame is complete.
    pub fn push_bit(&mut self, bit: bool) -> FrameStatus {
        if self.status == FrameStatus::Collecting && !self.in_preamble() {
            self.acc = (self.acc << 1) | u64::from(bit);
            self.bit_count += 1;
            if self.bit_count == i32::from(FRAME_BITS) {
                self.status = FrameStatus::Complete;
            }
        }
        self.status
    }

    /// Frame bytes in the little-endian layout above
    pub fn bytes(&self) -> [u8; 5] {
        let le = self.acc.to_le_bytes();
        [le[0], le[1], le[2], le[3], le[4]]
    }

    /// Raw 40-bit value
    pub fn raw(&self) -> u64 {
        self.acc
    }
}
