//! Property tests for the timing frame decoder
//!
//! Frames are generated as raw sensor words and driven through the decoder
//! as rising-edge ticks with jittered widths anywhere inside the bit bands.

mod common;

use proptest::prelude::*;
use pulsebridge_dht::{DecoderState, ReadingStatus, SensorLimits, TimingFrameDecoder};

use common::{edge_train, nominal, wire};

fn decode(start: u32, ticks: &[u32]) -> DecoderState {
    let mut decoder = TimingFrameDecoder::default();
    decoder.arm(start.wrapping_sub(20_000));
    let mut state = decoder.state();
    for &tick in ticks {
        state = decoder.feed(tick);
    }
    state
}

proptest! {
    #[test]
    fn jittered_frames_decode_to_their_words(
        humidity in 0u16..=1000,
        magnitude in 0u16..=800,
        negative in any::<bool>(),
        start in any::<u32>(),
        zeros in prop::collection::vec(60u32..=100, 40),
        ones in prop::collection::vec(101u32..=150, 40),
    ) {
        let temperature = if negative { magnitude | 0x8000 } else { magnitude };
        let ticks = edge_train(start, wire(humidity, temperature), |i, bit| {
            if bit { ones[i] } else { zeros[i] }
        });

        let DecoderState::Complete(reading) = decode(start, &ticks) else {
            return Err(TestCaseError::fail("frame did not complete"));
        };
        prop_assert_ne!(reading.status, ReadingStatus::BadChecksum);
        prop_assert_eq!(reading.humidity, f32::from(humidity) / 10.0);
        let expected = f32::from(magnitude) / 10.0;
        prop_assert_eq!(reading.temperature, if negative { -expected } else { expected });

        let plausible = SensorLimits::default().accepts(reading.humidity, reading.temperature);
        let all_zero = humidity == 0 && temperature == 0;
        prop_assert_eq!(reading.is_good(), plausible && !all_zero);
    }

    #[test]
    fn any_single_bit_flip_fails_the_checksum(
        humidity in any::<u16>(),
        temperature in any::<u16>(),
        flip in 0usize..40,
    ) {
        let mut frame = wire(humidity, temperature);
        frame[flip / 8] ^= 0x80 >> (flip % 8);
        let ticks = edge_train(30_000, frame, nominal);

        let DecoderState::Complete(reading) = decode(30_000, &ticks) else {
            return Err(TestCaseError::fail("frame did not complete"));
        };
        prop_assert_eq!(reading.status, ReadingStatus::BadChecksum);
        prop_assert_eq!((reading.humidity, reading.temperature), (0.0, 0.0));
    }

    #[test]
    fn out_of_band_width_aborts_at_that_bit(
        humidity in any::<u16>(),
        temperature in any::<u16>(),
        at in 0usize..40,
        bad in prop_oneof![0u32..60, 151u32..5_000],
    ) {
        let ticks = edge_train(30_000, wire(humidity, temperature), |i, bit| {
            if i == at { bad } else { nominal(i, bit) }
        });

        let DecoderState::Aborted(aborted) = decode(30_000, &ticks) else {
            return Err(TestCaseError::fail("frame did not abort"));
        };
        prop_assert_eq!(usize::from(aborted.at_bit), at);
        prop_assert_eq!(aborted.width_us, bad);
    }

    #[test]
    fn arbitrary_edges_keep_poll_consistent(
        arm in any::<u32>(),
        gaps in prop::collection::vec(0u32..40_000, 0..200),
    ) {
        let mut decoder = TimingFrameDecoder::default();
        decoder.arm(arm);
        let mut tick = arm;
        for gap in gaps {
            tick = tick.wrapping_add(gap);
            let state = decoder.feed(tick);
            match state {
                DecoderState::Complete(reading) => prop_assert_eq!(decoder.poll(), Ok(reading)),
                DecoderState::Aborted(aborted) => {
                    prop_assert!(matches!(decoder.poll(), Err(nb::Error::Other(a)) if a == aborted));
                }
                DecoderState::Idle | DecoderState::Collecting { .. } => {
                    prop_assert!(matches!(decoder.poll(), Err(nb::Error::WouldBlock)));
                }
            }
            if let DecoderState::Collecting { bits } = state {
                prop_assert!(bits < 40);
            }
        }
    }
}
