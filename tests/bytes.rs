use swo::*;

const HALF_BIT: usize = 4;

/// One Manchester bit cell: the bit value for the first half period,
/// its complement for the second.
fn push_cell(line: &mut Vec<bool>, bit: bool) {
    line.extend(std::iter::repeat(bit).take(HALF_BIT));
    line.extend(std::iter::repeat(!bit).take(HALF_BIT));
}

/// One frame: a start bit at logical one (consumed by synchronization),
/// then the bytes LSB-first.
fn push_frame(line: &mut Vec<bool>, bytes: &[u8]) {
    push_cell(line, true);
    for byte in bytes {
        for i in 0..8 {
            push_cell(line, byte >> i & 1 == 1);
        }
    }
}

/// An idle gap well past the 5/4 bit-time threshold.
fn push_idle(line: &mut Vec<bool>) {
    line.extend(std::iter::repeat(false).take(8 * HALF_BIT));
}

/// Packs line sub-samples into the capture stream format: 8 per byte,
/// oldest in bit 0. A trailing partial byte pads with idle-low.
fn pack(line: &[bool]) -> Vec<u8> {
    line.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0, |byte, (i, sample)| byte | (*sample as u8) << i)
        })
        .collect()
}

fn decode(stream: &[u8]) -> Vec<u8> {
    let mut decoder = Decoder::new(
        stream,
        DecoderOptions {
            ignore_eof: false,
            counter_width: 16,
        },
    );
    decoder.bytes().map(|byte| byte.unwrap()).collect()
}

#[test]
fn eof() {
    let empty: &[u8] = &[];
    let mut decoder = Decoder::new(
        empty,
        DecoderOptions {
            ignore_eof: false,
            counter_width: 16,
        },
    );

    assert!(decoder.bytes().next().is_none());
}

#[test]
fn decode_single_byte() {
    let mut line = Vec::new();
    push_idle(&mut line);
    push_frame(&mut line, &[0xa5]);
    push_idle(&mut line);

    assert_eq!(decode(&pack(&line)), [0xa5]);
}

#[test]
fn decode_multiple_frames() {
    let mut line = Vec::new();
    push_idle(&mut line);
    push_frame(&mut line, &[0x01, 0x23, 0x45]);
    push_idle(&mut line);
    push_frame(&mut line, &[0xff, 0x00]);
    push_idle(&mut line);

    assert_eq!(decode(&pack(&line)), [0x01, 0x23, 0x45, 0xff, 0x00]);
}

#[test]
fn partial_frame_is_discarded_on_resync() {
    let mut line = Vec::new();
    push_idle(&mut line);

    // A frame that dies after five data bits; the idle gap forces a
    // resynchronization and the next frame realigns the byte packing.
    push_cell(&mut line, true);
    for bit in [true, false, true, true, false].iter() {
        push_cell(&mut line, *bit);
    }
    push_idle(&mut line);

    push_frame(&mut line, &[0x5a]);
    push_idle(&mut line);

    assert_eq!(decode(&pack(&line)), [0x5a]);
}

#[test]
fn glitch_inside_a_full_bit_run_does_not_corrupt_decode() {
    let mut line = Vec::new();
    push_idle(&mut line);
    push_frame(&mut line, &[0x0f]);
    push_idle(&mut line);

    // The 1 -> 0 boundary between bits 3 and 4 of 0x0f merges two half
    // cells into one full-bit low run at sub-samples 68..76 (after 32
    // idle and five cells). Flip one early sub-sample in its middle;
    // the glitch splits the run into two half-bit pulses of the same
    // level, which decode to the same bit.
    assert!(!line[72]);
    line[72] = true;

    assert_eq!(decode(&pack(&line)), [0x0f]);
}

#[test]
fn pulse_tap_reports_run_lengths() {
    let mut line = Vec::new();
    push_idle(&mut line);
    push_cell(&mut line, true);
    push_cell(&mut line, true);

    let stream = pack(&line);
    let mut decoder = Decoder::new(
        stream.as_slice(),
        DecoderOptions {
            ignore_eof: false,
            counter_width: 16,
        },
    );

    let mut pulses = decoder.pulses();
    for (count, level) in [(32, false), (4, true), (4, false), (4, true)].iter() {
        assert_eq!(
            pulses.next().unwrap().unwrap(),
            Pulse {
                count: *count,
                level: *level
            }
        );
    }

    // The final low run never ends, so no pulse is reported for it.
    assert!(pulses.next().is_none());
}

#[test]
fn round_trip_is_exact_for_every_byte_value() {
    let bytes: Vec<u8> = (0..=255).collect();

    let mut line = Vec::new();
    push_idle(&mut line);
    push_frame(&mut line, &bytes);
    push_idle(&mut line);

    assert_eq!(decode(&pack(&line)), bytes);
}
