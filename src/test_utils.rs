//! Test utilities for synthesizing Annex-B H.264 streams
//!
//! Fixtures are generated in memory so tests and benches never depend on
//! recorded footage being present in the checkout.

#![cfg(any(test, feature = "benchmark"))]

/// 4-byte Annex-B start code
pub const START_CODE_4: [u8; 4] = [0x00, 0x00, 0x00, 0x01];
/// 3-byte Annex-B start code
pub const START_CODE_3: [u8; 3] = [0x00, 0x00, 0x01];

/// NAL header bytes in stream order: SPS, PPS, IDR slice, then non-IDR slices
const SPS: u8 = 0x67;
const PPS: u8 = 0x68;
const IDR: u8 = 0x65;
const SLICE: u8 = 0x41;

/// Build a stream of `count` NAL units with `payload_len` body bytes each.
///
/// Parameter sets and the IDR slice use 4-byte start codes, later slices
/// 3-byte ones. Payload bytes are never zero, so no start code can appear
/// inside a body. Segmenting the stream yields `count - 1` frames: the final
/// NAL has no closing boundary.
pub fn annex_b_stream(count: usize, payload_len: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(count * (payload_len + 5));

    for index in 0..count {
        let header = match index {
            0 => SPS,
            1 => PPS,
            2 => IDR,
            _ => SLICE,
        };
        if index < 3 {
            stream.extend_from_slice(&START_CODE_4);
        } else {
            stream.extend_from_slice(&START_CODE_3);
        }
        stream.push(header);
        stream.extend((0..payload_len).map(|j| (j % 254) as u8 + 1));
    }

    stream
}

/// Build a stream of `count` slices whose body carries its position.
///
/// Use [`frame_index`] to recover the position from a delivered frame.
/// Positions wrap after 255.
pub fn indexed_stream(count: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(count * 6);
    for index in 0..count {
        stream.extend_from_slice(&START_CODE_3);
        stream.extend_from_slice(&[SLICE, 0xFF, index as u8, 0xFF]);
    }
    stream
}

/// Position of a frame produced from [`indexed_stream`].
pub fn frame_index(frame: &[u8]) -> Option<u8> {
    match frame {
        [0x00, 0x00, 0x01, SLICE, 0xFF, index, 0xFF] => Some(*index),
        _ => None,
    }
}
