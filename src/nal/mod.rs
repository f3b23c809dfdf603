//! H.264 Annex-B framing.
//!
//! Raw elementary streams are split into frames on start codes
//! (`00 00 01` or `00 00 00 01`):
//!
//! - [`find_start_code`] locates the next start code in a buffer
//! - [`FrameSegmenter`] turns an append-only buffer into whole frames
//! - [`FrameReader`] drives a segmenter from any `AsyncRead`
//!
//! ```rust
//! use liveview::nal::{FrameSegmenter, Segment};
//!
//! let mut segmenter = FrameSegmenter::default();
//! segmenter.push(&[0x00, 0x00, 0x01, 0xAA, 0xBB, 0x00, 0x00, 0x01, 0xCC]);
//!
//! match segmenter.next_segment().unwrap() {
//!     Segment::Frame(frame) => assert_eq!(frame.as_ref(), &[0x00, 0x00, 0x01, 0xAA, 0xBB]),
//!     other => panic!("unexpected {:?}", other),
//! }
//! assert_eq!(segmenter.next_segment().unwrap(), Segment::NeedMore);
//! ```

mod reader;
mod scanner;
mod segmenter;

pub use reader::FrameReader;
pub use scanner::{StartCode, find_start_code, start_code_at};
pub use segmenter::{DEFAULT_MAX_FRAME_SIZE, FrameSegmenter, Segment};

/// NAL unit types (low 5 bits of the header byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    /// Non-IDR slice (P or B frame)
    SliceNonIdr,
    /// Slice data partition A, B or C
    SliceDataPartition,
    /// IDR slice (keyframe)
    SliceIdr,
    /// Supplemental enhancement information
    Sei,
    /// Sequence parameter set
    Sps,
    /// Picture parameter set
    Pps,
    /// Access unit delimiter
    Aud,
    /// End of sequence or stream, filler data
    Other(u8),
}

impl From<u8> for NalUnitType {
    fn from(header: u8) -> Self {
        match header & 0x1F {
            1 => NalUnitType::SliceNonIdr,
            2..=4 => NalUnitType::SliceDataPartition,
            5 => NalUnitType::SliceIdr,
            6 => NalUnitType::Sei,
            7 => NalUnitType::Sps,
            8 => NalUnitType::Pps,
            9 => NalUnitType::Aud,
            n => NalUnitType::Other(n),
        }
    }
}

impl NalUnitType {
    pub fn is_keyframe(&self) -> bool {
        matches!(self, NalUnitType::SliceIdr)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NalUnitType::Sps | NalUnitType::Pps)
    }
}
