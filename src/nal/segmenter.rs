//! Incremental splitting of an Annex-B byte stream into frames

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use super::scanner::find_start_code;
use crate::{LiveViewError, Result};

/// Default ceiling on the bytes a single frame may span (2 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 2 * 1024 * 1024;

/// Outcome of one pull from a [`FrameSegmenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A complete frame: the first start code up to (excluding) the next one
    Frame(Bytes),
    /// No closing boundary is buffered yet; push more bytes and retry
    NeedMore,
    /// Input has ended and no further frame can be produced
    Exhausted,
}

/// Splits an append-only byte buffer into NAL-delimited frames.
///
/// A frame is only emitted once the start code of the *following* frame has
/// been seen, so a NAL unit still being received is never cut short. A
/// partial NAL left over at end of input is discarded.
#[derive(Debug)]
pub struct FrameSegmenter {
    buffer: BytesMut,
    max_frame_size: usize,
    finished: bool,
    /// Where the search for the closing start code resumes
    resume: usize,
}

impl FrameSegmenter {
    pub fn new(max_frame_size: usize) -> Self {
        Self { buffer: BytesMut::new(), max_frame_size, finished: false, resume: 0 }
    }

    /// Append stream bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Mark the end of input. Remaining complete frames are still yielded.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Pull the next frame out of the buffered bytes.
    ///
    /// Fails with [`LiveViewError::FrameTooLarge`] when the pending frame
    /// grows past the configured maximum instead of truncating it.
    pub fn next_segment(&mut self) -> Result<Segment> {
        let Some(first) = find_start_code(&self.buffer) else {
            if self.finished {
                self.buffer.clear();
                return Ok(Segment::Exhausted);
            }
            // Keep a possible partial start code at the tail
            let keep = self.buffer.len().min(3);
            let discard = self.buffer.len() - keep;
            if discard > 0 {
                trace!("Discarding {} bytes without a start code", discard);
                self.buffer.advance(discard);
            }
            return Ok(Segment::NeedMore);
        };

        if first.offset > 0 {
            trace!("Discarding {} bytes before first start code", first.offset);
            self.buffer.advance(first.offset);
            self.resume = 0;
        }

        let from = self.resume.max(first.width);
        match find_start_code(&self.buffer[from..]) {
            Some(next) => {
                let end = from + next.offset;
                if end > self.max_frame_size {
                    return Err(LiveViewError::FrameTooLarge {
                        limit: self.max_frame_size,
                        buffered: end,
                    });
                }
                self.resume = 0;
                Ok(Segment::Frame(self.buffer.split_to(end).freeze()))
            }
            None if self.finished => {
                trace!("Dropping {} byte partial NAL at end of stream", self.buffer.len());
                self.buffer.clear();
                self.resume = 0;
                Ok(Segment::Exhausted)
            }
            None if self.buffer.len() > self.max_frame_size => Err(LiveViewError::FrameTooLarge {
                limit: self.max_frame_size,
                buffered: self.buffer.len(),
            }),
            None => {
                // Every position before the last three bytes has been ruled out
                self.resume = self.buffer.len().saturating_sub(3).max(first.width);
                Ok(Segment::NeedMore)
            }
        }
    }
}

impl Default for FrameSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}
