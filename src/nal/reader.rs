//! Async frame reader over any byte source

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use super::segmenter::{FrameSegmenter, Segment};
use crate::Result;
use crate::source::FrameSource;

const READ_CHUNK: usize = 64 * 1024;

/// Reads an Annex-B stream from `R` and yields whole frames.
///
/// Bytes are accumulated until the segmenter can close a frame; end of input
/// ends the frame sequence without an error.
pub struct FrameReader<R> {
    reader: R,
    segmenter: FrameSegmenter,
    bytes_read: u64,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, max_frame_size: usize) -> Self {
        Self { reader, segmenter: FrameSegmenter::new(max_frame_size), bytes_read: 0 }
    }

    /// Total bytes consumed from the underlying reader.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next complete frame.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - frame bytes, start code included
    /// - `Ok(None)` - the stream is exhausted
    /// - `Err(e)` - read failure or oversized frame
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.segmenter.next_segment()? {
                Segment::Frame(frame) => {
                    trace!("Segmented {} byte frame", frame.len());
                    return Ok(Some(frame));
                }
                Segment::Exhausted => return Ok(None),
                Segment::NeedMore => {
                    let buffer = self.segmenter.buffer_mut();
                    buffer.reserve(READ_CHUNK);
                    let n = self.reader.read_buf(buffer).await?;
                    if n == 0 {
                        debug!("Byte source reached end of stream after {} bytes", self.bytes_read);
                        self.segmenter.finish();
                    }
                    self.bytes_read += n as u64;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl<R> FrameSource for FrameReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        self.read_frame().await
    }
}
