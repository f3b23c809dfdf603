//! Frame source trait for stream backends

use bytes::Bytes;

use crate::Result;

/// Trait for sources of whole H.264 frames
///
/// Sources abstract over where frames come from (a file or socket run
/// through a [`FrameReader`](crate::nal::FrameReader), a native callback
/// buffer, an in-memory fixture). The pacing loop pulls one frame per tick.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Get the next frame
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - Frame bytes, start code included
    /// - `Ok(None)` - Stream ended (normal termination)
    /// - `Err(e)` - Error occurred; the pacing loop treats it as the end of the stream
    async fn next_frame(&mut self) -> Result<Option<Bytes>>;
}

#[async_trait::async_trait]
impl FrameSource for Box<dyn FrameSource> {
    async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        (**self).next_frame().await
    }
}
