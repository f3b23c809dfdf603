//! Device traits: the camera hardware (or its simulation) behind a session

use crate::Result;
use crate::source::FrameSource;
use crate::types::{CameraSource, CameraType, StreamQuality, StreamStatus};

/// A device that can hand out exclusive camera handles
///
/// A real binding wraps the vendor SDK; [`SimulatedDevice`](crate::devices::SimulatedDevice)
/// replays an Annex-B file. One device may be shared by several sessions.
#[async_trait::async_trait]
pub trait Device: Send + Sync + 'static {
    /// Acquire the given camera at the requested quality.
    ///
    /// Fails with a resource-unavailable error when the camera cannot be
    /// claimed, for example because another session already holds it.
    async fn acquire(
        &self,
        camera: CameraType,
        quality: StreamQuality,
    ) -> Result<Box<dyn CameraHandle>>;
}

/// Exclusive handle to one acquired camera
///
/// Owned by a single session; only that session's operations and loops touch it.
#[async_trait::async_trait]
pub trait CameraHandle: Send + 'static {
    /// Switch the lens the stream is taken from.
    async fn set_source(&mut self, source: CameraSource) -> Result<()>;

    /// Start the encoded stream and return its frame source.
    ///
    /// Real devices may block here for several seconds waiting for the
    /// stream to become available.
    async fn open_stream(&mut self) -> Result<Box<dyn FrameSource>>;

    /// Stop the encoded stream.
    async fn close_stream(&mut self) -> Result<()>;

    /// Link-quality feed polled by the status loop.
    fn status_feed(&mut self) -> Box<dyn StatusFeed>;

    /// Release the camera. Called exactly once by the owning session.
    fn release(&mut self);
}

/// Producer of link-quality snapshots
pub trait StatusFeed: Send + 'static {
    /// Called once per status tick. `None` means nothing to report this tick.
    fn poll_status(&mut self) -> Option<StreamStatus>;
}
