//! Consumer callbacks and a channel-backed receiver

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, WatchStream};
use tracing::trace;

use crate::types::{Frame, StreamStatus};

/// Receives frames and status reports from a session
///
/// `on_frame` runs on a blocking-pool thread owned by the session: a slow
/// callback only fills the delivery channel, and frames get dropped upstream.
/// `on_status` runs on the async runtime and must not block. Frame bytes are
/// only borrowed for the duration of the call.
pub trait StreamReceiver: Send + Sync + 'static {
    /// Called once per delivered frame, in stream order.
    fn on_frame(&self, frame: Frame<'_>);

    /// Called once per link-quality report.
    fn on_status(&self, status: StreamStatus) {
        let _ = status;
    }
}

/// Receiver that copies frames into owned buffers and exposes them as streams
///
/// Frames go through a bounded channel; when the consumer of
/// [`ChannelReceiver::frames`] falls behind, new frames are dropped and
/// counted. Status uses latest-wins semantics.
pub struct ChannelReceiver {
    frame_tx: mpsc::Sender<Bytes>,
    frame_rx: Mutex<Option<mpsc::Receiver<Bytes>>>,
    status_tx: watch::Sender<Option<StreamStatus>>,
    dropped: AtomicU64,
}

impl ChannelReceiver {
    pub fn new(capacity: usize) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(capacity.max(1));
        let (status_tx, _) = watch::channel(None);
        Self { frame_tx, frame_rx: Mutex::new(Some(frame_rx)), status_tx, dropped: AtomicU64::new(0) }
    }

    /// Owned frames in delivery order. Only the first call gets the stream.
    pub fn frames(&self) -> Option<impl Stream<Item = Bytes> + 'static> {
        let rx = self.frame_rx.lock().unwrap_or_else(PoisonError::into_inner).take()?;
        Some(ReceiverStream::new(rx))
    }

    /// Status reports produced after subscribing.
    ///
    /// Earlier reports are not replayed; use [`latest_status`](Self::latest_status)
    /// for the current snapshot. A subscriber that falls behind sees only the
    /// newest report.
    pub fn status_updates(&self) -> impl Stream<Item = StreamStatus> + 'static {
        WatchStream::from_changes(self.status_tx.subscribe()).filter_map(|status| async move { status })
    }

    /// Most recent status report.
    pub fn latest_status(&self) -> Option<StreamStatus> {
        *self.status_tx.borrow()
    }

    /// Frames dropped because the frame stream was full or gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl StreamReceiver for ChannelReceiver {
    fn on_frame(&self, frame: Frame<'_>) {
        if self.frame_tx.try_send(frame.to_bytes()).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(dropped, "Channel receiver full, frame dropped");
        }
    }

    fn on_status(&self, status: StreamStatus) {
        self.status_tx.send_replace(Some(status));
    }
}
