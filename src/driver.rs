//! Driver spawns and manages the stream loops
//!
//! A streaming session runs three loops:
//!
//! - **Pacing**: pulls one frame from the [`FrameSource`] per tick and offers
//!   it to the delivery channel, dropping it when the channel is full
//! - **Dispatch**: drains the delivery channel into the consumer callback on
//!   the blocking pool, so a slow callback never holds up the async runtime
//! - **Status**: polls a [`StatusFeed`] on its own interval, from init until destroy
//!
//! The pacing and status loops race their timer against a cancellation token
//! with the token checked first, so teardown never waits for the next tick.
//! The dispatch loop wakes when pacing drops its sender and discards whatever
//! is still queued once cancelled.

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::device::StatusFeed;
use crate::receiver::StreamReceiver;
use crate::source::FrameSource;
use crate::types::Frame;

/// Consumer registration shared between a session and its loops
pub(crate) type ReceiverSlot = Arc<RwLock<Option<Arc<dyn StreamReceiver>>>>;

/// Log every Nth backpressure drop after the first
const DROP_LOG_EVERY: u64 = 100;

/// Live counters updated by the stream loops
#[derive(Debug, Default)]
pub(crate) struct StreamStats {
    segmented: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    peak_depth: AtomicUsize,
    exhausted: AtomicBool,
    failed: AtomicBool,
}

impl StreamStats {
    /// Clear the per-run end-of-stream flags before a new pipeline starts.
    pub(crate) fn begin_run(&self) {
        self.exhausted.store(false, Ordering::SeqCst);
        self.failed.store(false, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            frames_segmented: self.segmented.load(Ordering::SeqCst),
            frames_delivered: self.delivered.load(Ordering::SeqCst),
            frames_dropped: self.dropped.load(Ordering::SeqCst),
            peak_queue_depth: self.peak_depth.load(Ordering::SeqCst),
            source_exhausted: self.exhausted.load(Ordering::SeqCst),
            source_failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of a session's stream counters
///
/// Frame counters accumulate over every stream the session has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStatsSnapshot {
    /// Frames produced by the frame source
    pub frames_segmented: u64,
    /// Frames handed to the consumer callback
    pub frames_delivered: u64,
    /// Frames dropped because the delivery channel was full
    pub frames_dropped: u64,
    /// Highest delivery channel occupancy observed
    pub peak_queue_depth: usize,
    /// The current stream's source reached its end
    pub source_exhausted: bool,
    /// The current stream's source failed and its pacing loop stopped
    pub source_failed: bool,
}

/// Pacing parameters fixed at stream start
#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineOptions {
    pub frame_interval: Duration,
    pub channel_capacity: usize,
}

/// A group of spawned loops sharing one cancellation token
pub(crate) struct LoopSet {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl LoopSet {
    /// Signal every loop to stop without waiting.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Signal every loop to stop and wait for them, aborting any that
    /// outlive `timeout`.
    ///
    /// Abort cannot interrupt the dispatch loop mid-callback; it is detached
    /// and exits once the callback returns.
    pub(crate) async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();
        let deadline = Instant::now() + timeout;

        for (name, mut handle) in self.tasks {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => trace!("{} loop joined", name),
                Ok(Err(e)) if e.is_panic() => error!("{} loop panicked: {}", name, e),
                Ok(Err(e)) => debug!("{} loop was aborted: {}", name, e),
                Err(_) => {
                    warn!("{} loop did not exit within {:?}, aborting", name, timeout);
                    handle.abort();
                }
            }
        }
    }
}

/// Driver spawns the stream and status loops
pub(crate) struct Driver;

impl Driver {
    /// Spawn the pacing and dispatch loops for one stream
    ///
    /// The delivery channel is created here; its only sender moves into the
    /// pacing loop, so the channel closes exactly once, after pacing has
    /// fully stopped.
    pub(crate) fn spawn_pipeline<S>(
        source: S,
        receiver: ReceiverSlot,
        stats: Arc<StreamStats>,
        options: PipelineOptions,
        cancel: CancellationToken,
    ) -> LoopSet
    where
        S: FrameSource,
    {
        let (frame_tx, frame_rx) = mpsc::channel(options.channel_capacity);

        let pacing = tokio::spawn(Self::pacing_task(
            source,
            frame_tx,
            Arc::clone(&stats),
            options.frame_interval,
            cancel.clone(),
        ));
        let dispatch = {
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || Self::dispatch_loop(frame_rx, receiver, stats, cancel))
        };

        LoopSet { cancel, tasks: vec![("pacing", pacing), ("dispatch", dispatch)] }
    }

    /// Spawn the status loop
    ///
    /// The first report is produced one full interval after spawning.
    pub(crate) fn spawn_status(
        feed: Box<dyn StatusFeed>,
        receiver: ReceiverSlot,
        period: Duration,
        cancel: CancellationToken,
    ) -> LoopSet {
        let status = tokio::spawn(Self::status_task(feed, receiver, period, cancel.clone()));
        LoopSet { cancel, tasks: vec![("status", status)] }
    }

    /// Pacing loop - one frame per tick, never blocks on the channel
    async fn pacing_task<S>(
        mut source: S,
        frame_tx: mpsc::Sender<Bytes>,
        stats: Arc<StreamStats>,
        period: Duration,
        cancel: CancellationToken,
    ) where
        S: FrameSource,
    {
        info!(?period, "Pacing loop started");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frame_count = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Pacing loop cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Pacing loop cancelled during read");
                    break;
                }
                result = source.next_frame() => result,
            };

            match result {
                Ok(Some(frame)) => {
                    frame_count += 1;
                    stats.segmented.fetch_add(1, Ordering::SeqCst);
                    trace!("Frame {}: {} bytes", frame_count, frame.len());

                    match frame_tx.try_send(frame) {
                        Ok(()) => {
                            let depth = frame_tx.max_capacity() - frame_tx.capacity();
                            stats.peak_depth.fetch_max(depth, Ordering::SeqCst);
                        }
                        Err(TrySendError::Full(_)) => {
                            let dropped = stats.dropped.fetch_add(1, Ordering::SeqCst) + 1;
                            if dropped == 1 || dropped % DROP_LOG_EVERY == 0 {
                                warn!(dropped, "Delivery channel full, dropping frame");
                            }
                        }
                        Err(TrySendError::Closed(_)) => {
                            debug!("Dispatch loop gone, stopping pacing");
                            break;
                        }
                    }
                }
                Ok(None) => {
                    info!("Frame source exhausted after {} frames", frame_count);
                    stats.exhausted.store(true, Ordering::SeqCst);
                    break;
                }
                Err(e) => {
                    error!("Frame source failed after {} frames: {}", frame_count, e);
                    stats.failed.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }

        info!("Pacing loop ended ({} frames segmented)", frame_count);
    }

    /// Dispatch loop - hands queued frames to the consumer in order
    ///
    /// Runs on a blocking-pool thread. It ends when the channel closes, which
    /// happens as soon as pacing stops, or at the first frame seen after
    /// cancellation.
    fn dispatch_loop(
        mut frame_rx: mpsc::Receiver<Bytes>,
        receiver: ReceiverSlot,
        stats: Arc<StreamStats>,
        cancel: CancellationToken,
    ) {
        debug!("Dispatch loop started");

        while let Some(frame) = frame_rx.blocking_recv() {
            if cancel.is_cancelled() {
                debug!("Dispatch loop cancelled with {} frames queued", frame_rx.len() + 1);
                break;
            }

            let consumer = receiver.read().unwrap_or_else(PoisonError::into_inner).clone();
            match consumer {
                Some(consumer) => {
                    consumer.on_frame(Frame::new(&frame));
                    stats.delivered.fetch_add(1, Ordering::SeqCst);
                }
                None => trace!("No receiver registered, frame discarded"),
            }
        }

        frame_rx.close();
        debug!("Dispatch loop ended");
    }

    /// Status loop - forwards one snapshot per tick, no queueing
    async fn status_task(
        mut feed: Box<dyn StatusFeed>,
        receiver: ReceiverSlot,
        period: Duration,
        cancel: CancellationToken,
    ) {
        debug!(?period, "Status loop started");
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(status) = feed.poll_status() else {
                continue;
            };
            trace!(%status, "Stream status");

            let consumer = receiver.read().unwrap_or_else(PoisonError::into_inner).clone();
            if let Some(consumer) = consumer {
                consumer.on_status(status);
            }
        }

        debug!("Status loop ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nal::FrameReader;
    use crate::test_utils::{annex_b_stream, frame_index, indexed_stream};
    use crate::types::StreamStatus;
    use crate::{LiveViewError, Result};
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<u8>>,
        statuses: Mutex<Vec<StreamStatus>>,
    }

    impl StreamReceiver for Recorder {
        fn on_frame(&self, frame: Frame<'_>) {
            if let Some(index) = frame_index(&frame) {
                self.frames.lock().unwrap().push(index);
            }
        }

        fn on_status(&self, status: StreamStatus) {
            self.statuses.lock().unwrap().push(status);
        }
    }

    struct FailingSource {
        remaining: usize,
    }

    #[async_trait::async_trait]
    impl FrameSource for FailingSource {
        async fn next_frame(&mut self) -> Result<Option<Bytes>> {
            if self.remaining == 0 {
                return Err(LiveViewError::Io {
                    source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "link lost"),
                });
            }
            self.remaining -= 1;
            Ok(Some(Bytes::from_static(&[0x00, 0x00, 0x01, 0x41, 0x01])))
        }
    }

    struct CountingFeed(u32);

    impl StatusFeed for CountingFeed {
        fn poll_status(&mut self) -> Option<StreamStatus> {
            self.0 += 1;
            Some(StreamStatus::new(self.0))
        }
    }

    fn slot(receiver: Arc<dyn StreamReceiver>) -> ReceiverSlot {
        Arc::new(RwLock::new(Some(receiver)))
    }

    fn options(ms: u64, capacity: usize) -> PipelineOptions {
        PipelineOptions { frame_interval: Duration::from_millis(ms), channel_capacity: capacity }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn frames_reach_consumer_in_order() {
        let recorder = Arc::new(Recorder::default());
        let stats = Arc::new(StreamStats::default());
        let source = FrameReader::new(Cursor::new(indexed_stream(20)), 1024);

        let loops = Driver::spawn_pipeline(
            source,
            slot(recorder.clone()),
            Arc::clone(&stats),
            options(1, 32),
            CancellationToken::new(),
        );

        wait_for(|| stats.snapshot().frames_delivered == 19).await;
        loops.shutdown(Duration::from_secs(1)).await;

        let frames = recorder.frames.lock().unwrap().clone();
        assert_eq!(frames, (0..19).collect::<Vec<u8>>());
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_segmented, 19);
        assert_eq!(snapshot.frames_dropped, 0);
        assert!(!snapshot.source_failed);
    }

    #[tokio::test]
    async fn absent_receiver_discards_frames() {
        let stats = Arc::new(StreamStats::default());
        let source = FrameReader::new(Cursor::new(annex_b_stream(6, 8)), 1024);

        let loops = Driver::spawn_pipeline(
            source,
            Arc::new(RwLock::new(None)),
            Arc::clone(&stats),
            options(1, 4),
            CancellationToken::new(),
        );

        wait_for(|| stats.snapshot().source_exhausted).await;
        loops.shutdown(Duration::from_secs(1)).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_segmented, 5);
        assert_eq!(snapshot.frames_delivered, 0);
    }

    #[tokio::test]
    async fn source_failure_ends_the_stream() {
        let recorder = Arc::new(Recorder::default());
        let stats = Arc::new(StreamStats::default());

        let loops = Driver::spawn_pipeline(
            FailingSource { remaining: 3 },
            slot(recorder.clone()),
            Arc::clone(&stats),
            options(1, 8),
            CancellationToken::new(),
        );

        wait_for(|| stats.snapshot().source_failed).await;
        loops.shutdown(Duration::from_secs(1)).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_segmented, 3);
        assert!(!snapshot.source_exhausted);
    }

    #[tokio::test]
    async fn cancel_interrupts_a_waiting_tick() {
        let stats = Arc::new(StreamStats::default());
        let source = FrameReader::new(Cursor::new(annex_b_stream(10, 8)), 1024);

        let loops = Driver::spawn_pipeline(
            source,
            Arc::new(RwLock::new(None)),
            Arc::clone(&stats),
            options(60_000, 4),
            CancellationToken::new(),
        );

        // First tick fires immediately, the second is a minute away
        wait_for(|| stats.snapshot().frames_segmented == 1).await;

        let started = std::time::Instant::now();
        loops.shutdown(Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(stats.snapshot().frames_segmented, 1);
    }

    #[tokio::test]
    async fn status_loop_reports_each_tick_in_order() {
        let recorder = Arc::new(Recorder::default());
        let loops = Driver::spawn_status(
            Box::new(CountingFeed(0)),
            slot(recorder.clone()),
            Duration::from_millis(5),
            CancellationToken::new(),
        );

        wait_for(|| recorder.statuses.lock().unwrap().len() >= 4).await;
        loops.shutdown(Duration::from_secs(1)).await;

        let values: Vec<u32> =
            recorder.statuses.lock().unwrap().iter().map(|status| status.value()).collect();
        assert!(values.windows(2).all(|pair| pair[1] == pair[0] + 1));
        assert_eq!(values[0], 1);
    }
}
