//! Live-view session lifecycle
//!
//! [`LiveView`] owns one camera handle and the loops that move its stream to
//! a [`StreamReceiver`]. Every transition runs under a single async mutex, so
//! concurrent callers observe one consistent sequence of states:
//!
//! ```text
//! Uninitialized -> Initializing -> Ready <-> Streaming
//!                                    \          |
//!                                     +--> Destroyed (terminal)
//! ```
//!
//! ```rust,no_run
//! use liveview::{ChannelReceiver, LiveView, LiveViewConfig, StreamReceiver};
//! use liveview::config::SimulationConfig;
//! use liveview::devices::SimulatedDevice;
//! use liveview::types::{CameraType, StreamQuality};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> liveview::Result<()> {
//!     let device = Arc::new(SimulatedDevice::new(SimulationConfig::default()));
//!     let session = LiveView::new(device, LiveViewConfig::default())?;
//!
//!     let receiver = Arc::new(ChannelReceiver::new(32));
//!     let mut frames = Box::pin(receiver.frames().expect("fresh receiver"));
//!     let consumer: Arc<dyn StreamReceiver> = receiver.clone();
//!     session.init(CameraType::Payload, StreamQuality::Q720p, Some(consumer)).await?;
//!     session.start_stream().await?;
//!
//!     while let Some(frame) = frames.next().await {
//!         println!("{} bytes", frame.len());
//!     }
//!
//!     session.destroy().await;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{LiveViewConfig, LiveViewSettings};
use crate::device::{CameraHandle, Device};
use crate::devices::SimulatedDevice;
use crate::driver::{Driver, LoopSet, PipelineOptions, ReceiverSlot, StreamStats, StreamStatsSnapshot};
use crate::receiver::StreamReceiver;
use crate::types::{CameraSource, CameraType, SessionState, StreamQuality};
use crate::{LiveViewError, Result};


/// What the session was initialized with
#[derive(Debug, Clone, Copy, Default)]
struct Selection {
    camera: Option<CameraType>,
    quality: Option<StreamQuality>,
    source: Option<CameraSource>,
}

/// Resources owned by an initialized session
#[derive(Default)]
struct Resources {
    handle: Option<Box<dyn CameraHandle>>,
    status: Option<LoopSet>,
    pipeline: Option<LoopSet>,
}

/// A live video-stream session bound to one camera
///
/// Call [`destroy`](LiveView::destroy) when finished. Dropping an undestroyed
/// session cancels its loops and releases the camera without waiting for the
/// loops to exit.
pub struct LiveView {
    device: Arc<dyn Device>,
    config: LiveViewConfig,
    state: AtomicU8,
    selection: Mutex<Selection>,
    resources: tokio::sync::Mutex<Resources>,
    receiver: ReceiverSlot,
    stats: Arc<StreamStats>,
    cancel: CancellationToken,
}

impl LiveView {
    /// Create an uninitialized session over `device`.
    pub fn new(device: Arc<dyn Device>, config: LiveViewConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            device,
            config,
            state: AtomicU8::new(SessionState::Uninitialized as u8),
            selection: Mutex::new(Selection::default()),
            resources: tokio::sync::Mutex::new(Resources::default()),
            receiver: Arc::new(RwLock::new(None)),
            stats: Arc::new(StreamStats::default()),
            cancel: CancellationToken::new(),
        })
    }

    /// Create a session over a [`SimulatedDevice`] described by `settings`.
    ///
    /// The session is not initialized; pass `settings.camera` and
    /// `settings.quality` to [`init`](LiveView::init).
    pub fn simulated(settings: &LiveViewSettings) -> Result<Self> {
        let device = Arc::new(SimulatedDevice::new(settings.simulation.clone()));
        Self::new(device, settings.engine.clone())
    }

    /// Acquire the camera and start reporting link status
    ///
    /// Accepts typed values or raw integer codes. Re-initializing the
    /// same camera while `Ready` only replaces the receiver.
    pub async fn init<C, Q>(
        &self,
        camera: C,
        quality: Q,
        receiver: Option<Arc<dyn StreamReceiver>>,
    ) -> Result<()>
    where
        C: TryInto<CameraType>,
        Q: TryInto<StreamQuality>,
        LiveViewError: From<C::Error> + From<Q::Error>,
    {
        self.ensure_alive("init")?;
        let camera = camera.try_into()?;
        let quality = quality.try_into()?;
        let Some(receiver) = receiver else {
            return Err(LiveViewError::invalid_argument("a stream receiver is required"));
        };

        let mut resources = self.resources.lock().await;
        match self.state() {
            SessionState::Uninitialized => {}
            SessionState::Ready if self.camera() == Some(camera) => {
                self.register(receiver);
                debug!(%camera, "Session already initialized, receiver replaced");
                return Ok(());
            }
            state => return Err(LiveViewError::invalid_operation("init", state)),
        }

        let transition = Transition::begin(&self.state, SessionState::Initializing);
        let mut handle = match self.device.acquire(camera, quality).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(%camera, "Camera acquisition failed: {}", e);
                return Err(e);
            }
        };

        self.register(receiver);
        resources.status = Some(Driver::spawn_status(
            handle.status_feed(),
            Arc::clone(&self.receiver),
            self.config.status_interval(),
            self.cancel.child_token(),
        ));
        resources.handle = Some(handle);
        *self.selection() = Selection { camera: Some(camera), quality: Some(quality), source: None };

        transition.commit(SessionState::Ready);
        info!(%camera, %quality, "Session initialized");
        Ok(())
    }

    /// Switch the payload camera's lens
    pub async fn set_source<S>(&self, source: S) -> Result<()>
    where
        S: TryInto<CameraSource>,
        LiveViewError: From<S::Error>,
    {
        self.ensure_alive("set_source")?;
        let source = source.try_into()?;

        let mut resources = self.resources.lock().await;
        let state = self.state();
        if !matches!(state, SessionState::Ready | SessionState::Streaming) {
            return Err(LiveViewError::invalid_operation("set_source", state));
        }

        let camera = self.camera().ok_or(LiveViewError::NotInitialized { operation: "set_source" })?;
        if !camera.supports_source_switch() {
            return Err(LiveViewError::invalid_argument(format!(
                "camera {camera} has a single lens, cannot select {source}"
            )));
        }

        let handle = resources
            .handle
            .as_mut()
            .ok_or(LiveViewError::NotInitialized { operation: "set_source" })?;
        handle.set_source(source).await?;
        self.selection().source = Some(source);

        info!(%camera, %source, "Lens source switched");
        Ok(())
    }

    /// Open the camera stream and start the pacing and dispatch loops
    ///
    /// Returns `Ok(())` without a second pipeline when already streaming.
    /// Opening a real device stream can block for several seconds.
    pub async fn start_stream(&self) -> Result<()> {
        let mut resources = self.resources.lock().await;
        match self.state() {
            SessionState::Ready => {}
            SessionState::Streaming => {
                debug!("Stream already running");
                return Ok(());
            }
            state => return Err(LiveViewError::invalid_operation("start_stream", state)),
        }

        let quality = self.quality().ok_or(LiveViewError::NotInitialized { operation: "start_stream" })?;
        let handle = resources
            .handle
            .as_mut()
            .ok_or(LiveViewError::NotInitialized { operation: "start_stream" })?;
        let source = handle.open_stream().await?;

        let options = PipelineOptions {
            frame_interval: self.config.frame_interval(quality),
            channel_capacity: self.config.channel_capacity,
        };
        self.stats.begin_run();
        resources.pipeline = Some(Driver::spawn_pipeline(
            source,
            Arc::clone(&self.receiver),
            Arc::clone(&self.stats),
            options,
            self.cancel.child_token(),
        ));

        self.set_state(SessionState::Streaming);
        info!(%quality, interval = ?options.frame_interval, "Stream started");
        Ok(())
    }

    /// Stop the stream and wait for its loops to exit
    ///
    /// Frames still queued for the receiver are discarded. A no-op when
    /// `Ready`.
    pub async fn stop_stream(&self) -> Result<()> {
        let mut resources = self.resources.lock().await;
        match self.state() {
            SessionState::Streaming => {}
            SessionState::Ready => {
                debug!("Stream not running, nothing to stop");
                return Ok(());
            }
            state => return Err(LiveViewError::invalid_operation("stop_stream", state)),
        }

        self.teardown_stream(&mut resources).await;
        info!("Stream stopped");
        Ok(())
    }

    /// Stop everything and release the camera
    ///
    /// Valid from any state. Later calls are no-ops, and every other
    /// operation fails with [`LiveViewError::InvalidOperation`].
    pub async fn destroy(&self) {
        let mut resources = self.resources.lock().await;
        if self.state() == SessionState::Destroyed {
            debug!("Session already destroyed");
            return;
        }

        if self.state() == SessionState::Streaming {
            self.teardown_stream(&mut resources).await;
        }
        if let Some(status) = resources.status.take() {
            status.shutdown(self.config.join_timeout()).await;
        }
        if let Some(mut handle) = resources.handle.take() {
            handle.release();
        }

        self.cancel.cancel();
        *self.receiver.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.set_state(SessionState::Destroyed);
        info!("Session destroyed");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    /// Camera selected by the last successful `init`.
    pub fn camera(&self) -> Option<CameraType> {
        self.selection().camera
    }

    pub fn quality(&self) -> Option<StreamQuality> {
        self.selection().quality
    }

    /// Lens selected by the last successful `set_source`.
    pub fn source(&self) -> Option<CameraSource> {
        self.selection().source
    }

    pub fn config(&self) -> &LiveViewConfig {
        &self.config
    }

    /// Stream counters accumulated over the session's lifetime.
    pub fn stats(&self) -> StreamStatsSnapshot {
        self.stats.snapshot()
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn ensure_alive(&self, operation: &'static str) -> Result<()> {
        match self.state() {
            SessionState::Destroyed => Err(LiveViewError::invalid_operation(operation, SessionState::Destroyed)),
            _ => Ok(()),
        }
    }

    fn selection(&self) -> std::sync::MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, receiver: Arc<dyn StreamReceiver>) {
        *self.receiver.write().unwrap_or_else(PoisonError::into_inner) = Some(receiver);
    }

    async fn teardown_stream(&self, resources: &mut Resources) {
        if let Some(pipeline) = resources.pipeline.take() {
            pipeline.shutdown(self.config.join_timeout()).await;
        }
        if let Some(handle) = resources.handle.as_mut() {
            if let Err(e) = handle.close_stream().await {
                warn!("Closing camera stream failed: {}", e);
            }
        }
        self.set_state(SessionState::Ready);
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        if self.state() == SessionState::Destroyed {
            return;
        }

        warn!(state = %self.state(), "LiveView dropped without destroy, releasing camera");
        self.cancel.cancel();
        let resources = self.resources.get_mut();
        if let Some(pipeline) = resources.pipeline.take() {
            pipeline.cancel();
        }
        if let Some(mut handle) = resources.handle.take() {
            handle.release();
        }
    }
}

/// Intermediate state that reverts unless committed
///
/// Covers both error returns and the caller dropping the future mid-transition.
struct Transition<'a> {
    state: &'a AtomicU8,
    previous: u8,
    committed: bool,
}

impl<'a> Transition<'a> {
    fn begin(state: &'a AtomicU8, during: SessionState) -> Self {
        let previous = state.swap(during as u8, Ordering::SeqCst);
        Self { state, previous, committed: false }
    }

    fn commit(mut self, next: SessionState) {
        self.state.store(next as u8, Ordering::SeqCst);
        self.committed = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.state.store(self.previous, Ordering::SeqCst);
        }
    }
}
