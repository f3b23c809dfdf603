//! Simulated device replaying an Annex-B H.264 stream

use bytes::Bytes;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::device::{CameraHandle, Device, StatusFeed};
use crate::nal::FrameReader;
use crate::source::FrameSource;
use crate::types::{CameraSource, CameraType, StreamQuality, StreamStatus, status_bits};
use crate::{LiveViewError, Result};

/// Where the simulated camera reads its bytes from
#[derive(Debug, Clone)]
enum StreamFixture {
    File(PathBuf),
    Memory(Bytes),
}

#[derive(Debug, Default)]
struct DeviceCounters {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    streams_opened: AtomicUsize,
}

/// Device that replays a recorded stream in place of camera hardware
///
/// Each camera can be held by one handle at a time. The device is cheap to
/// share between sessions behind an `Arc`.
pub struct SimulatedDevice {
    fixture: StreamFixture,
    config: SimulationConfig,
    claimed: Arc<Mutex<HashSet<CameraType>>>,
    counters: Arc<DeviceCounters>,
}

impl SimulatedDevice {
    /// Replay the file named by `config.stream_path`.
    pub fn new(config: SimulationConfig) -> Self {
        let fixture = StreamFixture::File(config.stream_path.clone());
        Self::with_fixture(fixture, config)
    }

    /// Replay an in-memory stream.
    pub fn from_bytes(stream: impl Into<Bytes>, config: SimulationConfig) -> Self {
        Self::with_fixture(StreamFixture::Memory(stream.into()), config)
    }

    fn with_fixture(fixture: StreamFixture, config: SimulationConfig) -> Self {
        Self {
            fixture,
            config,
            claimed: Arc::new(Mutex::new(HashSet::new())),
            counters: Arc::new(DeviceCounters::default()),
        }
    }

    /// Number of successful camera acquisitions.
    pub fn acquisitions(&self) -> usize {
        self.counters.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of camera releases.
    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    /// Number of streams opened across all handles.
    pub fn streams_opened(&self) -> usize {
        self.counters.streams_opened.load(Ordering::SeqCst)
    }

    /// Whether some handle currently holds the camera.
    pub fn is_claimed(&self, camera: CameraType) -> bool {
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner).contains(&camera)
    }
}

#[async_trait::async_trait]
impl Device for SimulatedDevice {
    async fn acquire(
        &self,
        camera: CameraType,
        quality: StreamQuality,
    ) -> Result<Box<dyn CameraHandle>> {
        {
            let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
            if !claimed.insert(camera) {
                return Err(LiveViewError::resource_unavailable(format!(
                    "camera {camera} is already in use"
                )));
            }
        }
        self.counters.acquisitions.fetch_add(1, Ordering::SeqCst);
        info!(%camera, %quality, "Simulated camera acquired");

        Ok(Box::new(SimulatedCamera {
            camera,
            quality,
            source: None,
            fixture: self.fixture.clone(),
            config: self.config.clone(),
            claimed: Arc::clone(&self.claimed),
            counters: Arc::clone(&self.counters),
            released: false,
        }))
    }
}

/// Handle to a camera of a [`SimulatedDevice`]
pub struct SimulatedCamera {
    camera: CameraType,
    quality: StreamQuality,
    source: Option<CameraSource>,
    fixture: StreamFixture,
    config: SimulationConfig,
    claimed: Arc<Mutex<HashSet<CameraType>>>,
    counters: Arc<DeviceCounters>,
    released: bool,
}

impl SimulatedCamera {
    fn ensure_held(&self, operation: &'static str) -> Result<()> {
        if self.released {
            return Err(LiveViewError::NotInitialized { operation });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CameraHandle for SimulatedCamera {
    async fn set_source(&mut self, source: CameraSource) -> Result<()> {
        self.ensure_held("set_source")?;
        debug!(camera = %self.camera, %source, "Simulated lens switch");
        self.source = Some(source);
        Ok(())
    }

    async fn open_stream(&mut self) -> Result<Box<dyn FrameSource>> {
        self.ensure_held("open_stream")?;

        if self.config.start_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.start_delay_ms)).await;
        }

        let max_frame_size = self.config.max_frame_size;
        let source: Box<dyn FrameSource> = match &self.fixture {
            StreamFixture::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    LiveViewError::resource_unavailable_with_source(
                        format!("cannot open stream file {}", path.display()),
                        Box::new(e),
                    )
                })?;
                Box::new(FrameReader::new(file, max_frame_size))
            }
            StreamFixture::Memory(bytes) => {
                Box::new(FrameReader::new(Cursor::new(bytes.clone()), max_frame_size))
            }
        };

        self.counters.streams_opened.fetch_add(1, Ordering::SeqCst);
        info!(camera = %self.camera, quality = %self.quality, "Simulated stream opened");
        Ok(source)
    }

    async fn close_stream(&mut self) -> Result<()> {
        self.ensure_held("close_stream")?;
        debug!(camera = %self.camera, "Simulated stream closed");
        Ok(())
    }

    fn status_feed(&mut self) -> Box<dyn StatusFeed> {
        Box::new(SyntheticStatus::new(
            self.config.status_enable_after,
            self.config.status_cycle_ticks,
        ))
    }

    fn release(&mut self) {
        if self.released {
            warn!(camera = %self.camera, "Simulated camera released twice");
            return;
        }
        self.released = true;
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.camera);
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        info!(camera = %self.camera, "Simulated camera released");
    }
}

impl Drop for SimulatedCamera {
    fn drop(&mut self) {
        if !self.released {
            self.release();
        }
    }
}

/// Synthetic link that renegotiates quality on a fixed cycle
///
/// Starts with every flag off, turns auto-quality on after `enable_after`
/// ticks, and returns to the baseline once `cycle_ticks` have passed.
#[derive(Debug, Clone)]
pub struct SyntheticStatus {
    tick: u32,
    enable_after: u32,
    cycle_ticks: u32,
    current: StreamStatus,
}

impl SyntheticStatus {
    pub fn new(enable_after: u32, cycle_ticks: u32) -> Self {
        Self { tick: 0, enable_after, cycle_ticks, current: StreamStatus::default() }
    }
}

impl StatusFeed for SyntheticStatus {
    fn poll_status(&mut self) -> Option<StreamStatus> {
        if self.tick == self.enable_after {
            self.current = StreamStatus::new(1 << status_bits::QUALITY_AUTO);
        }
        if self.tick > self.cycle_ticks {
            self.tick = 0;
            self.current = StreamStatus::default();
        }
        self.tick += 1;
        Some(self.current)
    }
}
