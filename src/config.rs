//! Engine and simulation configuration
//!
//! Settings can be built in code or loaded from YAML:
//!
//! ```rust
//! use liveview::config::LiveViewSettings;
//! use liveview::types::{CameraType, StreamQuality};
//!
//! let settings = LiveViewSettings::from_yaml_str(
//!     r#"
//! camera: payload
//! quality: 720p_high
//! source: zoom
//! engine:
//!   channel_capacity: 16
//!   frame_interval_ms: 40
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.camera, CameraType::Payload);
//! assert_eq!(settings.quality, StreamQuality::Q720pHigh);
//! assert_eq!(settings.engine.channel_capacity, 16);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::nal::DEFAULT_MAX_FRAME_SIZE;
use crate::types::{CameraSource, CameraType, StreamQuality};
use crate::{LiveViewError, Result};

/// Options for the pacing, delivery and status loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveViewConfig {
    /// Delivery channel slots between the pacing and dispatch loops
    pub channel_capacity: usize,
    /// Pacing interval override; the quality tier's frame interval is used when unset
    pub frame_interval_ms: Option<u64>,
    /// Interval between status ticks
    pub status_interval_ms: u64,
    /// Upper bound on waiting for loops to exit during teardown
    pub join_timeout_ms: u64,
}

impl Default for LiveViewConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 10,
            frame_interval_ms: None,
            status_interval_ms: 2000,
            join_timeout_ms: 2000,
        }
    }
}

impl LiveViewConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(LiveViewError::invalid_argument("channel_capacity must be at least 1"));
        }
        if self.frame_interval_ms == Some(0) {
            return Err(LiveViewError::invalid_argument("frame_interval_ms must be positive"));
        }
        if self.status_interval_ms == 0 {
            return Err(LiveViewError::invalid_argument("status_interval_ms must be positive"));
        }
        if self.join_timeout_ms == 0 {
            return Err(LiveViewError::invalid_argument("join_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Pacing interval for the given tier.
    pub fn frame_interval(&self, quality: StreamQuality) -> Duration {
        match self.frame_interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None => quality.frame_interval(),
        }
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Options for [`SimulatedDevice`](crate::devices::SimulatedDevice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Annex-B H.264 file replayed as the camera stream
    pub stream_path: PathBuf,
    /// Delay before the stream opens, mimicking device warm-up
    pub start_delay_ms: u64,
    /// Ceiling on the bytes one frame may span
    pub max_frame_size: usize,
    /// Status ticks before the auto-quality flag turns on
    pub status_enable_after: u32,
    /// Status ticks before the synthetic link resets to its baseline
    pub status_cycle_ticks: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stream_path: PathBuf::from("edge_stream.h264"),
            start_delay_ms: 0,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            status_enable_after: 3,
            status_cycle_ticks: 180,
        }
    }
}

/// Complete settings file: what to stream and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveViewSettings {
    pub camera: CameraType,
    pub quality: StreamQuality,
    #[serde(default)]
    pub source: Option<CameraSource>,
    #[serde(default)]
    pub engine: LiveViewConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl LiveViewSettings {
    /// Parse and validate settings from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: LiveViewSettings = serde_yaml_ng::from_str(yaml)?;
        settings.engine.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| LiveViewError::Config {
            details: format!("cannot read {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::from_yaml_str(&yaml)
    }
}
