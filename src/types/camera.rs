//! Camera selection, lens source and quality tier enums

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::LiveViewError;

/// Camera a live-view session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraType {
    /// Forward-view (FPV) camera
    Fpv,
    /// Payload (gimbal) camera
    Payload,
}

impl CameraType {
    /// Raw integer code used by native bindings.
    pub fn code(self) -> i32 {
        match self {
            CameraType::Fpv => 0,
            CameraType::Payload => 1,
        }
    }

    /// Whether this camera supports switching between lens sources.
    pub fn supports_source_switch(self) -> bool {
        matches!(self, CameraType::Payload)
    }
}

impl TryFrom<i32> for CameraType {
    type Error = LiveViewError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CameraType::Fpv),
            1 => Ok(CameraType::Payload),
            other => Err(LiveViewError::invalid_argument(format!("unknown camera type {other}"))),
        }
    }
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraType::Fpv => f.write_str("fpv"),
            CameraType::Payload => f.write_str("payload"),
        }
    }
}

/// Lens source of the payload camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSource {
    /// Wide-angle lens
    Wide,
    /// Zoom lens
    Zoom,
    /// Infrared lens
    Infrared,
}

impl CameraSource {
    /// Raw integer code used by native bindings.
    pub fn code(self) -> i32 {
        match self {
            CameraSource::Wide => 1,
            CameraSource::Zoom => 2,
            CameraSource::Infrared => 3,
        }
    }
}

impl TryFrom<i32> for CameraSource {
    type Error = LiveViewError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(CameraSource::Wide),
            2 => Ok(CameraSource::Zoom),
            3 => Ok(CameraSource::Infrared),
            other => Err(LiveViewError::invalid_argument(format!("unknown camera source {other}"))),
        }
    }
}

impl fmt::Display for CameraSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSource::Wide => f.write_str("wide"),
            CameraSource::Zoom => f.write_str("zoom"),
            CameraSource::Infrared => f.write_str("infrared"),
        }
    }
}

/// Fixed encoding profile behind a [`StreamQuality`] tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Target bitrate in bits per second
    pub bitrate: u32,
}

/// Requested stream quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamQuality {
    /// 960x540 @ 30fps, 512 Kib/s
    #[serde(rename = "540p")]
    Q540p,
    /// 1280x720 @ 30fps, 1024 Kib/s
    #[serde(rename = "720p")]
    Q720p,
    /// 1280x720 @ 30fps, 1536 Kib/s
    #[serde(rename = "720p_high")]
    Q720pHigh,
    /// 1920x1080 @ 30fps, 3072 Kib/s
    #[serde(rename = "1080p")]
    Q1080p,
}

impl StreamQuality {
    /// All tiers in ascending order.
    pub const ALL: [StreamQuality; 4] =
        [StreamQuality::Q540p, StreamQuality::Q720p, StreamQuality::Q720pHigh, StreamQuality::Q1080p];

    /// Raw integer code used by native bindings.
    pub fn code(self) -> i32 {
        match self {
            StreamQuality::Q540p => 1,
            StreamQuality::Q720p => 2,
            StreamQuality::Q720pHigh => 3,
            StreamQuality::Q1080p => 4,
        }
    }

    pub fn profile(self) -> QualityProfile {
        const KIB: u32 = 1024;
        match self {
            StreamQuality::Q540p => {
                QualityProfile { width: 960, height: 540, fps: 30, bitrate: 512 * KIB }
            }
            StreamQuality::Q720p => {
                QualityProfile { width: 1280, height: 720, fps: 30, bitrate: 1024 * KIB }
            }
            StreamQuality::Q720pHigh => {
                QualityProfile { width: 1280, height: 720, fps: 30, bitrate: 1536 * KIB }
            }
            StreamQuality::Q1080p => {
                QualityProfile { width: 1920, height: 1080, fps: 30, bitrate: 3072 * KIB }
            }
        }
    }

    /// Nominal interval between frames at this tier's frame rate.
    pub fn frame_interval(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.profile().fps as f64)
    }
}

impl TryFrom<i32> for StreamQuality {
    type Error = LiveViewError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(StreamQuality::Q540p),
            2 => Ok(StreamQuality::Q720p),
            3 => Ok(StreamQuality::Q720pHigh),
            4 => Ok(StreamQuality::Q1080p),
            other => Err(LiveViewError::invalid_argument(format!("unknown stream quality {other}"))),
        }
    }
}

impl fmt::Display for StreamQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamQuality::Q540p => f.write_str("540p"),
            StreamQuality::Q720p => f.write_str("720p"),
            StreamQuality::Q720pHigh => f.write_str("720p-high"),
            StreamQuality::Q1080p => f.write_str("1080p"),
        }
    }
}
