//! Link-quality status reports

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StreamQuality;

/// Bit positions within a raw status code.
pub mod status_bits {
    pub const QUALITY_AUTO: u32 = 0;
    pub const QUALITY_540P: u32 = 1;
    pub const QUALITY_720P: u32 = 2;
    pub const QUALITY_720P_HIGH: u32 = 3;
    pub const QUALITY_1080P: u32 = 4;
}

/// Point-in-time link-quality report.
///
/// Each status event carries one immutable snapshot; there is no replay or
/// history beyond the event itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamStatus(u32);

impl StreamStatus {
    /// Decode a raw status code.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw status code as reported by the link.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Check if a specific bit is set.
    pub fn is_set(&self, bit: u32) -> bool {
        bit < 32 && (self.0 & (1 << bit)) != 0
    }

    pub fn quality_auto_available(&self) -> bool {
        self.is_set(status_bits::QUALITY_AUTO)
    }

    pub fn quality_540p_available(&self) -> bool {
        self.is_set(status_bits::QUALITY_540P)
    }

    pub fn quality_720p_available(&self) -> bool {
        self.is_set(status_bits::QUALITY_720P)
    }

    pub fn quality_720p_high_available(&self) -> bool {
        self.is_set(status_bits::QUALITY_720P_HIGH)
    }

    pub fn quality_1080p_available(&self) -> bool {
        self.is_set(status_bits::QUALITY_1080P)
    }

    /// Whether the link currently offers the given tier.
    pub fn is_quality_available(&self, quality: StreamQuality) -> bool {
        match quality {
            StreamQuality::Q540p => self.quality_540p_available(),
            StreamQuality::Q720p => self.quality_720p_available(),
            StreamQuality::Q720pHigh => self.quality_720p_high_available(),
            StreamQuality::Q1080p => self.quality_1080p_available(),
        }
    }
}

impl From<u32> for StreamStatus {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value:{} auto:{} 540p:{} 720p:{} 720ph:{} 1080p:{}",
            self.0,
            self.quality_auto_available(),
            self.quality_540p_available(),
            self.quality_720p_available(),
            self.quality_720p_high_available(),
            self.quality_1080p_available()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_alternating_bits() {
        let status = StreamStatus::new(0b10101);
        assert_eq!(status.value(), 21);
        // Bits 0, 2 and 4: auto, 720p and 1080p
        assert!(status.quality_auto_available());
        assert!(!status.quality_540p_available());
        assert!(status.quality_720p_available());
        assert!(!status.quality_720p_high_available());
        assert!(status.quality_1080p_available());
    }

    #[test]
    fn baseline_has_no_flags() {
        let status = StreamStatus::default();
        assert_eq!(status.value(), 0);
        assert!(!status.quality_auto_available());
        assert!(StreamQuality::ALL.iter().all(|q| !status.is_quality_available(*q)));
    }

    #[test]
    fn display_lists_every_flag() {
        let text = StreamStatus::new(1).to_string();
        assert_eq!(text, "value:1 auto:true 540p:false 720p:false 720ph:false 1080p:false");
    }

    proptest! {
        #[test]
        fn flags_mirror_low_bits(value in any::<u32>()) {
            let status = StreamStatus::new(value);
            prop_assert_eq!(status.quality_auto_available(), value & 1 == 1);
            prop_assert_eq!(status.quality_540p_available(), value & 2 == 2);
            prop_assert_eq!(status.quality_720p_available(), value & 4 == 4);
            prop_assert_eq!(status.quality_720p_high_available(), value & 8 == 8);
            prop_assert_eq!(status.quality_1080p_available(), value & 16 == 16);
        }
    }
}
