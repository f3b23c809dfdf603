//! Core types for live-view sessions.
//!
//! - [`CameraType`], [`CameraSource`] and [`StreamQuality`] select what is streamed
//! - [`StreamStatus`] decodes link-quality bitmasks
//! - [`Frame`] is the borrowed, callback-scoped view of one NAL-delimited frame
//! - [`SessionState`] names the lifecycle states of a session
//!
//! Every enum can be decoded from the raw integer codes native bindings use:
//!
//! ```rust
//! use liveview::types::{CameraType, StreamQuality};
//!
//! let camera = CameraType::try_from(1).unwrap();
//! assert_eq!(camera, CameraType::Payload);
//!
//! let quality = StreamQuality::try_from(4).unwrap();
//! assert_eq!(quality.profile().height, 1080);
//!
//! assert!(StreamQuality::try_from(9).is_err());
//! ```

mod camera;
mod frame;
mod state;
mod status;

pub use camera::{CameraSource, CameraType, QualityProfile, StreamQuality};
pub use frame::Frame;
pub use state::SessionState;
pub use status::{StreamStatus, status_bits};
