//! Live video-stream session engine for camera payloads.
//!
//! LiveView turns a camera's raw H.264 elementary stream into a paced
//! sequence of frames delivered to your code, with link-quality status
//! reports on the side and a lifecycle that tears down cleanly.
//!
//! # Features
//!
//! - **Annex-B framing**: start-code scanning and incremental segmentation
//!   over any `AsyncRead` byte source
//! - **Paced delivery**: one frame per tick into a bounded channel, dropping
//!   (and counting) frames a slow consumer cannot take
//! - **Session state machine**: init, lens switching, start/stop and
//!   idempotent destroy, safe under concurrent callers
//! - **Simulation**: a file- or memory-backed device stands in for camera
//!   hardware
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use liveview::{LiveView, StreamReceiver};
//! use liveview::config::LiveViewSettings;
//! use liveview::types::{Frame, StreamStatus};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl StreamReceiver for Printer {
//!     fn on_frame(&self, frame: Frame<'_>) {
//!         println!("{:?} frame, {} bytes", frame.nal_type(), frame.len());
//!     }
//!
//!     fn on_status(&self, status: StreamStatus) {
//!         println!("link: {status}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> liveview::Result<()> {
//!     let settings = LiveViewSettings::load("liveview.yaml")?;
//!     let session = LiveView::simulated(&settings)?;
//!
//!     session.init(settings.camera, settings.quality, Some(Arc::new(Printer))).await?;
//!     if let Some(source) = settings.source {
//!         session.set_source(source).await?;
//!     }
//!     session.start_stream().await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!
//!     session.stop_stream().await?;
//!     session.destroy().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stream framing and delivery
pub mod nal;
pub mod receiver;
pub mod source;
mod driver;

// Device collaborators
pub mod device;
pub mod devices;

// Session and configuration
pub mod config;
pub mod session;

// Core exports
pub use error::*;
pub use types::*;

pub use config::{LiveViewConfig, LiveViewSettings, SimulationConfig};
pub use device::{CameraHandle, Device, StatusFeed};
pub use driver::StreamStatsSnapshot;
pub use receiver::{ChannelReceiver, StreamReceiver};
pub use session::LiveView;
pub use source::FrameSource;
