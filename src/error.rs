//! Error types for live-view sessions.
//!
//! All errors implement `std::error::Error` and carry enough context to tell
//! a caller mistake from a device or stream failure.
//!
//! ## Error Categories
//!
//! - **Argument Errors**: unknown camera, source or quality codes, missing receiver
//! - **State Errors**: an operation that is not legal in the session's current state
//! - **Resource Errors**: the camera or byte source could not be acquired
//! - **Stream Errors**: oversized frames and byte-source I/O failures
//! - **Device Errors**: status codes reported by a native device binding
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use liveview::LiveViewError;
//!
//! let error = LiveViewError::resource_unavailable("camera busy");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```
//!
//! ## Native Status Codes
//!
//! ```rust
//! use liveview::LiveViewError;
//!
//! assert!(LiveViewError::from_device_code(0).is_none());
//! assert!(matches!(
//!     LiveViewError::from_device_code(1),
//!     Some(LiveViewError::InvalidArgument { .. })
//! ));
//! ```

use std::convert::Infallible;
use std::time::Duration;
use thiserror::Error;

use crate::types::SessionState;

/// Result type alias for live-view operations.
pub type Result<T, E = LiveViewError> = std::result::Result<T, E>;

/// Main error type for live-view operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LiveViewError {
    #[error("Invalid argument: {details}")]
    InvalidArgument { details: String },

    #[error("Operation '{operation}' is not valid while the session is {state}")]
    InvalidOperation { operation: &'static str, state: SessionState },

    #[error("Resource unavailable: {reason}")]
    ResourceUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Camera is not initialized for '{operation}'")]
    NotInitialized { operation: &'static str },

    #[error("Operation '{operation}' is already in progress")]
    AlreadyInProgress { operation: String },

    #[error("Frame of {buffered} bytes exceeds the {limit} byte buffer limit")]
    FrameTooLarge { limit: usize, buffered: usize },

    #[error("Stream source I/O error")]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {details}")]
    Config {
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Device error {code}: {description}")]
    Device { code: i32, description: &'static str },
}

impl LiveViewError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LiveViewError::ResourceUnavailable { .. } => true,
            LiveViewError::AlreadyInProgress { .. } => true,
            LiveViewError::Timeout { .. } => true,
            LiveViewError::Io { .. } => true,
            LiveViewError::Device { .. } => true,
            LiveViewError::InvalidArgument { .. } => false,
            LiveViewError::InvalidOperation { .. } => false,
            LiveViewError::NotInitialized { .. } => false,
            LiveViewError::FrameTooLarge { .. } => false,
            LiveViewError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LiveViewError::InvalidArgument { .. } => vec![
                "Check camera, source and quality values against their enumerated ranges",
                "Pass a stream receiver when initializing",
            ],
            LiveViewError::InvalidOperation { .. } => vec![
                "Check the session state before calling this operation",
                "Initialize the session before starting the stream",
                "Create a new session after destroy",
            ],
            LiveViewError::ResourceUnavailable { .. } => vec![
                "Ensure no other session holds the same camera",
                "Check that the stream source exists and is readable",
                "Retry after the device finishes starting up",
            ],
            LiveViewError::NotInitialized { .. } => {
                vec!["Call init before using the camera", "Do not reuse a released camera handle"]
            }
            LiveViewError::AlreadyInProgress { .. } => {
                vec!["Wait for the pending operation to finish", "Retry the operation"]
            }
            LiveViewError::FrameTooLarge { .. } => vec![
                "Raise the maximum frame size in the simulation config",
                "Verify the source is an Annex-B H.264 elementary stream",
            ],
            LiveViewError::Io { .. } => {
                vec!["Check the stream source is still readable", "Restart the stream"]
            }
            LiveViewError::Config { .. } => {
                vec!["Check the configuration file syntax", "Use positive intervals and capacities"]
            }
            LiveViewError::Timeout { .. } => {
                vec!["Increase the timeout", "Verify the device is responding"]
            }
            LiveViewError::Device { .. } => {
                vec!["Check the device link", "Re-initialize the session", "Consult the device logs"]
            }
        }
    }

    /// Map a native device status code to an error. Code `0` is success.
    pub fn from_device_code(code: i32) -> Option<Self> {
        let error = match code {
            0 => return None,
            1 => LiveViewError::invalid_argument("device rejected an argument"),
            3 => LiveViewError::InvalidOperation {
                operation: "device call",
                state: SessionState::Uninitialized,
            },
            4 => LiveViewError::AlreadyInProgress { operation: "repeated device operation".into() },
            10 => LiveViewError::Timeout { duration: Duration::ZERO },
            16 => LiveViewError::resource_unavailable(
                "no valid video id while starting the live stream",
            ),
            17 => LiveViewError::resource_unavailable("failed to establish a connection"),
            code => LiveViewError::Device { code, description: device_code_description(code) },
        };
        Some(error)
    }

    /// Helper constructor for invalid argument errors.
    pub fn invalid_argument(details: impl Into<String>) -> Self {
        LiveViewError::InvalidArgument { details: details.into() }
    }

    /// Helper constructor for state errors.
    pub fn invalid_operation(operation: &'static str, state: SessionState) -> Self {
        LiveViewError::InvalidOperation { operation, state }
    }

    /// Helper constructor for resource acquisition failures.
    pub fn resource_unavailable(reason: impl Into<String>) -> Self {
        LiveViewError::ResourceUnavailable { reason: reason.into(), source: None }
    }

    /// Helper constructor for resource acquisition failures with source.
    pub fn resource_unavailable_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LiveViewError::ResourceUnavailable { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        LiveViewError::Config { details: details.into(), source: None }
    }
}

fn device_code_description(code: i32) -> &'static str {
    match code {
        2 => "system error",
        5 => "null pointer",
        6 => "parameter has exceeded the expected range",
        7 => "failed to get a parameter",
        8 => "failed to set or modify a parameter",
        9 => "failed to send pack",
        11 => "authorization verification failed",
        12 => "failed to encrypt data",
        13 => "failed to decrypt data",
        14 => "invalid respond",
        15 => "failure on the remote server or remote process",
        _ => "unknown error",
    }
}

impl From<std::io::Error> for LiveViewError {
    fn from(err: std::io::Error) -> Self {
        LiveViewError::Io { source: err }
    }
}

impl From<serde_yaml_ng::Error> for LiveViewError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        LiveViewError::Config { details: "invalid YAML".to_string(), source: Some(Box::new(err)) }
    }
}

impl From<Infallible> for LiveViewError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_nonzero_code_maps_to_an_error(code in any::<i32>()) {
            let mapped = LiveViewError::from_device_code(code);
            prop_assert_eq!(mapped.is_none(), code == 0);
            if let Some(error) = mapped {
                prop_assert!(!error.to_string().is_empty());
                prop_assert!(!error.recovery_suggestions().is_empty());
            }
        }

        #[test]
        fn messages_carry_their_context(details in "[a-z ]{1,40}") {
            let error = LiveViewError::invalid_argument(details.clone());
            prop_assert!(error.to_string().contains(&details));
        }
    }

    #[test]
    fn device_codes_map_to_kinds() {
        assert!(matches!(
            LiveViewError::from_device_code(4),
            Some(LiveViewError::AlreadyInProgress { .. })
        ));
        assert!(matches!(
            LiveViewError::from_device_code(10),
            Some(LiveViewError::Timeout { .. })
        ));
        assert!(matches!(
            LiveViewError::from_device_code(17),
            Some(LiveViewError::ResourceUnavailable { .. })
        ));
        match LiveViewError::from_device_code(12) {
            Some(LiveViewError::Device { code, description }) => {
                assert_eq!(code, 12);
                assert_eq!(description, "failed to encrypt data");
            }
            other => panic!("Expected Device error, got {:?}", other),
        }
        match LiveViewError::from_device_code(99) {
            Some(LiveViewError::Device { description, .. }) => {
                assert_eq!(description, "unknown error")
            }
            other => panic!("Expected Device error, got {:?}", other),
        }
    }

    #[test]
    fn state_errors_name_the_state() {
        let error = LiveViewError::invalid_operation("start_stream", SessionState::Uninitialized);
        assert_eq!(
            error.to_string(),
            "Operation 'start_stream' is not valid while the session is uninitialized"
        );
        assert!(!error.is_retryable());
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LiveViewError>();

        let error = LiveViewError::resource_unavailable("test");
        let _: &dyn std::error::Error = &error;
        assert!(error.is_retryable());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let error: LiveViewError = io_err.into();
        let source = std::error::Error::source(&error).expect("source should be preserved");
        assert_eq!(source.to_string(), "truncated");
    }
}
