//! Session lifecycle states

use std::fmt;

/// Lifecycle state of a [`LiveView`](crate::LiveView) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Streaming = 3,
    /// Terminal: the camera handle has been released.
    Destroyed = 4,
}

impl SessionState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Uninitialized,
            1 => SessionState::Initializing,
            2 => SessionState::Ready,
            3 => SessionState::Streaming,
            _ => SessionState::Destroyed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Streaming => "streaming",
            SessionState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
