//! Borrowed frame view handed to consumers

use bytes::Bytes;
use std::ops::Deref;

use crate::nal::{NalUnitType, start_code_at};

/// One NAL-delimited frame, borrowed for the duration of a consumer callback.
///
/// The bytes start with their Annex-B start code. The backing buffer may be
/// reused or freed as soon as the callback returns, so the view cannot
/// outlive the call. Copy it with [`Frame::to_vec`] or [`Frame::to_bytes`]
/// to retain the data.
///
/// Holding on to the borrowed bytes past the callback does not compile:
///
/// ```rust,compile_fail
/// use liveview::{Frame, StreamReceiver, StreamStatus};
/// use std::sync::Mutex;
///
/// struct Hoarder {
///     last: Mutex<Option<&'static [u8]>>,
/// }
///
/// impl StreamReceiver for Hoarder {
///     fn on_frame(&self, frame: Frame<'_>) {
///         *self.last.lock().unwrap() = Some(frame.as_bytes());
///     }
///
///     fn on_status(&self, _status: StreamStatus) {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Raw frame bytes, start code included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy the frame into an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Copy the frame into an owned, cheaply clonable buffer.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.data)
    }

    /// Type of the NAL unit this frame opens with, if a header byte follows the start code.
    pub fn nal_type(&self) -> Option<NalUnitType> {
        let width = start_code_at(self.data, 0)?;
        self.data.get(width).map(|header| NalUnitType::from(*header))
    }

    /// Whether the frame carries an IDR slice.
    pub fn is_keyframe(&self) -> bool {
        self.nal_type().is_some_and(|nal| nal.is_keyframe())
    }
}

impl Deref for Frame<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl AsRef<[u8]> for Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}
