//! Wire-format definitions for outbound frames.
//!
//! Every payload handed to the client travels as one [`PendingFrame`].  This
//! module is responsible for:
//! - Owning the payload bytes from the moment a caller submits them until the
//!   write completes (or is abandoned), at which point the frame is dropped.
//! - Defining the on-wire layout (length prefix followed by the payload).
//! - Decoding a byte stream back into payloads, for receivers and tests.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! The length prefix uses the **native** byte order of the sending host, so a
//! matching receiver must run on a host of the same endianness.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                 Payload Length (u32, native order)            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Payload ...                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Frames are concatenated back-to-back with no delimiter other than the
//! prefix.

use thiserror::Error;

/// Byte length of the fixed-size length prefix on the wire.
pub const PREFIX_LEN: usize = 4;

/// Largest payload representable by the 4-byte prefix.
pub const MAX_PAYLOAD: usize = u32::MAX as usize;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise when building or parsing frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Payload does not fit in the 4-byte length prefix.
    #[error("payload of {0} bytes exceeds the 4-byte length prefix")]
    TooLarge(usize),
    /// Input ended before a complete frame was available.
    #[error("buffer holds {have} bytes, frame needs {need}")]
    Truncated { have: usize, need: usize },
}

// ---------------------------------------------------------------------------
// PendingFrame
// ---------------------------------------------------------------------------

/// An owned, immutable payload waiting to be written.
///
/// Deliberately not `Clone`: a frame has exactly one owner at a time (the
/// caller, then the command channel, then the outbound queue, then the write
/// future) and its buffer is released when that owner drops it.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingFrame {
    payload: Box<[u8]>,
}

impl PendingFrame {
    /// Take ownership of `payload`.
    ///
    /// Fails if the payload is longer than [`MAX_PAYLOAD`].
    pub fn new(payload: Vec<u8>) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::TooLarge(payload.len()));
        }
        Ok(Self {
            payload: payload.into_boxed_slice(),
        })
    }

    /// Payload length in bytes (the value carried by the prefix).
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The 4-byte length prefix in native byte order.
    pub fn prefix(&self) -> [u8; PREFIX_LEN] {
        // Checked in `new`.
        (self.payload.len() as u32).to_ne_bytes()
    }

    /// Total number of bytes this frame occupies on the wire.
    pub fn wire_len(&self) -> usize {
        PREFIX_LEN + self.payload.len()
    }

    /// Serialise prefix + payload into a newly allocated byte vector.
    ///
    /// The socket writes the two parts separately; this is used by receivers
    /// building expectations and by tests.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        buf.extend_from_slice(&self.prefix());
        buf.extend_from_slice(&self.payload);
        buf
    }
}

/// Parse one frame from the front of `buf`.
///
/// Returns the payload and the number of bytes consumed.
pub fn decode(buf: &[u8]) -> Result<(Vec<u8>, usize), FrameError> {
    if buf.len() < PREFIX_LEN {
        return Err(FrameError::Truncated {
            have: buf.len(),
            need: PREFIX_LEN,
        });
    }
    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&buf[..PREFIX_LEN]);
    let len = u32::from_ne_bytes(prefix) as usize;

    let need = PREFIX_LEN + len;
    if buf.len() < need {
        return Err(FrameError::Truncated {
            have: buf.len(),
            need,
        });
    }
    Ok((buf[PREFIX_LEN..need].to_vec(), need))
}

// ---------------------------------------------------------------------------
// FrameDecoder
// ---------------------------------------------------------------------------

/// Incremental decoder for the receiving side of a frame stream.
///
/// Feed it whatever the socket returned; pull complete payloads out with
/// [`FrameDecoder::next_frame`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw stream bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete payload, or `None` if more bytes are needed.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        match decode(&self.buf) {
            Ok((payload, used)) => {
                self.buf.drain(..used);
                Some(payload)
            }
            Err(_) => None,
        }
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}
