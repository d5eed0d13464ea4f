//! Async TCP socket abstraction.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::TcpStream` that speaks
//! [`crate::frame::PendingFrame`] instead of raw bytes.  All protocol logic
//! lives elsewhere; this module owns only byte I/O.
//!
//! A `Socket` only exists once the TCP handshake has completed.  Closing it
//! is dropping it.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::frame::PendingFrame;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise from socket operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Underlying I/O error from the OS.
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A write was attempted with no established connection.
    #[error("socket is not connected")]
    NotConnected,
}

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Socket {
    /// Resolved address of the remote end.
    pub peer_addr: SocketAddr,
    inner: TcpStream,
}

impl Socket {
    /// Resolve `host` and open a fresh TCP connection to `host:port`.
    ///
    /// Not bounded in time; callers race it against a deadline.
    pub async fn connect(host: &str, port: u16) -> Result<Self, SocketError> {
        let inner = TcpStream::connect((host, port)).await?;
        inner.set_nodelay(true)?;
        let peer_addr = inner.peer_addr()?;
        Ok(Self { peer_addr, inner })
    }

    /// Write one frame: 4-byte prefix, then the payload.
    ///
    /// Resolves only after every byte has been handed to the OS.
    pub async fn write_frame(&mut self, frame: &PendingFrame) -> Result<(), SocketError> {
        self.inner.write_all(&frame.prefix()).await?;
        self.inner.write_all(frame.payload()).await?;
        self.inner.flush().await?;
        Ok(())
    }
}
