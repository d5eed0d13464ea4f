//! Errors surfaced synchronously by the facade.
//!
//! Everything that goes wrong after construction (connect failures, write
//! failures) stays inside the worker loop and is only visible through state,
//! stats and logs.  Per-module errors live next to their module:
//! [`crate::frame::FrameError`], [`crate::codec::CodecError`],
//! [`crate::socket::SocketError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The worker's tokio runtime could not be built.
    #[error("failed to build worker runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}
