//! Call serialisation: method name + arguments → payload bytes.
//!
//! The client itself treats payloads as opaque.  [`MsgPackCodec`] is the
//! default way [`crate::client::Client::call`] produces them: a MessagePack
//! array `[name, args]` where `args` is whatever the caller passed (usually a
//! tuple, which encodes as a nested array).
//!
//! Ownership of the returned `Vec<u8>` passes to the caller, who normally
//! hands it straight to the outbound queue.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from encoding or decoding a call payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("msgpack encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// MessagePack codec for call payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode `name` and `args` as `[name, args]`.
    pub fn pack_args<A: Serialize>(name: &str, args: &A) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec(&(name, args))?)
    }

    /// Inverse of [`MsgPackCodec::pack_args`], for receivers and tests.
    pub fn unpack_args<A: DeserializeOwned>(payload: &[u8]) -> Result<(String, A), CodecError> {
        Ok(rmp_serde::from_slice(payload)?)
    }
}
