//! Client configuration.
//!
//! [`ClientConfig`] is a plain value: build it with `Default` plus the
//! `with_*` methods, hand it to [`crate::client::Client::with_config`], and
//! adjust the connect timeout / reconnect budget later through the client's
//! setters (those changes apply from the next connect attempt).

use std::time::Duration;

use crate::state::ReconnectPolicy;

/// Default connect timeout per attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// What the writer does with the rest of the queue after a failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Drop the failed frame and stop draining.  Queued frames wait until a
    /// later `connect()` re-establishes the connection.
    #[default]
    Halt,
    /// Drop the failed frame and everything queued behind it.
    DiscardQueue,
    /// Drop only the failed frame and keep draining.
    Continue,
}

/// What happens to frames submitted while the connection is not up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyFramePolicy {
    /// Keep them queued and start draining once connected.
    #[default]
    Hold,
    /// Attempt the write immediately; it fails with `NotConnected` and the
    /// frame is dropped under the write-failure policy.
    Attempt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline for each individual connect attempt.
    pub connect_timeout: Duration,
    /// Retry budget for failed connect attempts.
    pub reconnect: ReconnectPolicy,
    /// Pause between a failed attempt and the next one (jittered).
    pub reconnect_delay: Duration,
    pub write_failure: WriteFailurePolicy,
    pub early_frames: EarlyFramePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::Unbounded,
            reconnect_delay: Duration::ZERO,
            write_failure: WriteFailurePolicy::Halt,
            early_frames: EarlyFramePolicy::Hold,
        }
    }
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Classic reconnect count: negative means retry forever.
    pub fn with_reconnect_count(mut self, count: i64) -> Self {
        self.reconnect = ReconnectPolicy::from_count(count);
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_write_failure(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure = policy;
        self
    }

    pub fn with_early_frames(mut self, policy: EarlyFramePolicy) -> Self {
        self.early_frames = policy;
        self
    }
}
