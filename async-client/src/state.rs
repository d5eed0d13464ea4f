//! Connection finite-state machine (FSM) types.
//!
//! This module defines every state a connection can occupy and the retry
//! budget that decides what happens after a failed attempt.  Transitions are
//! *not* implemented here — they live in [`crate::connection`] — so the types
//! can be shared with the facade (which only ever reads them).
//!
//! ```text
//!  DISCONNECTED ──connect()──▶ CONNECTING ──ok──▶ CONNECTED
//!       ▲                          │                  │
//!       │      failed / timed out  │                  │ write failure
//!       └──────────────────────────┘◀─────────────────┘
//!            (retry if budget left, otherwise terminal)
//! ```

/// All possible states of the connection FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    /// No usable socket; initial state and the state after any failure.
    #[default]
    Disconnected = 0,
    /// A connect attempt is in progress and the deadline timer is armed.
    Connecting = 1,
    /// The handshake completed; frames may be written.
    Connected = 2,
}

impl ConnectionState {
    /// Decode the value stored in the facade's shared atomic.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

// ---------------------------------------------------------------------------
// ReconnectPolicy
// ---------------------------------------------------------------------------

/// How many further attempts are allowed after a failed connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Retry forever until success or `stop()`.
    #[default]
    Unbounded,
    /// Retry at most this many more times; `Bounded(0)` gives up on the next
    /// failure.
    Bounded(u32),
}

impl ReconnectPolicy {
    /// Map a classic reconnect count: negative means unbounded.
    pub fn from_count(count: i64) -> Self {
        if count < 0 {
            Self::Unbounded
        } else {
            Self::Bounded(count.min(u32::MAX as i64) as u32)
        }
    }

    /// Consume one retry after a failed attempt.
    ///
    /// Returns `false` when the budget is exhausted and the connection should
    /// enter the terminal state.
    pub fn consume(&mut self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Bounded(0) => false,
            Self::Bounded(n) => {
                *n -= 1;
                true
            }
        }
    }

    /// Upper bound on total attempts, including the first one.
    pub fn max_attempts(&self) -> Option<u64> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(n) => Some(u64::from(*n) + 1),
        }
    }
}

impl std::fmt::Display for ReconnectPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Bounded(n) => write!(f, "{n} left"),
        }
    }
}
