//! Connection manager: connect / retry / timeout state machine.
//!
//! [`ConnectionManager`] owns everything about *whether* the client has a
//! usable socket, but none of the I/O.  The worker loop starts an attempt,
//! races the connect future against [`ConnectionManager::deadline`], and
//! feeds the outcome back as a [`ConnectEvent`].  The manager answers with a
//! [`Transition`] telling the loop what to do next.
//!
//! Retries are driven by events rather than by re-entering `connect`, so an
//! unbounded retry budget never grows the stack.
//!
//! ```text
//!  begin_attempt ──▶ Connecting ──Succeeded──▶ Connected
//!                        │
//!             Failed / TimedOut
//!                        ▼
//!                  Disconnected ──budget left──▶ Retry
//!                        └────── exhausted ─────▶ GiveUp (terminal)
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::socket::SocketError;
use crate::state::{ConnectionState, ReconnectPolicy};
use crate::timer::DeadlineTimer;

/// Outcome of one connect attempt, as observed by the worker loop.
#[derive(Debug)]
pub enum ConnectEvent {
    /// Handshake completed with the given peer.
    Succeeded(SocketAddr),
    Failed(SocketError),
    /// The deadline fired first; the pending socket has been dropped.
    TimedOut,
}

/// What the worker loop must do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Socket is live; start draining.
    Connected,
    /// Budget allows another attempt.
    Retry,
    /// Budget exhausted; no further attempt will be scheduled.
    GiveUp,
}

pub struct ConnectionManager {
    host: String,
    port: u16,
    state: ConnectionState,
    policy: ReconnectPolicy,
    deadline: DeadlineTimer,
    attempts: u64,
    terminal: bool,
}

impl ConnectionManager {
    /// A manager in the initial `Disconnected` state.  Must be created inside
    /// a tokio runtime (it owns the deadline timer).
    pub fn new(host: impl Into<String>, port: u16, policy: ReconnectPolicy) -> Self {
        Self {
            host: host.into(),
            port,
            state: ConnectionState::Disconnected,
            policy,
            deadline: DeadlineTimer::new(),
            attempts: 0,
            terminal: false,
        }
    }

    /// Move to `Connecting` and arm the deadline for `timeout`.
    ///
    /// Returns `false` (and changes nothing) unless currently `Disconnected`.
    pub fn begin_attempt(&mut self, timeout: Duration) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        self.terminal = false;
        self.attempts += 1;
        self.deadline.arm(timeout);
        log::debug!(
            "[conn] attempt #{} to {}:{} (timeout {:?}, retries {})",
            self.attempts,
            self.host,
            self.port,
            timeout,
            self.policy
        );
        true
    }

    /// Apply the outcome of the current attempt.
    pub fn on_event(&mut self, event: ConnectEvent) -> Transition {
        debug_assert_eq!(self.state, ConnectionState::Connecting);
        self.deadline.cancel();

        match event {
            ConnectEvent::Succeeded(peer) => {
                self.state = ConnectionState::Connected;
                log::info!("[conn] connected to {}:{} ({peer})", self.host, self.port);
                return Transition::Connected;
            }
            ConnectEvent::Failed(e) => {
                log::warn!("[conn] connect to {}:{} failed: {e}", self.host, self.port);
            }
            ConnectEvent::TimedOut => {
                log::warn!("[conn] connect to {}:{} timed out", self.host, self.port);
            }
        }

        self.state = ConnectionState::Disconnected;
        if self.policy.consume() {
            Transition::Retry
        } else {
            self.terminal = true;
            log::error!(
                "[conn] giving up on {}:{} after {} attempt(s)",
                self.host,
                self.port,
                self.attempts
            );
            Transition::GiveUp
        }
    }

    /// The live socket failed a write and has been closed.
    ///
    /// Only meaningful while `Connected`; no reconnect is scheduled.
    pub fn on_write_failure(&mut self) {
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Disconnected;
            log::warn!("[conn] {}:{} closed after write failure", self.host, self.port);
        }
    }

    /// Replace the retry budget; applies to the next failure.
    pub fn set_policy(&mut self, policy: ReconnectPolicy) {
        self.policy = policy;
    }

    /// Deadline of the current attempt, for the worker's `select!`.
    pub fn deadline(&mut self) -> &mut DeadlineTimer {
        &mut self.deadline
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Total attempts started since creation.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// `true` once the retry budget ran out and no attempt is pending.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
