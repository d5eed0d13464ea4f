//! The execution context: one cooperative loop that owns all I/O.
//!
//! # Architecture
//!
//! ```text
//!  caller threads                      worker thread (current-thread runtime)
//!  ──────────────                      ──────────────────────────────────────
//!  Client::call ─┐                     ┌───────────────────────────────────┐
//!  Client::send ─┼─▶ Command channel ─▶│ select! {                         │
//!  Client::connect┘   (unbounded mpsc) │   shutdown signal                 │
//!                                      │   next Command                    │
//!  Client::stop ───▶ oneshot ─────────▶│   connect attempt completes       │
//!                                      │   connect deadline fires          │
//!                                      │   reconnect delay elapses         │
//!                                      │   in-flight write completes       │
//!                                      │ }                                 │
//!                                      │  ConnectionManager · OutboundQueue│
//!                                      │  Socket                           │
//!                                      └───────────────────────────────────┘
//! ```
//!
//! Nothing outside this loop ever touches the socket, the queue, or the
//! timers; callers only send [`Command`]s.  The connect attempt and the
//! current write are kept as boxed futures polled from the same `select!`,
//! so neither blocks the loop from accepting new commands.
//!
//! After every iteration the loop publishes a snapshot into [`Shared`] so the
//! facade can answer `has_connected()` and friends without a round trip.

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::config::{ClientConfig, EarlyFramePolicy};
use crate::connection::{ConnectEvent, ConnectionManager, Transition};
use crate::frame::PendingFrame;
use crate::queue::{AfterWrite, OutboundQueue};
use crate::socket::{Socket, SocketError};
use crate::state::{ConnectionState, ReconnectPolicy};
use crate::timer::{self, DeadlineTimer};

type ConnectFuture = Pin<Box<dyn Future<Output = Result<Socket, SocketError>> + Send>>;

/// A write hands the socket and frame back when it finishes.
type WriteFuture =
    Pin<Box<dyn Future<Output = (Option<Socket>, PendingFrame, Result<(), SocketError>)> + Send>>;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Work items posted by caller threads.  Processed strictly in arrival order.
#[derive(Debug)]
pub enum Command {
    Connect,
    Send(PendingFrame),
    SetConnectTimeout(Duration),
    SetReconnect(ReconnectPolicy),
}

// ---------------------------------------------------------------------------
// Shared — loop-published snapshot
// ---------------------------------------------------------------------------

/// State written only by the loop, read by any thread.
#[derive(Debug, Default)]
pub struct Shared {
    state: AtomicU8,
    terminal: AtomicBool,
    connect_attempts: AtomicU64,
    frames_enqueued: AtomicU64,
    frames_written: AtomicU64,
    frames_dropped: AtomicU64,
}

impl Shared {
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::Acquire)
    }

    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Acquire)
    }

    pub fn frames_enqueued(&self) -> u64 {
        self.frames_enqueued.load(Ordering::Acquire)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Acquire)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

pub struct Worker {
    config: ClientConfig,
    manager: ConnectionManager,
    queue: OutboundQueue,
    /// Live socket while connected and no write is in flight.
    socket: Option<Socket>,
    connecting: Option<ConnectFuture>,
    writing: Option<WriteFuture>,
    /// Armed only while waiting out `reconnect_delay`.
    retry_timer: DeadlineTimer,
    shared: Arc<Shared>,
}

impl Worker {
    /// Must be called inside the worker's runtime.
    pub fn new(host: String, port: u16, config: ClientConfig, shared: Arc<Shared>) -> Self {
        let manager = ConnectionManager::new(host, port, config.reconnect);
        Self {
            config,
            manager,
            queue: OutboundQueue::new(),
            socket: None,
            connecting: None,
            writing: None,
            retry_timer: DeadlineTimer::new(),
            shared,
        }
    }

    /// Drive the loop until `shutdown` fires or every command sender is gone.
    ///
    /// Whatever is pending at that point (connect attempt, in-flight write,
    /// queued frames) is dropped with the worker, which closes the socket and
    /// releases each frame once.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        log::debug!(
            "[worker] started for {}:{}",
            self.manager.host(),
            self.manager.port()
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    log::debug!("[worker] stop requested");
                    break;
                }

                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        log::debug!("[worker] all handles dropped");
                        break;
                    }
                },

                result = in_flight(&mut self.connecting) => {
                    self.connecting = None;
                    let event = match result {
                        Ok(socket) => {
                            let peer = socket.peer_addr;
                            self.socket = Some(socket);
                            ConnectEvent::Succeeded(peer)
                        }
                        Err(e) => ConnectEvent::Failed(e),
                    };
                    self.on_connect_event(event);
                }

                _ = self.manager.deadline().expired() => {
                    // Dropping the pending connect closes its socket.
                    self.connecting = None;
                    self.on_connect_event(ConnectEvent::TimedOut);
                }

                _ = self.retry_timer.expired() => {
                    self.start_attempt();
                }

                (socket, frame, result) = in_flight(&mut self.writing) => {
                    self.writing = None;
                    self.on_write_done(socket, frame, result);
                }
            }

            self.publish();
        }

        let unsent = self.queue.len() + usize::from(self.writing.is_some());
        if unsent > 0 {
            log::warn!("[worker] exiting with {unsent} unsent frame(s)");
        }

        // Close the socket before telling readers the connection is gone.
        self.connecting = None;
        self.writing = None;
        self.socket = None;
        self.shared
            .state
            .store(ConnectionState::Disconnected as u8, Ordering::Release);
        log::debug!("[worker] stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect => {
                if self.manager.state() != ConnectionState::Disconnected
                    || self.retry_timer.is_armed()
                {
                    log::debug!(
                        "[worker] connect ignored in state {}",
                        self.manager.state()
                    );
                    return;
                }
                self.start_attempt();
            }
            Command::Send(frame) => {
                let len = frame.len();
                let was_idle = self.queue.enqueue(frame);
                log::debug!(
                    "[queue] + frame len={len} queued={} idle={was_idle}",
                    self.queue.len()
                );
                if was_idle {
                    self.pump();
                }
            }
            Command::SetConnectTimeout(timeout) => {
                self.config.connect_timeout = timeout;
            }
            Command::SetReconnect(policy) => {
                self.config.reconnect = policy;
                self.manager.set_policy(policy);
            }
        }
    }

    fn start_attempt(&mut self) {
        if !self.manager.begin_attempt(self.config.connect_timeout) {
            return;
        }
        let host = self.manager.host().to_owned();
        let port = self.manager.port();
        self.connecting = Some(Box::pin(async move { Socket::connect(&host, port).await }));
    }

    fn on_connect_event(&mut self, event: ConnectEvent) {
        match self.manager.on_event(event) {
            Transition::Connected => {
                if self.queue.is_halted() {
                    log::info!("[queue] resuming after reconnect");
                    self.queue.resume();
                }
                self.pump();
            }
            Transition::Retry => {
                let delay = timer::jittered(self.config.reconnect_delay);
                if delay.is_zero() {
                    self.start_attempt();
                } else {
                    log::debug!("[conn] next attempt in {delay:?}");
                    self.retry_timer.arm(delay);
                }
            }
            Transition::GiveUp => {
                if self.config.early_frames == EarlyFramePolicy::Hold {
                    let n = self.queue.discard_all();
                    if n > 0 {
                        log::error!("[queue] dropped {n} held frame(s): connection gave up");
                    }
                }
            }
        }
    }

    /// Start writing the head frame if the write slot is free and writing is
    /// allowed in the current state.
    fn pump(&mut self) {
        if self.writing.is_some() {
            return;
        }
        let connected = self.manager.state() == ConnectionState::Connected;
        if !connected && self.config.early_frames == EarlyFramePolicy::Hold {
            return;
        }
        let Some(frame) = self.queue.start_next() else {
            return;
        };

        log::debug!("[queue] → frame len={} wire={}", frame.len(), frame.wire_len());
        let socket = self.socket.take();
        self.writing = Some(Box::pin(async move {
            let mut socket = socket;
            let result = match socket.as_mut() {
                Some(s) => s.write_frame(&frame).await,
                None => Err(SocketError::NotConnected),
            };
            (socket, frame, result)
        }));
    }

    fn on_write_done(
        &mut self,
        socket: Option<Socket>,
        frame: PendingFrame,
        result: Result<(), SocketError>,
    ) {
        let succeeded = match &result {
            Ok(()) => true,
            Err(e) => {
                log::error!("[queue] could not write frame len={}: {e}", frame.len());
                false
            }
        };

        match socket {
            Some(s) if succeeded => self.socket = Some(s),
            Some(s) => {
                drop(s);
                self.manager.on_write_failure();
            }
            None => {}
        }

        match self.queue.finish(frame, succeeded, self.config.write_failure) {
            AfterWrite::Drain => self.pump(),
            AfterWrite::Halted => log::warn!(
                "[queue] halted with {} frame(s) waiting; reconnect to resume",
                self.queue.len()
            ),
        }
    }

    fn publish(&self) {
        let stats = self.queue.stats();
        let s = &self.shared;
        s.state.store(self.manager.state() as u8, Ordering::Release);
        s.terminal.store(self.manager.is_terminal(), Ordering::Release);
        s.connect_attempts.store(self.manager.attempts(), Ordering::Release);
        s.frames_enqueued.store(stats.enqueued, Ordering::Release);
        s.frames_written.store(stats.written, Ordering::Release);
        s.frames_dropped.store(stats.dropped, Ordering::Release);
    }
}

/// Await an optional boxed future; never resolves when there is none.
///
/// Cancel-safe: dropping this future leaves the boxed one in place.
async fn in_flight<T>(slot: &mut Option<Pin<Box<dyn Future<Output = T> + Send>>>) -> T {
    match slot {
        Some(fut) => fut.await,
        None => future::pending().await,
    }
}
