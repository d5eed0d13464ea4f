//! Public facade.
//!
//! [`Client`] is what application code holds.  Every method is `&self` and
//! non-blocking except [`Client::stop`], so one client can be shared across
//! threads behind an `Arc`.  Each method either posts a
//! [`Command`](crate::worker::Command) to the worker loop or reads the
//! snapshot the loop publishes.
//!
//! ```no_run
//! use async_client::Client;
//!
//! let client = Client::new("127.0.0.1", 9000)?;
//! client.set_connect_timeout(2);
//! client.set_reconnect_count(3);
//! client.connect();
//! client.call("add", (1, 2));
//! client.stop();
//! # Ok::<(), async_client::ClientError>(())
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::codec::MsgPackCodec;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::frame::PendingFrame;
use crate::state::{ConnectionState, ReconnectPolicy};
use crate::worker::{Command, Shared, Worker};

/// Counters published by the worker loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub connect_attempts: u64,
    pub frames_enqueued: u64,
    pub frames_written: u64,
    /// Frames released without being written (write failed or discarded).
    pub frames_dropped: u64,
}

/// Handles that only exist while the worker runs.
struct Running {
    shutdown: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

pub struct Client {
    host: String,
    port: u16,
    commands: mpsc::UnboundedSender<Command>,
    running: Mutex<Option<Running>>,
    shared: Arc<Shared>,
}

impl Client {
    /// Create a client for `host:port` with default configuration.
    ///
    /// Starts the background worker immediately; no connection is attempted
    /// until [`Client::connect`].
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ClientError> {
        Self::with_config(host, port, ClientConfig::default())
    }

    pub fn with_config(
        host: impl Into<String>,
        port: u16,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let host = host.into();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientError::Runtime)?;

        let shared = Arc::new(Shared::default());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();

        let worker_host = host.clone();
        let worker_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name(format!("async-client {host}:{port}"))
            .spawn(move || {
                runtime.block_on(async move {
                    Worker::new(worker_host, port, config, worker_shared)
                        .run(command_rx, shutdown_rx)
                        .await
                });
            })
            .map_err(ClientError::Spawn)?;

        Ok(Self {
            host,
            port,
            commands,
            running: Mutex::new(Some(Running { shutdown, thread })),
            shared,
        })
    }

    /// Timeout for each connect attempt, in seconds.
    pub fn set_connect_timeout(&self, seconds: u64) {
        self.post(Command::SetConnectTimeout(Duration::from_secs(seconds)));
    }

    /// Retry budget after failed connects; negative means unbounded.
    ///
    /// Replaces whatever budget is left.
    pub fn set_reconnect_count(&self, count: i64) {
        self.post(Command::SetReconnect(ReconnectPolicy::from_count(count)));
    }

    /// Start connecting in the background.  Ignored while already connecting
    /// or connected.
    pub fn connect(&self) {
        self.post(Command::Connect);
    }

    /// Serialise `name` and `args` and queue the payload for sending.
    ///
    /// Fire-and-forget: returns immediately and reports nothing about
    /// delivery.  Encoding failures are logged and the call is dropped.
    pub fn call<A: Serialize>(&self, name: &str, args: A) {
        match MsgPackCodec::pack_args(name, &args) {
            Ok(payload) => self.send(payload),
            Err(e) => log::error!("[client] could not encode call {name:?}: {e}"),
        }
    }

    /// Queue an already-encoded payload for sending.
    pub fn send(&self, payload: Vec<u8>) {
        match PendingFrame::new(payload) {
            Ok(frame) => self.post(Command::Send(frame)),
            Err(e) => log::error!("[client] rejected payload: {e}"),
        }
    }

    /// Whether the connection is currently up.  May be stale immediately.
    pub fn has_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// `true` once the retry budget is exhausted and the client has stopped
    /// trying.  A later [`Client::connect`] starts over.
    pub fn is_terminal(&self) -> bool {
        self.shared.is_terminal()
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            connect_attempts: self.shared.connect_attempts(),
            frames_enqueued: self.shared.frames_enqueued(),
            frames_written: self.shared.frames_written(),
            frames_dropped: self.shared.frames_dropped(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Halt the worker loop and join its thread.
    ///
    /// Pending and in-flight frames are released unsent.  Calling it again
    /// is a no-op; commands posted afterwards are discarded.
    pub fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Running { shutdown, thread }) = running else {
            return;
        };

        // The worker may already be gone; joining is still correct.
        let _ = shutdown.send(());
        if thread.join().is_err() {
            log::error!("[client] worker thread for {}:{} panicked", self.host, self.port);
        }
    }

    fn post(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            log::debug!("[client] worker stopped; command discarded");
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state())
            .finish()
    }
}
