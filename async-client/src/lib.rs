//! `async-client` — a single-connection TCP client that streams
//! length-prefixed frames from one background loop.
//!
//! # Architecture
//!
//! ```text
//!  any thread                         worker thread
//!  ┌──────────┐   Command channel   ┌──────────────────────────────┐
//!  │  Client  │────────────────────▶│            Worker            │
//!  └────┬─────┘                     │  ┌────────────────────────┐  │
//!       │ reads                     │  │   ConnectionManager    │  │
//!       ▼                           │  │ (state + DeadlineTimer)│  │
//!  ┌──────────┐     publishes       │  └────────────────────────┘  │
//!  │  Shared  │◀────────────────────│  ┌────────────────────────┐  │
//!  └──────────┘                     │  │     OutboundQueue      │  │
//!                                   │  └───────────┬────────────┘  │
//!                                   └──────────────┼───────────────┘
//!                                                  │ [len][payload]
//!                                             ┌────▼─────┐
//!                                             │  Socket  │ (tokio TcpStream)
//!                                             └──────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`client`]     — public facade (`connect`, `call`, `stop`, setters)
//! - [`worker`]     — the loop that owns all I/O and timers
//! - [`connection`] — connect / retry / timeout state machine
//! - [`queue`]      — ordered frames, one write in flight
//! - [`frame`]      — owned payloads and the length-prefix wire format
//! - [`codec`]      — method name + args → MessagePack payload
//! - [`socket`]     — async TCP socket abstraction
//! - [`state`]      — FSM and retry-budget types
//! - [`timer`]      — connect deadline timer
//! - [`config`]     — client configuration
//! - [`error`]      — facade errors

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod queue;
pub mod socket;
pub mod state;
pub mod timer;
pub mod worker;

pub use client::{Client, ClientStats};
pub use config::{ClientConfig, EarlyFramePolicy, WriteFailurePolicy};
pub use error::ClientError;
pub use state::{ConnectionState, ReconnectPolicy};
