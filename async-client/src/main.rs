//! Entry point for `async-client`.
//!
//! Connects to a server, fires a batch of calls at it, and exits.  All actual
//! protocol work is delegated to library modules; `main.rs` owns only process
//! setup (logging, argument parsing).

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_client::{Client, ClientConfig};
use clap::Parser;

/// Send fire-and-forget calls over a length-prefixed TCP stream.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Remote server host (name or IP address).
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Remote server port.
    #[arg(short, long, default_value_t = 9000)]
    port: u16,

    /// Method name to call.
    #[arg(short, long, default_value = "echo")]
    name: String,

    /// String argument passed to the call (repeatable).
    #[arg(short, long = "arg")]
    args: Vec<String>,

    /// How many times to send the call.
    #[arg(short, long, default_value_t = 1)]
    count: usize,

    /// Connect timeout per attempt, in seconds.
    #[arg(long, default_value_t = 1)]
    connect_timeout: u64,

    /// Reconnect attempts after a failure; negative retries forever.
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    reconnect: i64,

    /// How long to wait for the connection before giving up, in seconds.
    #[arg(long, default_value_t = 10)]
    wait: u64,
}

fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let config = ClientConfig::default()
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_reconnect_count(cli.reconnect);
    let client = Client::with_config(cli.host.as_str(), cli.port, config)?;

    log::info!("Connecting to {}:{}", cli.host, cli.port);
    client.connect();

    let deadline = Instant::now() + Duration::from_secs(cli.wait);
    while !client.has_connected() {
        if client.is_terminal() || Instant::now() >= deadline {
            client.stop();
            bail!("could not connect to {}:{}", cli.host, cli.port);
        }
        thread::sleep(Duration::from_millis(20));
    }

    for _ in 0..cli.count {
        client.call(&cli.name, &cli.args);
    }

    // Fire-and-forget: give the worker a moment to drain before stopping.
    let deadline = Instant::now() + Duration::from_secs(cli.wait);
    while client.stats().frames_written + client.stats().frames_dropped < cli.count as u64
        && Instant::now() < deadline
    {
        thread::sleep(Duration::from_millis(10));
    }

    let stats = client.stats();
    client.stop();
    log::info!(
        "Sent {} frame(s), dropped {}",
        stats.frames_written,
        stats.frames_dropped
    );
    Ok(())
}
