//! End-to-end tests for the blocking [`Client`] facade.
//!
//! These run on plain test threads (no runtime of their own): the client
//! brings its worker thread, and the server side is a `std::net` listener on
//! loopback.

use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_client::codec::MsgPackCodec;
use async_client::frame::FrameDecoder;
use async_client::{Client, ClientConfig, ConnectionState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const WAIT: Duration = Duration::from_secs(5);

fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn accept(listener: &TcpListener) -> TcpStream {
    let (stream, _) = listener.accept().expect("accept");
    stream.set_read_timeout(Some(WAIT)).unwrap();
    stream
}

/// Read from `stream` until `count` complete frames have been decoded.
fn read_frames(stream: &mut TcpStream, count: usize) -> Vec<Vec<u8>> {
    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    let mut buf = [0u8; 4096];
    while frames.len() < count {
        let n = stream.read(&mut buf).expect("server read");
        assert!(n > 0, "client closed after {} frame(s)", frames.len());
        decoder.extend(&buf[..n]);
        while let Some(frame) = decoder.next_frame() {
            frames.push(frame);
        }
    }
    frames
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn call_sends_msgpack_frames_in_order() {
    let (listener, port) = listen();
    let client = Client::new("127.0.0.1", port).unwrap();
    assert!(!client.has_connected());

    client.connect();
    let mut server = accept(&listener);
    wait_until("connected", || client.has_connected());

    client.call("add", (1, 2));
    client.call("echo", ("hi".to_string(),));

    let frames = read_frames(&mut server, 2);
    let (name, args): (String, (i32, i32)) = MsgPackCodec::unpack_args(&frames[0]).unwrap();
    assert_eq!((name.as_str(), args), ("add", (1, 2)));
    let (name, args): (String, (String,)) = MsgPackCodec::unpack_args(&frames[1]).unwrap();
    assert_eq!((name.as_str(), args.0.as_str()), ("echo", "hi"));

    client.stop();
}

/// Calls from several threads interleave, but each thread's calls stay in
/// the order that thread made them.
#[test]
fn per_thread_order_is_preserved() {
    const THREADS: u32 = 4;
    const CALLS: u32 = 50;

    let (listener, port) = listen();
    let client = Arc::new(Client::new("127.0.0.1", port).unwrap());
    client.connect();
    let mut server = accept(&listener);

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for seq in 0..CALLS {
                    client.call("tick", (t, seq));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let frames = read_frames(&mut server, (THREADS * CALLS) as usize);
    let mut next = vec![0u32; THREADS as usize];
    for frame in frames {
        let (_, (t, seq)): (String, (u32, u32)) = MsgPackCodec::unpack_args(&frame).unwrap();
        assert_eq!(seq, next[t as usize], "thread {t} out of order");
        next[t as usize] += 1;
    }
    assert!(next.iter().all(|&n| n == CALLS));
    client.stop();
}

#[test]
fn reconnect_count_bounds_attempts() {
    let port = {
        let (listener, port) = listen();
        drop(listener);
        port
    };
    let client = Client::new("127.0.0.1", port).unwrap();
    client.set_reconnect_count(2);
    client.connect();

    wait_until("terminal", || client.is_terminal());
    assert_eq!(client.stats().connect_attempts, 3);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(!client.has_connected());
}

#[test]
fn connect_again_after_giving_up() {
    let (listener, port) = listen();
    drop(listener);

    let config = ClientConfig::default().with_reconnect_count(0);
    let client = Client::with_config("127.0.0.1", port, config).unwrap();
    client.connect();
    wait_until("terminal", || client.is_terminal());

    // Someone starts listening on the port; a manual connect succeeds.
    let listener = TcpListener::bind(("127.0.0.1", port)).expect("rebind port");
    client.connect();
    let _server = accept(&listener);
    wait_until("connected", || client.has_connected());
    assert_eq!(client.stats().connect_attempts, 2);
}

/// A timeout too large for the clock must not take the worker down.
#[test]
fn huge_connect_timeout_still_connects_and_sends() {
    let (listener, port) = listen();
    let client = Client::new("127.0.0.1", port).unwrap();
    client.set_connect_timeout(u64::MAX);
    client.connect();
    client.send(b"x".to_vec());

    let mut server = accept(&listener);
    assert_eq!(read_frames(&mut server, 1), vec![b"x".to_vec()]);
    assert_eq!(client.stats().connect_attempts, 1);
    assert!(client.has_connected());
    client.stop();
}

#[test]
fn stop_is_idempotent_and_later_calls_are_ignored() {
    let (listener, port) = listen();
    let client = Client::new("127.0.0.1", port).unwrap();
    client.connect();
    let _server = accept(&listener);
    wait_until("connected", || client.has_connected());

    client.stop();
    client.stop();
    assert!(!client.has_connected());
    assert_eq!(client.state(), ConnectionState::Disconnected);

    let before = client.stats();
    client.call("late", ());
    client.send(b"late".to_vec());
    client.connect();
    assert_eq!(client.stats(), before);
}

#[test]
fn drop_stops_the_worker() {
    let (listener, port) = listen();
    let client = Client::new("127.0.0.1", port).unwrap();
    client.connect();
    let mut server = accept(&listener);
    wait_until("connected", || client.has_connected());
    drop(client);

    // Worker is gone, so the socket is closed: the server sees EOF.
    let mut buf = [0u8; 16];
    assert_eq!(server.read(&mut buf).expect("server read"), 0);
}
