//! Outbound frame queue with a single write slot.
//!
//! [`OutboundQueue`] orders frames and tracks the one in-flight write.  It
//! does **not** touch the socket; the worker loop in [`crate::worker`] calls
//! these methods and owns the actual write future.
//!
//! # Single-writer contract
//! - Frames leave in exactly the order they were enqueued.
//! - At most **one** frame is in flight at any moment.  While it is, the
//!   frame itself lives inside the write future; logically it is still the
//!   head of the queue.
//! - A new write may only start once the previous one has been finished
//!   (successfully or not) via [`OutboundQueue::finish`].
//! - Every frame is released exactly once: either inside `finish`, or when
//!   the queue discards it, or when the queue itself is dropped.

use std::collections::VecDeque;

use crate::config::WriteFailurePolicy;
use crate::frame::PendingFrame;

/// Per-queue counters, mirrored into the client's shared stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Frames accepted by [`OutboundQueue::enqueue`].
    pub enqueued: u64,
    /// Frames whose bytes were fully written.
    pub written: u64,
    /// Frames released without being written (failed or discarded).
    pub dropped: u64,
}

/// What the worker should do after a write completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterWrite {
    /// Start the next frame if there is one.
    Drain,
    /// Leave the remaining frames where they are.
    Halted,
}

#[derive(Debug, Default)]
pub struct OutboundQueue {
    frames: VecDeque<PendingFrame>,
    in_flight: bool,
    halted: bool,
    stats: QueueStats,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `frame` to the tail.
    ///
    /// Returns `true` when nothing was queued or in flight beforehand, i.e.
    /// the caller should kick off a write for the new head.  Otherwise the
    /// in-flight write will reach this frame when it completes.
    pub fn enqueue(&mut self, frame: PendingFrame) -> bool {
        let was_idle = self.frames.is_empty() && !self.in_flight;
        self.frames.push_back(frame);
        self.stats.enqueued += 1;
        was_idle
    }

    /// Take the head for writing, marking the write slot busy.
    ///
    /// Returns `None` while a write is in flight, while halted, or when empty.
    pub fn start_next(&mut self) -> Option<PendingFrame> {
        if self.in_flight || self.halted {
            return None;
        }
        let frame = self.frames.pop_front()?;
        self.in_flight = true;
        Some(frame)
    }

    /// Record the outcome of the in-flight write and release its frame.
    ///
    /// On failure the frame is dropped (never retried) and `policy` decides
    /// what becomes of the frames behind it.
    pub fn finish(
        &mut self,
        frame: PendingFrame,
        succeeded: bool,
        policy: WriteFailurePolicy,
    ) -> AfterWrite {
        debug_assert!(self.in_flight, "finish called with no write in flight");
        self.in_flight = false;
        drop(frame);

        if succeeded {
            self.stats.written += 1;
            return AfterWrite::Drain;
        }

        self.stats.dropped += 1;
        match policy {
            WriteFailurePolicy::Halt => {
                self.halted = true;
                AfterWrite::Halted
            }
            WriteFailurePolicy::DiscardQueue => {
                self.discard_all();
                AfterWrite::Drain
            }
            WriteFailurePolicy::Continue => AfterWrite::Drain,
        }
    }

    /// Release every queued (not in-flight) frame.  Returns how many.
    pub fn discard_all(&mut self) -> usize {
        let n = self.frames.len();
        self.frames.clear();
        self.stats.dropped += n as u64;
        n
    }

    /// Allow draining again after a halt.
    pub fn resume(&mut self) {
        self.halted = false;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// `true` while a write is outstanding.
    pub fn has_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Frames waiting behind the in-flight one.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }
}
