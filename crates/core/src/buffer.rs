//! Bounded FIFO byte buffer
//!
//! `ByteRing` is the data buffer between the write path and the drain
//! worker: a fixed-capacity byte queue with safe push/pop returning actual
//! counts. Overflow never grows the buffer and never errors - the caller
//! learns how many bytes were admitted and applies its own loss policy.

use std::collections::VecDeque;

/// Fixed-capacity FIFO byte queue
///
/// Single-owner structure; callers serialize access externally (the device
/// guards it with the write lock). Capacity is fixed at construction and
/// `push` admits at most the remaining free space.
#[derive(Debug)]
pub struct ByteRing {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl ByteRing {
    /// Create an empty ring holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of bytes the ring can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently queued
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the ring is empty
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remaining free space in bytes
    pub fn available(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Append as much of `data` as fits, returning the bytes admitted
    ///
    /// The excess beyond the free space is not stored; the caller decides
    /// whether a short count is worth a warning.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let admitted = data.len().min(self.available());
        self.buf.extend(&data[..admitted]);
        admitted
    }

    /// Copy up to `out.len()` bytes from the front without consuming them
    ///
    /// Returns the number of bytes copied (short only when the ring holds
    /// fewer bytes than `out`).
    pub fn peek_into(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.buf.len());
        let (front, back) = self.buf.as_slices();
        if n <= front.len() {
            out[..n].copy_from_slice(&front[..n]);
        } else {
            out[..front.len()].copy_from_slice(front);
            out[front.len()..n].copy_from_slice(&back[..n - front.len()]);
        }
        n
    }

    /// Discard up to `n` bytes from the front, returning the bytes discarded
    pub fn advance(&mut self, n: usize) -> usize {
        let n = n.min(self.buf.len());
        self.buf.drain(..n);
        n
    }

    /// Logically empty the ring
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
