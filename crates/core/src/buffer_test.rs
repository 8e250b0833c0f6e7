//! ByteRing tests

use crate::ByteRing;

#[test]
fn test_push_within_capacity() {
    let mut ring = ByteRing::new(16);
    assert_eq!(ring.push(b"HELLO"), 5);
    assert_eq!(ring.len(), 5);
    assert_eq!(ring.available(), 11);
    assert!(!ring.is_empty());
}

#[test]
fn test_push_partial_admit_on_overflow() {
    let mut ring = ByteRing::new(8);
    assert_eq!(ring.push(b"ABCDEFGHIJ"), 8);
    assert_eq!(ring.len(), 8);
    assert_eq!(ring.available(), 0);

    // completely full ring admits nothing
    assert_eq!(ring.push(b"XY"), 0);
    assert_eq!(ring.len(), 8);

    let mut out = [0u8; 8];
    assert_eq!(ring.peek_into(&mut out), 8);
    assert_eq!(&out, b"ABCDEFGH");
}

#[test]
fn test_fifo_order_across_pushes() {
    let mut ring = ByteRing::new(32);
    ring.push(b"first ");
    ring.push(b"second ");
    ring.push(b"third");

    let mut out = [0u8; 32];
    let n = ring.peek_into(&mut out);
    assert_eq!(&out[..n], b"first second third");
}

#[test]
fn test_advance_consumes_from_front() {
    let mut ring = ByteRing::new(16);
    ring.push(b"HELLOWORLD");

    assert_eq!(ring.advance(4), 4);
    assert_eq!(ring.len(), 6);

    let mut out = [0u8; 6];
    ring.peek_into(&mut out);
    assert_eq!(&out, b"OWORLD");

    // advancing past the end stops at the end
    assert_eq!(ring.advance(100), 6);
    assert!(ring.is_empty());
}

#[test]
fn test_peek_is_not_destructive() {
    let mut ring = ByteRing::new(8);
    ring.push(b"DATA");

    let mut out = [0u8; 4];
    assert_eq!(ring.peek_into(&mut out), 4);
    assert_eq!(ring.len(), 4);
    assert_eq!(ring.peek_into(&mut out), 4);
    assert_eq!(&out, b"DATA");
}

#[test]
fn test_interleaved_push_advance_keeps_order() {
    let mut ring = ByteRing::new(8);
    ring.push(b"ABCD");
    ring.advance(2);
    ring.push(b"EFGH");
    assert_eq!(ring.len(), 6);

    let mut out = [0u8; 8];
    let n = ring.peek_into(&mut out);
    assert_eq!(&out[..n], b"CDEFGH");

    // capacity invariant holds after wrap-around usage
    assert_eq!(ring.push(b"XYZ"), 2);
    assert_eq!(ring.len(), ring.capacity());
}

#[test]
fn test_clear_resets_length_not_capacity() {
    let mut ring = ByteRing::new(8);
    ring.push(b"ABCDEF");
    ring.clear();
    assert!(ring.is_empty());
    assert_eq!(ring.capacity(), 8);
    assert_eq!(ring.push(b"12345678"), 8);
}
