#![allow(dead_code)]

pub mod drive_server;

/// Deterministic test payload of `len` bytes.
pub fn body(len: usize) -> Vec<u8> {
    (0u8..100).cycle().take(len).collect()
}
