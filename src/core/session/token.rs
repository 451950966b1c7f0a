//! Connection generation counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic token identifying the current connection attempt.
///
/// Every `connect` and `disconnect` advances it. Asynchronous continuations
/// capture the value they started under and compare it before touching shared
/// state; a mismatch means the work belongs to a superseded session.
#[derive(Debug, Default)]
pub struct ConnectionToken(AtomicU64);

impl ConnectionToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return it.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn is_current(&self, token: u64) -> bool {
        self.current() == token
    }
}
