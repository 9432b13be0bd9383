//! Generation counters for discarding superseded async results.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotone generation counter owned by one decoded output slot.
///
/// Requesting a new result for the slot calls [`Generation::begin`] and
/// keeps the returned token with the queued job. The job checks
/// [`Generation::is_current`] when it starts (to skip superseded work
/// entirely) and again before applying its result; a token that is no
/// longer current means a newer request owns the slot and the result is
/// dropped silently.
#[derive(Debug, Default)]
pub struct Generation {
    counter: AtomicU64,
}

impl Generation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation and returns its token.
    pub fn begin(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued token.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Whether `token` is still the latest generation.
    #[must_use]
    pub fn is_current(&self, token: u64) -> bool {
        self.current() == token
    }
}
