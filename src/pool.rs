//! Scratch buffers for boundary-cut lists.

use crate::cell::cut::BoundaryCut;

/// Number of buffers a pool hands out before it starts complaining.
pub const DEFAULT_POOL_LIMIT: usize = 64;

/// A free list of cut buffers, owned by whoever drives a combine and passed down
/// explicitly. Exhausting the pool never fails: extra buffers are allocated on
/// demand and a single warning is logged.
#[derive(Debug, Clone)]
pub struct CutPool {
    free: Vec<Vec<BoundaryCut>>,
    limit: usize,
    outstanding: usize,
    warned: bool,
}

impl Default for CutPool {
    fn default() -> Self {
        Self::with_limit(DEFAULT_POOL_LIMIT)
    }
}

impl CutPool {
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            free: Vec::new(),
            limit,
            outstanding: 0,
            warned: false,
        }
    }

    /// Hand out an empty buffer.
    pub fn acquire(&mut self) -> Vec<BoundaryCut> {
        self.outstanding += 1;
        if self.outstanding > self.limit && !self.warned {
            self.warned = true;
            tracing::warn!(
                limit = self.limit,
                "cut pool exhausted, falling back to fresh allocations"
            );
        }
        self.free.pop().unwrap_or_default()
    }

    /// Take a buffer back. Any `Vec` is accepted, not only ones handed out here.
    pub fn release(&mut self, mut buffer: Vec<BoundaryCut>) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.free.len() < self.limit {
            buffer.clear();
            self.free.push(buffer);
        }
    }

    /// Keep an acquired buffer for good; it no longer counts as outstanding.
    pub const fn detach(&mut self, buffer: Vec<BoundaryCut>) -> Vec<BoundaryCut> {
        self.outstanding = self.outstanding.saturating_sub(1);
        buffer
    }

    /// Buffers currently handed out and not yet returned.
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Buffers waiting to be handed out again.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// `true` once the pool has run dry at least once.
    pub const fn has_overflowed(&self) -> bool {
        self.warned
    }
}
