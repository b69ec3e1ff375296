//! Per-node counters, exposed on `/status` and in logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct NodeStats {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    faulted: AtomicU64,
    operands: AtomicU64,
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self, operands: usize) {
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
        self.inner
            .operands
            .fetch_add(operands as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_faulted(&self) {
        self.inner.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.inner.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    pub fn faulted(&self) -> u64 {
        self.inner.faulted.load(Ordering::Relaxed)
    }

    pub fn operands(&self) -> u64 {
        self.inner.operands.load(Ordering::Relaxed)
    }
}
