//! Dispatcher state — the shared operation queue and run accounting.
//!
//! Every public operation is one transaction under a single lock, so the
//! counter reads coordinators use for loop decisions can never observe a
//! half-applied extract or reinsert. The lock is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use quarry_core::wire::RESULT_MODULUS;
use quarry_core::OperationSet;

/// Cloneable handle to the shared dispatch state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Mutex<State>>,
}

struct State {
    queue: OperationSet,
    pending: usize,
    initial_operations: usize,
    connected: usize,
    initial_nodes: usize,
    errored: usize,
    busy: usize,
    result: u32,
}

impl Dispatcher {
    pub fn new(operations: OperationSet, node_count: usize) -> Self {
        let pending = operations.len();
        Self {
            inner: Arc::new(Mutex::new(State {
                queue: operations,
                pending,
                initial_operations: pending,
                connected: node_count,
                initial_nodes: node_count,
                errored: 0,
                busy: 0,
                result: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().expect("dispatcher state lock poisoned")
    }

    /// Remove up to `n` operands as a chunk and mark its holder busy.
    pub fn extract(&self, n: usize) -> OperationSet {
        let mut s = self.state();
        let chunk = s.queue.take_front(n);
        s.pending -= chunk.len();
        s.busy += 1;
        chunk
    }

    /// Return a chunk to the queue and release its holder's busy slot.
    /// `is_error` additionally marks the holder as failed.
    pub fn reinsert(&self, chunk: OperationSet, is_error: bool) {
        let mut s = self.state();
        s.pending += chunk.len();
        s.queue.merge(chunk);
        s.busy -= 1;
        if is_error {
            s.errored += 1;
        }
    }

    /// Fold a trusted result into the accumulator and release the busy slot.
    pub fn record_result(&self, value: u32) {
        let mut s = self.state();
        s.result = (s.result + value % RESULT_MODULUS) % RESULT_MODULUS;
        s.busy -= 1;
    }

    /// Fold a quorum-verified value into the accumulator. The chunk's busy
    /// slot was already released when its packet was created.
    pub fn record_verified(&self, value: u32) {
        let mut s = self.state();
        s.result = (s.result + value % RESULT_MODULUS) % RESULT_MODULUS;
    }

    /// The in-flight chunk became a verification packet.
    pub fn packet_submitted(&self) {
        self.state().busy -= 1;
    }

    /// A node failed while no extracted chunk was in flight.
    pub fn node_errored(&self) {
        self.state().errored += 1;
    }

    /// Called exactly once per coordinator, on its terminal exit.
    pub fn node_disconnected(&self) {
        self.state().connected -= 1;
    }

    pub fn pending(&self) -> usize {
        self.state().pending
    }

    pub fn busy(&self) -> usize {
        self.state().busy
    }

    pub fn connected(&self) -> usize {
        self.state().connected
    }

    pub fn errored(&self) -> usize {
        self.state().errored
    }

    pub fn initial_nodes(&self) -> usize {
        self.state().initial_nodes
    }

    pub fn initial_operations(&self) -> usize {
        self.state().initial_operations
    }

    pub fn result(&self) -> u32 {
        self.state().result
    }

    /// No operations waiting and no chunk in flight, read atomically.
    /// Once true it stays true: new work can only appear through `reinsert`,
    /// which requires a chunk in flight.
    pub fn quiescent(&self) -> bool {
        let s = self.state();
        s.pending == 0 && s.busy == 0
    }

    /// Every configured node failed; no result is derivable.
    pub fn is_total_failure(&self) -> bool {
        let s = self.state();
        s.errored == s.initial_nodes
    }
}
