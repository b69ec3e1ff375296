//! Verification packets — one per accepted chunk awaiting quorum.
//!
//! A packet holds an immutable chunk plus its election state: which nodes
//! voted, which are re-executing, and the vote counts per candidate value.
//! A packet verifies at most once, when some candidate gathers
//! `ceil(connected / 2)` votes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use quarry_core::OperationSet;

/// Minimum votes a candidate needs: `ceil(connected / 2)`.
pub fn quorum_threshold(connected: usize) -> usize {
    connected.div_ceil(2)
}

pub struct Packet {
    chunk: OperationSet,
    state: Mutex<PacketState>,
}

#[derive(Default)]
struct PacketState {
    verified: bool,
    processed_by: HashSet<String>,
    in_progress_by: HashSet<String>,
    votes: HashMap<u32, usize>,
}

impl Packet {
    fn new(chunk: OperationSet) -> Self {
        Self {
            chunk,
            state: Mutex::new(PacketState::default()),
        }
    }

    pub fn chunk(&self) -> &OperationSet {
        &self.chunk
    }

    fn state(&self) -> MutexGuard<'_, PacketState> {
        self.state.lock().expect("packet lock poisoned")
    }

    pub fn is_verified(&self) -> bool {
        self.state().verified
    }

    /// Enough voters are already committed: more than half the connected
    /// nodes have voted or are re-executing, and at least one re-execution
    /// is still running. Another processor would be wasted work.
    pub fn quorum_in_flight(&self, connected: usize) -> bool {
        let s = self.state();
        s.processed_by.len() + s.in_progress_by.len() > connected / 2
            && !s.in_progress_by.is_empty()
    }

    pub fn has_voted(&self, node: &str) -> bool {
        self.state().processed_by.contains(node)
    }

    /// Mark a node as re-executing this packet's chunk.
    pub fn begin(&self, node: &str) {
        self.state().in_progress_by.insert(node.to_string());
    }

    /// Undo `begin` for a node that failed before voting.
    pub fn abort(&self, node: &str) {
        self.state().in_progress_by.remove(node);
    }

    /// Record a vote. When the vote empties `in_progress_by`, the quorum is
    /// evaluated; returns the winning candidate when this call verifies the
    /// packet.
    pub fn record_vote(&self, node: &str, value: u32, connected: usize) -> Option<u32> {
        let mut s = self.state();
        s.in_progress_by.remove(node);
        s.processed_by.insert(node.to_string());
        *s.votes.entry(value).or_insert(0) += 1;
        if s.in_progress_by.is_empty() {
            finalize(&mut s, connected)
        } else {
            None
        }
    }

    /// Re-evaluate an election that may have been left without a possible
    /// conclusion — the threshold shrank after a disconnection, or every
    /// connected node voted without a majority. Returns a winner if the
    /// current votes now satisfy the quorum; an exhausted election is
    /// cleared so the packet is re-run from scratch.
    pub fn reconsider(&self, connected: usize) -> Option<u32> {
        let mut s = self.state();
        if s.verified || !s.in_progress_by.is_empty() {
            return None;
        }
        if let Some(winner) = finalize(&mut s, connected) {
            return Some(winner);
        }
        if s.processed_by.len() >= connected {
            tracing::debug!(voters = s.processed_by.len(), "election exhausted, restarting");
            s.processed_by.clear();
            s.votes.clear();
        }
        None
    }
}

fn finalize(s: &mut PacketState, connected: usize) -> Option<u32> {
    if s.verified {
        return None;
    }
    let threshold = quorum_threshold(connected);
    let winner = s
        .votes
        .iter()
        .find(|(_, &count)| count >= threshold)
        .map(|(&value, _)| value)?;
    s.verified = true;
    Some(winner)
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// The packets of one quorum run, oldest first.
#[derive(Default)]
pub struct PacketRegistry {
    packets: Mutex<Vec<Arc<Packet>>>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a packet for an accepted chunk, seeded with the computing
    /// node's own vote. A creation vote that already satisfies the quorum
    /// verifies the packet immediately; the winner is returned.
    pub fn submit(
        &self,
        chunk: OperationSet,
        node: &str,
        value: u32,
        connected: usize,
    ) -> Option<u32> {
        let packet = Arc::new(Packet::new(chunk));
        let winner = packet.record_vote(node, value, connected);
        self.lock().push(packet);
        winner
    }

    pub fn snapshot(&self) -> Vec<Arc<Packet>> {
        self.lock().clone()
    }

    pub fn all_verified(&self) -> bool {
        self.lock().iter().all(|p| p.is_verified())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Packet>>> {
        self.packets.lock().expect("packet registry lock poisoned")
    }
}
