//! Quorum-mode coordinator — adaptive dispatch plus majority verification.
//!
//! Phase A matches the trusted loop, except an accepted result only opens a
//! verification packet instead of being recorded. Once the queue is drained,
//! phase B walks the packet registry and re-executes other nodes' packets
//! until every packet carries a majority-agreed value. Verified values are
//! folded into the accumulator exactly once.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{ClientError, ComputeClient, ComputeOutcome};
use crate::coordinator::{grown, initial_chunk_size, shrunk};
use crate::packet::{Packet, PacketRegistry};
use crate::state::Dispatcher;

pub struct QuorumCoordinator {
    name: String,
    client: Arc<dyn ComputeClient>,
    dispatcher: Dispatcher,
    registry: Arc<PacketRegistry>,
    chunk_size: usize,
    idle_poll: Duration,
}

impl QuorumCoordinator {
    pub fn new(
        name: impl Into<String>,
        client: Arc<dyn ComputeClient>,
        dispatcher: Dispatcher,
        registry: Arc<PacketRegistry>,
        idle_poll: Duration,
    ) -> Self {
        let chunk_size = initial_chunk_size(&dispatcher);
        Self {
            name: name.into(),
            client,
            dispatcher,
            registry,
            chunk_size,
            idle_poll,
        }
    }

    /// Run to terminal exit. Always ends by reporting the disconnection.
    pub async fn run(mut self) {
        if let Err(e) = self.work().await {
            tracing::warn!(node = %self.name, error = %e, "connection lost, redistributing in-flight work");
        }
        tracing::debug!(node = %self.name, "coordinator finished");
        self.dispatcher.node_disconnected();
    }

    async fn work(&mut self) -> Result<(), ClientError> {
        loop {
            let dispatched = self.drain_queue().await?;
            let verified = self.verify_packets().await?;
            if self.dispatcher.quiescent() && self.registry.all_verified() {
                return Ok(());
            }
            if !dispatched && !verified {
                tokio::time::sleep(self.idle_poll).await;
            }
        }
    }

    /// Phase A: pull chunks while the queue has pending operations. An
    /// accepted result opens a packet seeded with this node's vote.
    /// Returns whether any remote call was made.
    async fn drain_queue(&mut self) -> Result<bool, ClientError> {
        let mut called = false;
        while self.dispatcher.pending() > 0 {
            let chunk = self.dispatcher.extract(self.chunk_size);
            if chunk.is_empty() {
                self.dispatcher.reinsert(chunk, false);
                break;
            }
            called = true;
            match self.client.compute(&chunk).await {
                Ok(ComputeOutcome::Accepted(value)) => {
                    tracing::info!(node = %self.name, value, "unverified result, opening packet");
                    let winner = self.registry.submit(
                        chunk,
                        &self.name,
                        value,
                        self.dispatcher.connected(),
                    );
                    self.dispatcher.packet_submitted();
                    if let Some(winner) = winner {
                        self.dispatcher.record_verified(winner);
                        tracing::info!(node = %self.name, winner, "packet verified at creation");
                    }
                    self.chunk_size = grown(self.chunk_size);
                }
                Ok(ComputeOutcome::Rejected) => {
                    tracing::debug!(node = %self.name, size = chunk.len(), "chunk refused, backing off");
                    self.dispatcher.reinsert(chunk, false);
                    self.chunk_size = shrunk(self.chunk_size);
                }
                Err(e) => {
                    self.dispatcher.reinsert(chunk, true);
                    return Err(e);
                }
            }
        }
        Ok(called)
    }

    /// Phase B: re-execute other nodes' packets and evaluate quorums.
    /// Returns whether any remote call was made.
    async fn verify_packets(&mut self) -> Result<bool, ClientError> {
        let mut called = false;
        for packet in self.registry.snapshot() {
            if packet.is_verified() {
                continue;
            }
            if packet.has_voted(&self.name) {
                if let Some(winner) = packet.reconsider(self.dispatcher.connected()) {
                    self.dispatcher.record_verified(winner);
                    tracing::info!(node = %self.name, winner, "packet verified");
                }
                continue;
            }
            if packet.quorum_in_flight(self.dispatcher.connected()) {
                continue;
            }
            packet.begin(&self.name);
            called = true;
            if let Err(e) = self.reexecute(&packet).await {
                packet.abort(&self.name);
                self.dispatcher.node_errored();
                return Err(e);
            }
        }
        Ok(called)
    }

    /// Retry the packet's fixed chunk until the node admits it, then vote.
    async fn reexecute(&mut self, packet: &Packet) -> Result<(), ClientError> {
        loop {
            match self.client.compute(packet.chunk()).await? {
                ComputeOutcome::Accepted(value) => {
                    tracing::debug!(node = %self.name, value, "recomputed packet value");
                    if let Some(winner) =
                        packet.record_vote(&self.name, value, self.dispatcher.connected())
                    {
                        self.dispatcher.record_verified(winner);
                        tracing::info!(node = %self.name, winner, "packet verified");
                    }
                    return Ok(());
                }
                ComputeOutcome::Rejected => continue,
            }
        }
    }
}
