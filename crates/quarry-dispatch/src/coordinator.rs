//! Per-node coordinator — the adaptive-chunking work loop, trusted mode.
//!
//! One coordinator per compute node. It repeatedly extracts a chunk sized
//! to the node's recent behavior and calls the node: an accepted result is
//! recorded and the chunk size grows 1.5x; a rejection returns the chunk to
//! the queue and halves the size; a connectivity failure returns the chunk,
//! marks the node errored, and ends the coordinator for good.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{ClientError, ComputeClient, ComputeOutcome};
use crate::state::Dispatcher;

pub struct Coordinator {
    name: String,
    client: Arc<dyn ComputeClient>,
    dispatcher: Dispatcher,
    chunk_size: usize,
    idle_poll: Duration,
}

/// Chunk growth on acceptance: 1.5x, with 1 stepping to 2 so integer
/// growth can escape it.
pub(crate) fn grown(size: usize) -> usize {
    if size == 1 {
        2
    } else {
        size + size / 2
    }
}

/// Chunk shrink on rejection: halve, never below 1.
pub(crate) fn shrunk(size: usize) -> usize {
    (size / 2).max(1)
}

/// First chunk size: an even share of the initial pool, at least 1.
pub(crate) fn initial_chunk_size(dispatcher: &Dispatcher) -> usize {
    (dispatcher.initial_operations() / dispatcher.initial_nodes().max(1)).max(1)
}

impl Coordinator {
    pub fn new(
        name: impl Into<String>,
        client: Arc<dyn ComputeClient>,
        dispatcher: Dispatcher,
        idle_poll: Duration,
    ) -> Self {
        let chunk_size = initial_chunk_size(&dispatcher);
        Self {
            name: name.into(),
            client,
            dispatcher,
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
            self.drain_queue().await?;
            if self.dispatcher.quiescent() {
                return Ok(());
            }
            tokio::time::sleep(self.idle_poll).await;
        }
    }

    /// Inner loop: pull chunks while the queue has pending operations.
    async fn drain_queue(&mut self) -> Result<(), ClientError> {
        while self.dispatcher.pending() > 0 {
            let chunk = self.dispatcher.extract(self.chunk_size);
            if chunk.is_empty() {
                self.dispatcher.reinsert(chunk, false);
                break;
            }
            match self.client.compute(&chunk).await {
                Ok(ComputeOutcome::Accepted(value)) => {
                    self.dispatcher.record_result(value);
                    tracing::info!(node = %self.name, value, "intermediate result");
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
        Ok(())
    }
}
