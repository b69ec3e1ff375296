//! Engine — spawns one coordinator task per node and waits for all of them.
//!
//! The engine's wait is completion-based: every coordinator ends by calling
//! `node_disconnected`, and the run is over when every task has exited. No
//! result is reported before that point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use quarry_core::OperationSet;

use crate::client::ComputeClient;
use crate::coordinator::Coordinator;
use crate::packet::PacketRegistry;
use crate::quorum::QuorumCoordinator;
use crate::state::Dispatcher;

/// How accepted results are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Nodes are trusted; results are recorded as returned.
    Trusted,
    /// A result counts only once a majority of connected nodes agrees on it.
    Quorum,
}

/// A named node and the client used to reach it.
pub struct NodeClient {
    pub name: String,
    pub client: Arc<dyn ComputeClient>,
}

/// Result of a full run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Accumulated value, or None when every node failed.
    pub result: Option<u32>,
    pub elapsed: Duration,
    pub errored_nodes: usize,
}

pub async fn run(
    operations: OperationSet,
    nodes: Vec<NodeClient>,
    mode: RunMode,
    idle_poll: Duration,
) -> RunOutcome {
    let started = Instant::now();
    let dispatcher = Dispatcher::new(operations, nodes.len());
    let registry = Arc::new(PacketRegistry::new());

    let mut tasks = JoinSet::new();
    for node in nodes {
        match mode {
            RunMode::Trusted => {
                tasks.spawn(
                    Coordinator::new(node.name, node.client, dispatcher.clone(), idle_poll).run(),
                );
            }
            RunMode::Quorum => {
                tasks.spawn(
                    QuorumCoordinator::new(
                        node.name,
                        node.client,
                        dispatcher.clone(),
                        registry.clone(),
                        idle_poll,
                    )
                    .run(),
                );
            }
        }
    }
    while tasks.join_next().await.is_some() {}

    let elapsed = started.elapsed();
    let errored_nodes = dispatcher.errored();
    let result = if dispatcher.is_total_failure() {
        None
    } else {
        Some(dispatcher.result())
    };
    tracing::info!(?result, errored_nodes, elapsed_ms = elapsed.as_millis() as u64, "run finished");
    RunOutcome {
        result,
        elapsed,
        errored_nodes,
    }
}
