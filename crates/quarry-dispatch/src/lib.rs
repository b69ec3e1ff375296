//! quarry-dispatch — the dispatch engine: shared queue and accounting,
//! per-node adaptive-chunking coordinators, and quorum verification.

pub mod client;
pub mod coordinator;
pub mod engine;
pub mod packet;
pub mod quorum;
pub mod state;

pub use client::{ClientError, ComputeClient, ComputeOutcome, HttpComputeClient};
pub use engine::{run, NodeClient, RunMode, RunOutcome};
pub use state::Dispatcher;
