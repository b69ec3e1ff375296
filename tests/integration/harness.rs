//! Scripted in-process compute clients.
//!
//! A `ScriptedNode` plays back a fixed sequence of behaviors, one per call,
//! repeating the last entry forever. Its "kernel" is the identity function:
//! the true value of a chunk is the sum of its operands mod 5000, so tests
//! know the expected result without running real kernels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use quarry_core::wire::RESULT_MODULUS;
use quarry_core::OperationSet;
use quarry_dispatch::{ClientError, ComputeClient, ComputeOutcome};

/// True value of a chunk under the harness kernel.
pub fn true_value(chunk: &OperationSet) -> u32 {
    chunk
        .iter()
        .fold(0u32, |acc, (_, operand)| (acc + operand % RESULT_MODULUS) % RESULT_MODULUS)
}

/// What a scripted node does with one call.
#[derive(Clone, Copy, Debug)]
pub enum Step {
    /// Compute the true value.
    Honest,
    /// Refuse the chunk.
    Reject,
    /// Compute, then report this fixed wrong value.
    Lie(u32),
    /// Fail with a connectivity error.
    Fail,
}

pub struct ScriptedNode {
    steps: Vec<Step>,
    calls: AtomicUsize,
}

impl ScriptedNode {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn honest() -> Arc<Self> {
        Self::new(vec![Step::Honest])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ComputeClient for ScriptedNode {
    async fn compute(&self, chunk: &OperationSet) -> Result<ComputeOutcome, ClientError> {
        // A real remote call suspends the coordinator; so does this one.
        tokio::task::yield_now().await;
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let step = self.steps[call.min(self.steps.len() - 1)];
        match step {
            Step::Honest => Ok(ComputeOutcome::Accepted(true_value(chunk))),
            Step::Reject => Ok(ComputeOutcome::Rejected),
            Step::Lie(value) => Ok(ComputeOutcome::Accepted(value)),
            Step::Fail => Err(ClientError::Unreachable("scripted failure".into())),
        }
    }
}
