//! Remote-call abstraction over compute nodes.
//!
//! Coordinators only ever see `ComputeClient`; the HTTP implementation and
//! the in-process doubles used in tests are interchangeable behind it.

use async_trait::async_trait;

use quarry_core::nodes::NodeDescriptor;
use quarry_core::wire::{ComputeReply, ComputeRequest, REJECTED_SENTINEL};
use quarry_core::OperationSet;

/// Outcome of one admission-controlled compute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeOutcome {
    /// The node computed the chunk and returned a candidate value.
    Accepted(u32),
    /// The node refused the chunk; nothing was computed.
    Rejected,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("node unreachable: {0}")]
    Unreachable(String),
    #[error("malformed reply: {0}")]
    BadReply(String),
}

/// One blocking compute call against one node. The call returns only when
/// the node replies or the transport reports a connectivity failure; there
/// is no client-side timeout.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    async fn compute(&self, chunk: &OperationSet) -> Result<ComputeOutcome, ClientError>;
}

/// `ComputeClient` over HTTP — `POST /compute` with a JSON body.
pub struct HttpComputeClient {
    url: String,
    http: reqwest::Client,
}

impl HttpComputeClient {
    pub fn new(node: &NodeDescriptor) -> Self {
        Self {
            url: format!("http://{}:{}/compute", node.address, node.port),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ComputeClient for HttpComputeClient {
    async fn compute(&self, chunk: &OperationSet) -> Result<ComputeOutcome, ClientError> {
        let reply: ComputeReply = self
            .http
            .post(&self.url)
            .json(&ComputeRequest {
                operations: chunk.clone(),
            })
            .send()
            .await
            .map_err(|e| ClientError::Unreachable(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::Unreachable(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::BadReply(e.to_string()))?;

        if reply.result == REJECTED_SENTINEL {
            return Ok(ComputeOutcome::Rejected);
        }
        match reply.value() {
            Some(value) => Ok(ComputeOutcome::Accepted(value)),
            None => Err(ClientError::BadReply(format!(
                "result {} outside the contract",
                reply.result
            ))),
        }
    }
}
