//! Compute RPC wire contract — the JSON request/reply exchanged with a
//! compute node, and the reserved rejection sentinel.
//!
//! These types ARE the protocol. A node's reply is a single integer:
//! `REJECTED_SENTINEL` for an admission refusal, any other value in
//! [0, RESULT_MODULUS) for a candidate result. Connectivity failures are
//! a transport concern and never appear in the reply body.

use serde::{Deserialize, Serialize};

use crate::ops::OperationSet;

/// Reserved reply value meaning "chunk rejected, nothing was computed".
pub const REJECTED_SENTINEL: i64 = -1;

/// All results are accumulated modulo this.
pub const RESULT_MODULUS: u32 = 5000;

/// Well-known kernel names.
pub mod kernels {
    pub const FIB: &str = "fib";
    pub const PRIME: &str = "prime";

    /// The fixed set of operators a chunk may carry.
    pub const ALL: &[&str] = &[FIB, PRIME];

    pub fn is_supported(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// Body of `POST /compute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub operations: OperationSet,
}

/// Reply to `POST /compute`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComputeReply {
    /// `REJECTED_SENTINEL`, or a candidate result in [0, RESULT_MODULUS).
    pub result: i64,
}

impl ComputeReply {
    pub fn rejected() -> Self {
        Self {
            result: REJECTED_SENTINEL,
        }
    }

    pub fn accepted(value: u32) -> Self {
        Self {
            result: i64::from(value),
        }
    }

    /// The carried value, if this reply is a candidate result within the
    /// contract's range.
    pub fn value(&self) -> Option<u32> {
        u32::try_from(self.result)
            .ok()
            .filter(|v| *v < RESULT_MODULUS)
    }
}
