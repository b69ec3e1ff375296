//! quarry-node — the compute side of Quarry: kernels, admission control,
//! fault simulation, and the HTTP compute service.

pub mod admission;
pub mod kernels;
pub mod service;
pub mod stats;

pub use admission::AdmissionPolicy;
pub use service::{serve, NodeState};
pub use stats::NodeStats;
