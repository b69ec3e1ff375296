//! Compute HTTP service — admission, execution, fault simulation, status.
//!
//! One route does the work: `POST /compute` takes a chunk of operations and
//! replies with a single integer — the rejection sentinel when admission
//! control pushes back, a candidate value otherwise. `GET /status` reports
//! the node's configuration and counters.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::Rng;
use serde::Serialize;

use quarry_core::wire::{ComputeReply, ComputeRequest, RESULT_MODULUS};

use crate::admission::AdmissionPolicy;
use crate::kernels;
use crate::stats::NodeStats;

#[derive(Clone)]
pub struct NodeState {
    pub name: String,
    pub policy: AdmissionPolicy,
    /// Probability in percent that an accepted chunk's reply is corrupted.
    pub fault_percent: u32,
    pub stats: NodeStats,
}

impl NodeState {
    pub fn new(name: impl Into<String>, capacity: u32, fault_percent: u32) -> Self {
        Self {
            name: name.into(),
            policy: AdmissionPolicy::new(capacity),
            fault_percent,
            stats: NodeStats::new(),
        }
    }
}

pub fn router(state: NodeState) -> Router {
    Router::new()
        .route("/compute", post(handle_compute))
        .route("/status", get(handle_status))
        .with_state(state)
}

pub async fn serve(state: NodeState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "compute service listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ── /compute (POST) ───────────────────────────────────────────────────────────

pub async fn handle_compute(
    State(state): State<NodeState>,
    Json(request): Json<ComputeRequest>,
) -> Json<ComputeReply> {
    let submitted = request.operations.len();

    if !state.policy.admit(submitted) {
        state.stats.record_rejected();
        tracing::debug!(node = %state.name, submitted, "chunk rejected");
        return Json(ComputeReply::rejected());
    }

    let value = kernels::execute(&request.operations);
    state.stats.record_accepted(submitted);

    let reported = if draw_fault(state.fault_percent) {
        state.stats.record_faulted();
        rand::thread_rng().gen_range(0..RESULT_MODULUS)
    } else {
        value
    };
    tracing::debug!(node = %state.name, submitted, reported, "chunk computed");
    Json(ComputeReply::accepted(reported))
}

/// Draw against the configured fault probability. Only accepted chunks get
/// here; rejections are never corrupted.
fn draw_fault(fault_percent: u32) -> bool {
    fault_percent > 0 && rand::thread_rng().gen_range(0..100) < fault_percent
}

// ── /status (GET) ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub capacity: u32,
    pub fault_percent: u32,
    pub accepted: u64,
    pub rejected: u64,
    pub faulted: u64,
    pub operands: u64,
}

pub async fn handle_status(State(state): State<NodeState>) -> Json<NodeStatus> {
    Json(NodeStatus {
        name: state.name.clone(),
        capacity: state.policy.capacity(),
        fault_percent: state.fault_percent,
        accepted: state.stats.accepted(),
        rejected: state.stats.rejected(),
        faulted: state.stats.faulted(),
        operands: state.stats.operands(),
    })
}
