//! Trusted-mode engine scenarios against scripted nodes.

use crate::harness::{ScriptedNode, Step};
use crate::*;
use quarry_dispatch::RunMode;

#[tokio::test]
async fn two_honest_nodes_compute_the_full_pool() {
    // Operands 0..10 sum to 45.
    let outcome = run_engine(
        counting_ops(10),
        vec![
            node("alpha", ScriptedNode::honest()),
            node("beta", ScriptedNode::honest()),
        ],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, Some(45));
    assert_eq!(outcome.errored_nodes, 0);
}

#[tokio::test]
async fn empty_pool_completes_with_zero() {
    let outcome = run_engine(
        ops(&[]),
        vec![
            node("alpha", ScriptedNode::honest()),
            node("beta", ScriptedNode::honest()),
        ],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, Some(0));
}

#[tokio::test]
async fn rejecting_node_does_not_stall_the_run() {
    let rejecter = ScriptedNode::new(vec![Step::Reject]);
    let outcome = run_engine(
        counting_ops(10),
        vec![
            node("alpha", ScriptedNode::honest()),
            node("beta", rejecter.clone()),
        ],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, Some(45));
    assert_eq!(outcome.errored_nodes, 0);
}

#[tokio::test]
async fn failed_node_work_is_redistributed() {
    let failing = ScriptedNode::new(vec![Step::Fail]);
    let outcome = run_engine(
        counting_ops(10),
        vec![
            node("alpha", ScriptedNode::honest()),
            node("beta", failing.clone()),
        ],
        RunMode::Trusted,
    )
    .await;

    // The failing node's in-flight chunk went back to the queue and the
    // surviving node computed everything.
    assert_eq!(outcome.result, Some(45));
    assert_eq!(outcome.errored_nodes, 1);
    assert_eq!(failing.calls(), 1);
}

#[tokio::test]
async fn all_nodes_failing_reports_total_failure() {
    let outcome = run_engine(
        counting_ops(10),
        vec![
            node("alpha", ScriptedNode::new(vec![Step::Fail])),
            node("beta", ScriptedNode::new(vec![Step::Fail])),
        ],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, None);
    assert_eq!(outcome.errored_nodes, 2);
}

#[tokio::test]
async fn single_node_runs_everything() {
    let solo = ScriptedNode::honest();
    let outcome = run_engine(
        counting_ops(7),
        vec![node("solo", solo.clone())],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, Some(21));
    assert!(solo.calls() >= 1);
}

#[tokio::test]
async fn chunk_size_adapts_to_rejections() {
    // One node, 8 operands (sum 28), initial chunk size 8. Two rejections
    // halve the chunk to 2, then acceptances grow it 1.5x again:
    //   reject(8), reject(4), accept(2), accept(3), accept(3) — 5 calls.
    let moody = ScriptedNode::new(vec![Step::Reject, Step::Reject, Step::Honest]);
    let outcome = run_engine(
        counting_ops(8),
        vec![node("moody", moody.clone())],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, Some(28));
    assert_eq!(moody.calls(), 5);
}
