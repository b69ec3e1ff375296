//! End-to-end runs over real axum nodes on localhost.

use std::net::Ipv4Addr;
use std::sync::Arc;

use quarry_core::nodes::NodeDescriptor;
use quarry_core::ops::parse_operation_file;
use quarry_dispatch::{ComputeClient, ComputeOutcome, HttpComputeClient, NodeClient, RunMode};
use quarry_node::service::router;
use quarry_node::NodeState;

use crate::*;

/// Spawn a compute node on an ephemeral localhost port.
async fn spawn_node(name: &str, capacity: u32, fault_percent: u32) -> NodeDescriptor {
    let state = NodeState::new(name, capacity, fault_percent);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("serve");
    });
    NodeDescriptor {
        name: name.to_string(),
        address: Ipv4Addr::LOCALHOST,
        port,
    }
}

fn http_node(descriptor: &NodeDescriptor) -> NodeClient {
    NodeClient {
        name: descriptor.name.clone(),
        client: Arc::new(HttpComputeClient::new(descriptor)) as Arc<dyn ComputeClient>,
    }
}

/// A localhost port with nothing listening on it.
async fn dead_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fib_prime_scenario_end_to_end() {
    // fib 10 twice plus prime 7: (2*55 + 17) mod 5000 = 127, however the
    // chunks get split.
    let operations =
        parse_operation_file("fib 10\nfib 10\nprime 7\n").expect("operations should parse");
    let alpha = spawn_node("alpha", 1_000_000, 0).await;
    let beta = spawn_node("beta", 1_000_000, 0).await;

    let outcome = run_engine(
        operations,
        vec![http_node(&alpha), http_node(&beta)],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, Some(127));
    assert_eq!(outcome.errored_nodes, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn quorum_mode_end_to_end() {
    let operations =
        parse_operation_file("fib 10\nfib 10\nprime 7\n").expect("operations should parse");
    let nodes = vec![
        spawn_node("alpha", 1_000_000, 0).await,
        spawn_node("beta", 1_000_000, 0).await,
        spawn_node("gamma", 1_000_000, 0).await,
    ];

    let outcome = run_engine(
        operations,
        nodes.iter().map(http_node).collect(),
        RunMode::Quorum,
    )
    .await;

    assert_eq!(outcome.result, Some(127));
    assert_eq!(outcome.errored_nodes, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn oversized_chunk_is_always_rejected_over_http() {
    // 100 operations against capacity 10 clamps the rejection rate to 100%.
    let descriptor = spawn_node("tiny", 10, 0).await;
    let client = HttpComputeClient::new(&descriptor);
    let chunk = counting_ops(100);

    for _ in 0..3 {
        let outcome = client.compute(&chunk).await.expect("node is reachable");
        assert_eq!(outcome, ComputeOutcome::Rejected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_nodes_report_total_failure() {
    let alpha = NodeDescriptor {
        name: "alpha".to_string(),
        address: Ipv4Addr::LOCALHOST,
        port: dead_port().await,
    };
    let beta = NodeDescriptor {
        name: "beta".to_string(),
        address: Ipv4Addr::LOCALHOST,
        port: dead_port().await,
    };

    let outcome = run_engine(
        counting_ops(5),
        vec![http_node(&alpha), http_node(&beta)],
        RunMode::Trusted,
    )
    .await;

    assert_eq!(outcome.result, None);
    assert_eq!(outcome.errored_nodes, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn status_endpoint_reports_counters() {
    let descriptor = spawn_node("alpha", 1_000_000, 0).await;
    let client = HttpComputeClient::new(&descriptor);
    client
        .compute(&counting_ops(4))
        .await
        .expect("node is reachable");

    let url = format!(
        "http://{}:{}/status",
        descriptor.address, descriptor.port
    );
    let status: serde_json::Value = reqwest::get(&url)
        .await
        .expect("status request")
        .json()
        .await
        .expect("status body");

    assert_eq!(status["name"], "alpha");
    assert_eq!(status["capacity"], 1_000_000);
    assert_eq!(status["accepted"], 1);
    assert_eq!(status["operands"], 4);
}
