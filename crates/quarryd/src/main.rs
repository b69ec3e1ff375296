//! quarryd — Quarry dispatch daemon: farms an operation pool out to compute
//! nodes and reports the accumulated result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use quarry_core::config::QuarryConfig;
use quarry_core::nodes::parse_node_file;
use quarry_core::ops::parse_operation_file;
use quarry_dispatch::{run, ComputeClient, HttpComputeClient, NodeClient, RunMode};

fn print_usage() {
    println!("Usage: quarryd <operations-file> <node-file> [--verify]");
    println!();
    println!("  operations-file  One `<operator> <operand>` per line (operators: fib, prime)");
    println!("  node-file        One `<name> <ipv4-address> <port>` per line");
    println!("  --verify         Accept a result only when a majority of nodes agrees on it");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut verify = false;
    let mut files = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verify" => verify = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ => files.push(arg),
        }
    }
    let (operations_path, node_path) = match files.as_slice() {
        [operations, nodes] => (operations.clone(), nodes.clone()),
        _ => {
            print_usage();
            return Ok(());
        }
    };

    if let Err(e) = QuarryConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = QuarryConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        QuarryConfig::default()
    });

    let operations_text = std::fs::read_to_string(&operations_path)
        .with_context(|| format!("failed to read operations file {operations_path}"))?;
    let operations = parse_operation_file(&operations_text)
        .with_context(|| format!("invalid operations file {operations_path}"))?;

    let node_text = std::fs::read_to_string(&node_path)
        .with_context(|| format!("failed to read node file {node_path}"))?;
    let list = parse_node_file(&node_text);
    if let Some(e) = &list.error {
        tracing::warn!(error = %e, loaded = list.nodes.len(), "node file malformed, loading stopped");
    }
    anyhow::ensure!(!list.nodes.is_empty(), "no usable nodes in {node_path}");

    let mode = if verify {
        RunMode::Quorum
    } else {
        RunMode::Trusted
    };
    tracing::info!(
        operations = operations.len(),
        nodes = list.nodes.len(),
        ?mode,
        "quarryd starting"
    );

    let nodes = list
        .nodes
        .iter()
        .map(|node| NodeClient {
            name: node.name.clone(),
            client: Arc::new(HttpComputeClient::new(node)) as Arc<dyn ComputeClient>,
        })
        .collect();

    let idle_poll = Duration::from_millis(config.dispatch.idle_poll_ms);
    let outcome = run(operations, nodes, mode, idle_poll).await;

    match outcome.result {
        Some(value) => {
            println!("Result: {value}");
            println!("Elapsed: {:.3}s", outcome.elapsed.as_secs_f64());
            Ok(())
        }
        None => anyhow::bail!("every node failed, no result could be computed"),
    }
}
