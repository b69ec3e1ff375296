//! quarry-node — Quarry compute node daemon.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use quarry_core::config::QuarryConfig;
use quarry_core::nodes::NODE_PORT_RANGE;
use quarry_node::{serve, NodeState};

fn print_usage() {
    println!("Usage: quarry-node <name> <capacity> <fault-percent> <port>");
    println!();
    println!("  name           Node name, [a-zA-Z0-9] only");
    println!("  capacity       Operation count absorbed without pushback (>= 1)");
    println!("  fault-percent  Probability an accepted chunk returns a corrupted result (0-100)");
    println!(
        "  port           Listen port, {}-{}",
        NODE_PORT_RANGE.start(),
        NODE_PORT_RANGE.end()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, capacity_text, fault_text, port_text) = match args.as_slice() {
        [name, capacity, fault, port] => (name.clone(), capacity, fault, port),
        _ => {
            print_usage();
            return Ok(());
        }
    };

    anyhow::ensure!(
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()),
        "node name {name:?} has characters outside [a-zA-Z0-9]"
    );
    let capacity: u32 = capacity_text.parse().context("capacity must be an integer")?;
    anyhow::ensure!(capacity >= 1, "capacity must be at least 1");
    let fault_percent: u32 = fault_text
        .parse()
        .context("fault-percent must be an integer")?;
    anyhow::ensure!(fault_percent <= 100, "fault-percent must be 0-100");
    let port: u16 = port_text.parse().context("port must be an integer")?;
    anyhow::ensure!(
        NODE_PORT_RANGE.contains(&port),
        "port must be {}-{}",
        NODE_PORT_RANGE.start(),
        NODE_PORT_RANGE.end()
    );

    let config = QuarryConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        QuarryConfig::default()
    });

    let bind: SocketAddr = format!("{}:{}", config.node.bind_address, port)
        .parse()
        .context("invalid bind address")?;

    tracing::info!(node = %name, capacity, fault_percent, %bind, "quarry-node starting");
    serve(NodeState::new(name, capacity, fault_percent), bind).await
}
