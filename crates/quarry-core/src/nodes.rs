//! Node list loading — one `<name> <ipv4-address> <port>` per line.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Ports a compute node may be reached on.
pub const NODE_PORT_RANGE: RangeInclusive<u16> = 5000..=5050;

/// One configured compute node. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub name: String,
    pub address: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum NodeFileError {
    #[error("line {line}: expected `<name> <address> <port>`, got {found} token(s)")]
    TokenCount { line: usize, found: usize },
    #[error("line {line}: node name {name:?} has characters outside [a-zA-Z0-9]")]
    BadName { line: usize, name: String },
    #[error("line {line}: {text:?} is not an IPv4 address")]
    BadAddress { line: usize, text: String },
    #[error("line {line}: port {text:?} outside {lo}-{hi}", lo = NODE_PORT_RANGE.start(), hi = NODE_PORT_RANGE.end())]
    BadPort { line: usize, text: String },
}

/// Outcome of loading a node file. Loading stops at the first malformed
/// line; `nodes` holds every entry parsed before it.
#[derive(Debug)]
pub struct NodeList {
    pub nodes: Vec<NodeDescriptor>,
    pub error: Option<NodeFileError>,
}

pub fn parse_node_file(text: &str) -> NodeList {
    let mut nodes = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_node_line(line, trimmed) {
            Ok(node) => nodes.push(node),
            Err(error) => {
                return NodeList {
                    nodes,
                    error: Some(error),
                }
            }
        }
    }
    NodeList { nodes, error: None }
}

fn parse_node_line(line: usize, text: &str) -> Result<NodeDescriptor, NodeFileError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (name, address_text, port_text) = match tokens.as_slice() {
        [name, address, port] => (*name, *address, *port),
        other => {
            return Err(NodeFileError::TokenCount {
                line,
                found: other.len(),
            })
        }
    };
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(NodeFileError::BadName {
            line,
            name: name.to_string(),
        });
    }
    let address: Ipv4Addr = address_text.parse().map_err(|_| NodeFileError::BadAddress {
        line,
        text: address_text.to_string(),
    })?;
    let port: u16 = port_text
        .parse()
        .ok()
        .filter(|p| NODE_PORT_RANGE.contains(p))
        .ok_or_else(|| NodeFileError::BadPort {
            line,
            text: port_text.to_string(),
        })?;
    Ok(NodeDescriptor {
        name: name.to_string(),
        address,
        port,
    })
}
