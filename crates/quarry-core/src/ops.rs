//! Operation pool — the keyed operand collection shared by the dispatcher
//! and the nodes.
//!
//! One `OperationSet` shape serves three roles: the dispatcher's queue, the
//! chunk handed to a node for one call, and the payload of a verification
//! packet. Keys iterate in order, which `take_front` relies on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::wire::kernels;

/// Operator name → operand sequence. Order within a sequence is not
/// significant; the total operand count is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSet {
    entries: BTreeMap<String, Vec<u32>>,
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total operand count across all operators.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    pub fn push(&mut self, operator: &str, operand: u32) {
        self.entries
            .entry(operator.to_string())
            .or_default()
            .push(operand);
    }

    /// Iterate `(operator, operand)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries
            .iter()
            .flat_map(|(op, operands)| operands.iter().map(move |n| (op.as_str(), *n)))
    }

    /// Remove up to `n` operands, walking keys in order, into a new set.
    /// Returns fewer than `n` when the pool runs dry, possibly an empty set.
    pub fn take_front(&mut self, n: usize) -> OperationSet {
        let mut taken = OperationSet::new();
        let mut remaining = n;
        for (operator, operands) in self.entries.iter_mut() {
            if remaining == 0 {
                break;
            }
            let count = remaining.min(operands.len());
            for operand in operands.drain(..count) {
                taken.push(operator, operand);
            }
            remaining -= count;
        }
        self.entries.retain(|_, operands| !operands.is_empty());
        taken
    }

    /// Fold another set's entries back in.
    pub fn merge(&mut self, other: OperationSet) {
        for (operator, mut operands) in other.entries {
            self.entries
                .entry(operator)
                .or_default()
                .append(&mut operands);
        }
    }
}

// ── Operation file parsing ────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum OperationFileError {
    #[error("line {line}: expected `<operator> <operand>`, got {found} token(s)")]
    TokenCount { line: usize, found: usize },
    #[error("line {line}: operand {text:?} is not an unsigned integer")]
    BadOperand { line: usize, text: String },
    #[error("line {line}: unknown operator {name:?}")]
    UnknownOperator { line: usize, name: String },
}

/// Parse an operation file: one `<operator> <operand>` per line, blank
/// lines skipped. Any malformed line rejects the whole file.
pub fn parse_operation_file(text: &str) -> Result<OperationSet, OperationFileError> {
    let mut set = OperationSet::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let (operator, operand_text) = match tokens.as_slice() {
            [operator, operand] => (*operator, *operand),
            other => {
                return Err(OperationFileError::TokenCount {
                    line,
                    found: other.len(),
                })
            }
        };
        if !kernels::is_supported(operator) {
            return Err(OperationFileError::UnknownOperator {
                line,
                name: operator.to_string(),
            });
        }
        let operand: u32 = operand_text
            .parse()
            .map_err(|_| OperationFileError::BadOperand {
                line,
                text: operand_text.to_string(),
            })?;
        set.push(operator, operand);
    }
    Ok(set)
}
