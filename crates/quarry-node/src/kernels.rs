//! Numeric kernels — the fixed set of named operations a node can compute.
//!
//! Every kernel is a deterministic `u32 -> u32` reduced modulo
//! `RESULT_MODULUS`. Chunk execution folds kernel outputs with modular
//! addition, so the aggregate is independent of evaluation order.

use quarry_core::wire::{kernels, RESULT_MODULUS};
use quarry_core::OperationSet;

/// n-th Fibonacci number mod `RESULT_MODULUS` (fib(0) = 0, fib(1) = 1).
pub fn fib(n: u32) -> u32 {
    let (mut a, mut b) = (0u32, 1u32);
    for _ in 0..n {
        let next = (a + b) % RESULT_MODULUS;
        a = b;
        b = next;
    }
    a
}

/// n-th prime number mod `RESULT_MODULUS` (prime(1) = 2, prime(0) = 0).
pub fn prime(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let mut found = 0u32;
    let mut candidate = 1u32;
    while found < n {
        candidate += 1;
        if is_prime(candidate) {
            found += 1;
        }
    }
    candidate % RESULT_MODULUS
}

fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2u32;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

/// Apply the named kernel. None for operators outside the supported set.
pub fn apply(operator: &str, operand: u32) -> Option<u32> {
    match operator {
        kernels::FIB => Some(fib(operand)),
        kernels::PRIME => Some(prime(operand)),
        _ => None,
    }
}

/// True accumulated value of a chunk: sum of kernel outputs mod
/// `RESULT_MODULUS`. Operators outside the kernel set contribute nothing.
pub fn execute(operations: &OperationSet) -> u32 {
    let mut total = 0u32;
    for (operator, operand) in operations.iter() {
        if let Some(value) = apply(operator, operand) {
            total = (total + value) % RESULT_MODULUS;
        }
    }
    total
}
