//! Shared kernels for the integration tests.

use parskel_core::KernelError;
use parskel_exec::{names, KernelExecutable, Payload};

/// Input vector plus a fold seed, as a compiled kernel would capture them.
pub struct Env {
    pub input: Vec<i64>,
    pub seed: i64,
}

impl Env {
    pub fn new(input: Vec<i64>, seed: i64) -> Self {
        Self { input, seed }
    }
}

fn wrong(entry: &str, payload: &Payload<'_, i64>) -> KernelError {
    KernelError::new(entry, format!("unexpected {} payload", payload.kind()))
}

/// `square` for elementwise ops, plus summing fold entries.
pub fn square_and_sum() -> KernelExecutable<i64, Env> {
    KernelExecutable::new("square", |start, _end, payload, env: &Env| match payload {
        Payload::Elementwise { operands, out } if operands.is_empty() => {
            for (o, x) in out.iter_mut().zip(&env.input[start..]) {
                *o = x * x;
            }
            Ok(())
        }
        Payload::Elementwise { operands, out } => {
            for (k, o) in out.iter_mut().enumerate() {
                *o = operands.iter().map(|a| a.as_slice()[start + k]).product();
            }
            Ok(())
        }
        other => Err(wrong("square", &other)),
    })
    .with_entry(names::GENERATE, |_, _, payload, env: &Env| match payload {
        Payload::Elementwise { out, .. } => {
            out.fill(env.seed);
            Ok(())
        }
        other => Err(wrong(names::GENERATE, &other)),
    })
    .with_entry(names::FOLD_ALL_SEQUENTIAL, |start, end, payload, env: &Env| {
        match payload {
            Payload::FoldAll { out } => {
                out[0] = env.seed + env.input[start..end].iter().sum::<i64>();
                Ok(())
            }
            other => Err(wrong(names::FOLD_ALL_SEQUENTIAL, &other)),
        }
    })
    .with_entry(names::FOLD_ALL_PARTIAL, |start, _end, payload, env: &Env| {
        match payload {
            Payload::FoldPartial { stripe, partials } => {
                for (k, p) in partials.iter_mut().enumerate() {
                    let lo = (start + k) * stripe;
                    let hi = (lo + stripe).min(env.input.len());
                    *p = env.input[lo..hi].iter().sum();
                }
                Ok(())
            }
            other => Err(wrong(names::FOLD_ALL_PARTIAL, &other)),
        }
    })
    .with_entry(names::FOLD_ALL_COMBINE, |_, _, payload, env: &Env| match payload {
        Payload::FoldCombine { partials, out } => {
            out[0] = env.seed + partials.iter().sum::<i64>();
            Ok(())
        }
        other => Err(wrong(names::FOLD_ALL_COMBINE, &other)),
    })
    .with_entry(names::FOLD_ROWS, |start, _end, payload, env: &Env| match payload {
        Payload::FoldRows { inner, out } => {
            for (k, o) in out.iter_mut().enumerate() {
                let row = start + k;
                *o = env.seed + env.input[row * inner..(row + 1) * inner].iter().sum::<i64>();
            }
            Ok(())
        }
        other => Err(wrong(names::FOLD_ROWS, &other)),
    })
}
