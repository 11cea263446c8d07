//! Summing kernels with call counters, standing in for compiled code in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use parskel_core::KernelError;

use crate::kernel::{names, KernelExecutable, Payload};

#[derive(Default)]
pub(crate) struct Calls {
    pub elementwise: AtomicUsize,
    pub generate: AtomicUsize,
    pub sequential: AtomicUsize,
    pub partial: AtomicUsize,
    pub combine: AtomicUsize,
    pub rows: AtomicUsize,
    /// Length of the partial slice seen by the last combine call.
    pub combined_partials: AtomicUsize,
}

impl Calls {
    pub fn folds(&self) -> usize {
        self.sequential.load(Ordering::SeqCst)
            + self.partial.load(Ordering::SeqCst)
            + self.combine.load(Ordering::SeqCst)
            + self.rows.load(Ordering::SeqCst)
    }
}

pub(crate) struct SumEnv {
    pub input: Vec<i64>,
    pub seed: i64,
    pub calls: Calls,
}

impl SumEnv {
    pub fn new(input: Vec<i64>, seed: i64) -> Self {
        Self {
            input,
            seed,
            calls: Calls::default(),
        }
    }
}

fn unexpected(entry: &str, payload: &Payload<'_, i64>) -> KernelError {
    KernelError::new(entry, format!("unexpected {} payload", payload.kind()))
}

/// Default entry doubles the environment input, or adds operands when given.
pub(crate) fn sum_kernel() -> KernelExecutable<i64, SumEnv> {
    KernelExecutable::new("double", |start, _end, payload, env: &SumEnv| {
        env.calls.elementwise.fetch_add(1, Ordering::SeqCst);
        match payload {
            Payload::Elementwise { operands, out } if operands.is_empty() => {
                for (k, o) in out.iter_mut().enumerate() {
                    *o = 2 * env.input[start + k];
                }
                Ok(())
            }
            Payload::Elementwise { operands, out } => {
                for (k, o) in out.iter_mut().enumerate() {
                    *o = operands.iter().map(|a| a.as_slice()[start + k]).sum();
                }
                Ok(())
            }
            other => Err(unexpected("double", &other)),
        }
    })
    .with_entry(names::GENERATE, |_, _, payload, env: &SumEnv| {
        env.calls.generate.fetch_add(1, Ordering::SeqCst);
        match payload {
            Payload::Elementwise { out, .. } => {
                out.fill(env.seed);
                Ok(())
            }
            other => Err(unexpected(names::GENERATE, &other)),
        }
    })
    .with_entry(names::FOLD_ALL_SEQUENTIAL, |start, end, payload, env: &SumEnv| {
        env.calls.sequential.fetch_add(1, Ordering::SeqCst);
        match payload {
            Payload::FoldAll { out } => {
                out[0] = env.seed + env.input[start..end].iter().sum::<i64>();
                Ok(())
            }
            other => Err(unexpected(names::FOLD_ALL_SEQUENTIAL, &other)),
        }
    })
    .with_entry(names::FOLD_ALL_PARTIAL, |start, _end, payload, env: &SumEnv| {
        env.calls.partial.fetch_add(1, Ordering::SeqCst);
        match payload {
            Payload::FoldPartial { stripe, partials } => {
                for (k, p) in partials.iter_mut().enumerate() {
                    let lo = (start + k) * stripe;
                    let hi = (lo + stripe).min(env.input.len());
                    *p = env.input[lo..hi].iter().sum();
                }
                Ok(())
            }
            other => Err(unexpected(names::FOLD_ALL_PARTIAL, &other)),
        }
    })
    .with_entry(names::FOLD_ALL_COMBINE, |_, _, payload, env: &SumEnv| {
        env.calls.combine.fetch_add(1, Ordering::SeqCst);
        match payload {
            Payload::FoldCombine { partials, out } => {
                env.calls
                    .combined_partials
                    .store(partials.len(), Ordering::SeqCst);
                out[0] = env.seed + partials.iter().sum::<i64>();
                Ok(())
            }
            other => Err(unexpected(names::FOLD_ALL_COMBINE, &other)),
        }
    })
    .with_entry(names::FOLD_ROWS, |start, _end, payload, env: &SumEnv| {
        env.calls.rows.fetch_add(1, Ordering::SeqCst);
        match payload {
            Payload::FoldRows { inner, out } => {
                for (k, o) in out.iter_mut().enumerate() {
                    let row = start + k;
                    *o = env.seed + env.input[row * inner..(row + 1) * inner].iter().sum::<i64>();
                }
                Ok(())
            }
            other => Err(unexpected(names::FOLD_ROWS, &other)),
        }
    })
}
