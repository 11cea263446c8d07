use std::fmt;

use parskel_core::{ExecError, ExecResult, Shape};

/// Whether the fold has a seed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    /// No seed; the input must be non-empty.
    Inclusive,
    /// Seeded; an empty input folds to the seed.
    Exclusive,
}

/// Result of a fold that needs no fold kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degenerate {
    /// Allocate an empty output of this shape, call nothing.
    Empty(Shape),
    /// Fill an output of this shape with the seed via the generate entry.
    Seed(Shape),
}

/// How a fold will run, decided once per dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldPlan {
    Degenerate(Degenerate),
    /// One pass over `[0, len)` on a single worker.
    Sequential { len: usize },
    /// Stripe partials in parallel, then combine them on one worker.
    TwoPhaseParallel { len: usize, stripe: usize, steps: usize },
    /// Parallel over outer indices, one whole inner run per call.
    RowWise { outer: Shape, inner: usize },
}

impl FoldPlan {
    /// Label used in logs and dispatch metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FoldPlan::Degenerate(Degenerate::Empty(_)) => "fold/empty",
            FoldPlan::Degenerate(Degenerate::Seed(_)) => "fold/seed",
            FoldPlan::Sequential { .. } => "fold_all/sequential",
            FoldPlan::TwoPhaseParallel { .. } => "fold_all/two_phase",
            FoldPlan::RowWise { .. } => "fold_rows/row_wise",
        }
    }
}

impl fmt::Display for FoldPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldPlan::Degenerate(Degenerate::Empty(s)) => write!(f, "empty output {}", s),
            FoldPlan::Degenerate(Degenerate::Seed(s)) => write!(f, "seed broadcast over {}", s),
            FoldPlan::Sequential { len } => write!(f, "sequential over {}", len),
            FoldPlan::TwoPhaseParallel { len, stripe, steps } => {
                write!(f, "two-phase over {} ({} stripes of {})", len, steps, stripe)
            }
            FoldPlan::RowWise { outer, inner } => {
                write!(f, "row-wise over {} rows of {}", outer, inner)
            }
        }
    }
}

/// Stripe width and stripe count for the first phase of a parallel fold:
/// `stripe = max(large_ppt, len / (workers * stripes_per_worker))`,
/// `steps = ceil(len / stripe)`.
pub fn stripe_plan(
    len: usize,
    workers: usize,
    large_ppt: usize,
    stripes_per_worker: usize,
) -> (usize, usize) {
    let divisor = workers.max(1).saturating_mul(stripes_per_worker.max(1));
    let stripe = large_ppt.max(len / divisor).max(1);
    (stripe, len.div_ceil(stripe))
}

/// Plan a fold of a length-`len` vector to a scalar.
pub fn plan_fold_all(
    len: usize,
    kind: FoldKind,
    workers: usize,
    large_ppt: usize,
    stripes_per_worker: usize,
) -> ExecResult<FoldPlan> {
    if len == 0 {
        return match kind {
            FoldKind::Inclusive => Err(ExecError::Precondition(
                "inclusive fold over an empty array".into(),
            )),
            FoldKind::Exclusive => Ok(FoldPlan::Degenerate(Degenerate::Seed(Shape::scalar()))),
        };
    }
    if workers <= 1 {
        return Ok(FoldPlan::Sequential { len });
    }
    let (stripe, steps) = stripe_plan(len, workers, large_ppt, stripes_per_worker);
    Ok(FoldPlan::TwoPhaseParallel { len, stripe, steps })
}

/// Plan a fold of the innermost dimension of `shape`.
pub fn plan_fold_rows(shape: &Shape, kind: FoldKind) -> ExecResult<FoldPlan> {
    let (outer, inner) = shape.split_innermost().ok_or_else(|| {
        ExecError::Precondition("row-wise fold of a rank-0 array".into())
    })?;
    // Empty rows with a seed yield the seed over the outer shape floored to
    // one, even where the outer shape itself is empty.
    if inner == 0 && kind == FoldKind::Exclusive {
        return Ok(FoldPlan::Degenerate(Degenerate::Seed(outer.floor_ones())));
    }
    if outer.is_empty() {
        return Ok(FoldPlan::Degenerate(Degenerate::Empty(outer)));
    }
    if inner == 0 {
        return Err(ExecError::Precondition(format!(
            "inclusive row-wise fold over empty rows of {}",
            shape
        )));
    }
    Ok(FoldPlan::RowWise { outer, inner })
}
