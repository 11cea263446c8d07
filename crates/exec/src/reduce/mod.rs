//! Fold strategies.
//!
//! A fold is planned once into a [`FoldPlan`] from the input shape, the fold
//! kind and the worker count, then executed by [`ReductionEngine`]:
//!
//! | input | plan |
//! |---|---|
//! | empty vector, inclusive | precondition error |
//! | empty vector, exclusive | seed broadcast to a scalar |
//! | vector, one worker | sequential pass |
//! | vector, several workers | two-phase: stripe partials, then combine on one worker |
//! | rows with empty outer shape | empty output |
//! | empty rows, exclusive | seed broadcast over the outer shape |
//! | rows | row-wise, parallel over outer indices |

mod engine;
mod plan;

pub use engine::ReductionEngine;
pub use plan::{plan_fold_all, plan_fold_rows, stripe_plan, Degenerate, FoldKind, FoldPlan};
