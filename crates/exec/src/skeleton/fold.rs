use parskel_core::{Allocator, Array, Element, ExecResult, Shape};
use tracing::debug;

use crate::kernel::KernelExecutable;
use crate::reduce::{plan_fold_all, plan_fold_rows, FoldKind, FoldPlan, ReductionEngine};

use super::SkeletonDispatcher;

impl<A: Allocator> SkeletonDispatcher<'_, A> {
    /// Fold a vector of `len` elements (held in the environment) to a scalar.
    ///
    /// An inclusive fold of an empty vector is a precondition error raised
    /// before any kernel runs.
    pub fn fold_all<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        len: usize,
        kind: FoldKind,
    ) -> ExecResult<Array<T>> {
        let plan = self.plan_fold_all(len, kind)?;
        self.run_fold(&plan, exe, env)
    }

    /// Fold the innermost dimension of an input of `shape` (held in the
    /// environment), producing an array of the outer shape.
    pub fn fold_rows<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        shape: &Shape,
        kind: FoldKind,
    ) -> ExecResult<Array<T>> {
        let plan = plan_fold_rows(shape, kind)?;
        self.run_fold(&plan, exe, env)
    }

    /// The strategy `fold_all` would use on this dispatcher's pool.
    pub fn plan_fold_all(&self, len: usize, kind: FoldKind) -> ExecResult<FoldPlan> {
        plan_fold_all(
            len,
            kind,
            self.scheduler.workers(),
            self.ppt.large.get(),
            self.stripes_per_worker,
        )
    }

    fn run_fold<T: Element, E: Sync>(
        &self,
        plan: &FoldPlan,
        exe: &KernelExecutable<T, E>,
        env: &E,
    ) -> ExecResult<Array<T>> {
        debug!("Fold dispatch: {} on {} workers", plan.label(), self.scheduler.workers());
        self.note_dispatch(plan.label());
        ReductionEngine::new(&self.scheduler, &self.allocator, self.ppt.small, self.instrument())
            .execute(plan, exe, env)
    }
}
