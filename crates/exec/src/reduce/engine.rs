use parskel_core::{Allocator, Array, Element, ExecResult, Ppt, Range, Shape};
use tracing::debug;

use crate::kernel::{names, KernelExecutable, KernelInvoker, Payload};
use crate::metrics::Instrument;
use crate::scheduler::{Finalizer, RangeScheduler};

use super::plan::{Degenerate, FoldPlan};

/// Executes a [`FoldPlan`] against a kernel executable.
pub struct ReductionEngine<'a, 'p, A> {
    scheduler: &'a RangeScheduler<'p>,
    allocator: &'a A,
    small_ppt: Ppt,
    instrument: Option<&'a dyn Instrument>,
}

impl<'a, 'p, A: Allocator> ReductionEngine<'a, 'p, A> {
    pub fn new(
        scheduler: &'a RangeScheduler<'p>,
        allocator: &'a A,
        small_ppt: Ppt,
        instrument: Option<&'a dyn Instrument>,
    ) -> Self {
        Self {
            scheduler,
            allocator,
            small_ppt,
            instrument,
        }
    }

    /// Run `plan`, returning the freshly allocated result.
    pub fn execute<T: Element, E: Sync>(
        &self,
        plan: &FoldPlan,
        exe: &KernelExecutable<T, E>,
        env: &E,
    ) -> ExecResult<Array<T>> {
        debug!("Fold plan: {}", plan);
        match plan {
            FoldPlan::Degenerate(Degenerate::Empty(shape)) => self.allocator.allocate(shape),
            FoldPlan::Degenerate(Degenerate::Seed(shape)) => self.seed(shape, exe, env),
            FoldPlan::Sequential { len } => self.sequential(*len, exe, env),
            FoldPlan::TwoPhaseParallel { len, stripe, steps } => {
                self.two_phase(*len, *stripe, *steps, exe, env)
            }
            FoldPlan::RowWise { outer, inner } => self.row_wise(outer, *inner, exe, env),
        }
    }

    fn bind<'k, T, E: Sync>(
        &'k self,
        exe: &'k KernelExecutable<T, E>,
        name: &'k str,
        env: &'k E,
    ) -> ExecResult<KernelInvoker<'k, T, E>> {
        Ok(KernelInvoker::new(exe, name, env)?.with_instrument(self.instrument))
    }

    /// Broadcast the seed over `shape` through the generate entry.
    fn seed<T: Element, E: Sync>(
        &self,
        shape: &Shape,
        exe: &KernelExecutable<T, E>,
        env: &E,
    ) -> ExecResult<Array<T>> {
        let generate = self.bind(exe, names::GENERATE, env)?;
        let mut out = self.allocator.allocate::<T>(shape)?;
        let view = out.output_view();
        self.scheduler.run(
            self.small_ppt,
            Range::upto(view.len()),
            Finalizer::none(),
            |chunk, worker| {
                // SAFETY: scheduler chunks are disjoint.
                let out = unsafe { view.chunk(chunk) };
                generate.invoke(chunk, worker, Payload::Elementwise { operands: &[], out })
            },
        )?;
        Ok(out)
    }

    fn sequential<T: Element, E: Sync>(
        &self,
        len: usize,
        exe: &KernelExecutable<T, E>,
        env: &E,
    ) -> ExecResult<Array<T>> {
        let fold = self.bind(exe, names::FOLD_ALL_SEQUENTIAL, env)?;
        let mut out = self.allocator.allocate::<T>(&Shape::scalar())?;
        let view = out.output_view();
        self.scheduler.restricted(1).run(
            Ppt::ONE,
            Range::upto(len),
            Finalizer::none(),
            |chunk, worker| {
                // SAFETY: a single-worker run is a single chunk.
                let out = unsafe { view.chunk(Range::upto(1)) };
                fold.invoke(chunk, worker, Payload::FoldAll { out })
            },
        )?;
        Ok(out)
    }

    fn two_phase<T: Element, E: Sync>(
        &self,
        len: usize,
        stripe: usize,
        steps: usize,
        exe: &KernelExecutable<T, E>,
        env: &E,
    ) -> ExecResult<Array<T>> {
        let partial = self.bind(exe, names::FOLD_ALL_PARTIAL, env)?;
        let combine = self.bind(exe, names::FOLD_ALL_COMBINE, env)?;
        debug!(
            "Two-phase fold of {} over {} workers: {} stripes of {}",
            len,
            self.scheduler.workers(),
            steps,
            stripe
        );

        let mut partials = self.allocator.allocate::<T>(&Shape::from([steps]))?;
        {
            let view = partials.output_view();
            self.scheduler.run(
                Ppt::ONE,
                Range::upto(steps),
                Finalizer::none(),
                |chunk, worker| {
                    // SAFETY: scheduler chunks are disjoint.
                    let partials = unsafe { view.chunk(chunk) };
                    partial.invoke(chunk, worker, Payload::FoldPartial { stripe, partials })
                },
            )?;
        }

        let partials = partials.as_slice();
        let mut out = self.allocator.allocate::<T>(&Shape::scalar())?;
        let view = out.output_view();
        self.scheduler.restricted(1).run(
            Ppt::ONE,
            Range::upto(steps),
            Finalizer::none(),
            |chunk, worker| {
                // SAFETY: a single-worker run is a single chunk.
                let out = unsafe { view.chunk(Range::upto(1)) };
                combine.invoke(
                    chunk,
                    worker,
                    Payload::FoldCombine {
                        partials: &partials[chunk.start..chunk.end],
                        out,
                    },
                )
            },
        )?;
        Ok(out)
    }

    fn row_wise<T: Element, E: Sync>(
        &self,
        outer: &Shape,
        inner: usize,
        exe: &KernelExecutable<T, E>,
        env: &E,
    ) -> ExecResult<Array<T>> {
        let fold = self.bind(exe, names::FOLD_ROWS, env)?;
        let mut out = self.allocator.allocate::<T>(outer)?;
        let view = out.output_view();
        self.scheduler.run(
            self.small_ppt,
            Range::upto(view.len()),
            Finalizer::none(),
            |chunk, worker| {
                // SAFETY: scheduler chunks are disjoint.
                let out = unsafe { view.chunk(chunk) };
                fold.invoke(chunk, worker, Payload::FoldRows { inner, out })
            },
        )?;
        Ok(out)
    }
}
