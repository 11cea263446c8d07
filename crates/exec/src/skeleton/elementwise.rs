use std::fmt;

use parskel_core::{Allocator, Array, Element, ExecResult, Range, Shape};
use tracing::debug;

use crate::kernel::{KernelExecutable, KernelInvoker, Payload};
use crate::scheduler::Finalizer;

use super::SkeletonDispatcher;

/// Operations that compute each output index independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementwiseOp {
    Map,
    Generate,
    Transform,
    Backpermute,
    Stencil1,
    Stencil2,
}

impl ElementwiseOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementwiseOp::Map => "elementwise/map",
            ElementwiseOp::Generate => "elementwise/generate",
            ElementwiseOp::Transform => "elementwise/transform",
            ElementwiseOp::Backpermute => "elementwise/backpermute",
            ElementwiseOp::Stencil1 => "elementwise/stencil1",
            ElementwiseOp::Stencil2 => "elementwise/stencil2",
        }
    }
}

impl fmt::Display for ElementwiseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<A: Allocator> SkeletonDispatcher<'_, A> {
    /// Map over an input of `shape`; the input travels in the environment.
    pub fn map<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        shape: &Shape,
    ) -> ExecResult<Array<T>> {
        self.elementwise(ElementwiseOp::Map, exe, env, shape, &[])
    }

    pub fn generate<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        shape: &Shape,
    ) -> ExecResult<Array<T>> {
        self.elementwise(ElementwiseOp::Generate, exe, env, shape, &[])
    }

    pub fn transform<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        shape: &Shape,
    ) -> ExecResult<Array<T>> {
        self.elementwise(ElementwiseOp::Transform, exe, env, shape, &[])
    }

    pub fn backpermute<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        shape: &Shape,
    ) -> ExecResult<Array<T>> {
        self.elementwise(ElementwiseOp::Backpermute, exe, env, shape, &[])
    }

    /// Stencil over one operand; the output has the operand's shape.
    pub fn stencil1<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        input: &Array<T>,
    ) -> ExecResult<Array<T>> {
        self.elementwise(ElementwiseOp::Stencil1, exe, env, input.shape(), &[input])
    }

    /// Stencil over two operands; the output is their per-dimension intersection.
    pub fn stencil2<T: Element, E: Sync>(
        &self,
        exe: &KernelExecutable<T, E>,
        env: &E,
        a: &Array<T>,
        b: &Array<T>,
    ) -> ExecResult<Array<T>> {
        let shape = a.shape().intersect(b.shape())?;
        self.elementwise(ElementwiseOp::Stencil2, exe, env, &shape, &[a, b])
    }

    /// One dispatch over `[0, size(shape))` through the default entry.
    pub fn elementwise<T: Element, E: Sync>(
        &self,
        op: ElementwiseOp,
        exe: &KernelExecutable<T, E>,
        env: &E,
        shape: &Shape,
        operands: &[&Array<T>],
    ) -> ExecResult<Array<T>> {
        let invoker = KernelInvoker::default_entry(exe, env).with_instrument(self.instrument());
        let mut out = self.allocator.allocate::<T>(shape)?;
        self.note_dispatch(op.as_str());
        debug!("{} over {} via {}", op, shape, invoker.entry_name());
        if out.is_empty() {
            return Ok(out);
        }

        let view = out.output_view();
        self.scheduler.run(
            self.ppt.large,
            Range::upto(view.len()),
            Finalizer::none(),
            |chunk, worker| {
                // SAFETY: scheduler chunks are disjoint.
                let out = unsafe { view.chunk(chunk) };
                invoker.invoke(chunk, worker, Payload::Elementwise { operands, out })
            },
        )?;
        Ok(out)
    }
}
