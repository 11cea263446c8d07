//! Skeleton dispatch: one call per array operation.
//!
//! The dispatcher classifies each operation, allocates its result, and drives
//! the range scheduler with the kernel entry point that operation needs:
//! - `elementwise`: map, generate, transform, backpermute and stencils, one
//!   dispatch over the output with the large partition threshold
//! - `fold`: full and row-wise folds, planned and run by the reduction engine

mod elementwise;
mod fold;

use std::sync::Arc;

use parskel_core::{Allocator, ExecConfig, HeapAllocator, PptConfig, DEFAULT_STRIPES_PER_WORKER};
use tracing::warn;

use crate::metrics::Instrument;
use crate::pool::WorkPool;
use crate::scheduler::RangeScheduler;

pub use elementwise::ElementwiseOp;

/// Entry point from the array runtime into the multicore engine.
pub struct SkeletonDispatcher<'p, A = HeapAllocator> {
    scheduler: RangeScheduler<'p>,
    ppt: PptConfig,
    stripes_per_worker: usize,
    allocator: A,
    instrument: Option<Arc<dyn Instrument>>,
}

impl<'p> SkeletonDispatcher<'p, HeapAllocator> {
    pub fn new(pool: &'p WorkPool, ppt: PptConfig) -> Self {
        Self {
            scheduler: RangeScheduler::new(pool),
            ppt,
            stripes_per_worker: DEFAULT_STRIPES_PER_WORKER,
            allocator: HeapAllocator,
            instrument: None,
        }
    }

    /// Dispatcher with thresholds and splitting factors from `config`.
    pub fn from_config(pool: &'p WorkPool, config: &ExecConfig) -> Self {
        let mut dispatcher = Self::new(pool, config.ppt())
            .with_stripes_per_worker(config.stripes_per_worker);
        dispatcher.scheduler = dispatcher
            .scheduler
            .with_splits_per_worker(config.splits_per_worker);
        dispatcher
    }
}

impl<'p, A: Allocator> SkeletonDispatcher<'p, A> {
    pub fn with_allocator<B: Allocator>(self, allocator: B) -> SkeletonDispatcher<'p, B> {
        SkeletonDispatcher {
            scheduler: self.scheduler,
            ppt: self.ppt,
            stripes_per_worker: self.stripes_per_worker,
            allocator,
            instrument: self.instrument,
        }
    }

    pub fn with_instrument(mut self, instrument: Arc<dyn Instrument>) -> Self {
        self.instrument = Some(instrument);
        self
    }

    pub fn with_stripes_per_worker(mut self, stripes: usize) -> Self {
        self.stripes_per_worker = stripes.max(1);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.scheduler.workers()
    }

    pub fn ppt(&self) -> PptConfig {
        self.ppt
    }

    pub fn stripes_per_worker(&self) -> usize {
        self.stripes_per_worker
    }

    fn instrument(&self) -> Option<&dyn Instrument> {
        self.instrument.as_deref()
    }

    fn note_dispatch(&self, strategy: &str) {
        if let Some(instrument) = self.instrument() {
            if let Err(e) = instrument.on_dispatch(strategy) {
                warn!("Instrumentation failed for dispatch {}: {}", strategy, e);
            }
        }
    }
}
