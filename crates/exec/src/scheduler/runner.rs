use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use parskel_core::{ExecError, ExecResult, Ppt, Range, WorkerId, DEFAULT_SPLITS_PER_WORKER};
use tracing::{debug, trace};

use crate::pool::WorkPool;

use super::partition::Partition;
use super::queue::{seed_block, ChunkQueue};

/// Action run once after every chunk of a dispatch has completed.
#[derive(Default)]
pub struct Finalizer<'a>(Option<Box<dyn FnOnce() + 'a>>);

impl<'a> Finalizer<'a> {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(action: impl FnOnce() + 'a) -> Self {
        Self(Some(Box::new(action)))
    }

    fn run(self) {
        if let Some(action) = self.0 {
            action();
        }
    }
}

/// Work-stealing executor for integer ranges over a [`WorkPool`].
#[derive(Clone, Copy)]
pub struct RangeScheduler<'p> {
    pool: &'p WorkPool,
    width: usize,
    splits_per_worker: usize,
}

impl<'p> RangeScheduler<'p> {
    /// Scheduler using every worker of `pool`.
    pub fn new(pool: &'p WorkPool) -> Self {
        Self {
            pool,
            width: pool.size(),
            splits_per_worker: DEFAULT_SPLITS_PER_WORKER,
        }
    }

    pub fn with_splits_per_worker(mut self, splits: usize) -> Self {
        self.splits_per_worker = splits.max(1);
        self
    }

    /// A view of the same pool limited to `width` workers (at least one).
    pub fn restricted(&self, width: usize) -> Self {
        Self {
            width: width.clamp(1, self.pool.size()),
            ..*self
        }
    }

    pub fn workers(&self) -> usize {
        self.width
    }

    pub fn splits_per_worker(&self) -> usize {
        self.splits_per_worker
    }

    /// Run `per_chunk` once for every chunk of `range`, then `finalizer`.
    ///
    /// Blocks until every chunk and the finalizer have completed. The
    /// finalizer runs on the calling thread exactly once, including for an
    /// empty range and after a failed chunk. After the first failure the
    /// remaining chunks are drained without calling `per_chunk`; the first
    /// error is returned.
    pub fn run<F>(
        &self,
        ppt: Ppt,
        range: Range,
        finalizer: Finalizer<'_>,
        per_chunk: F,
    ) -> ExecResult<()>
    where
        F: Fn(Range, WorkerId) -> ExecResult<()> + Sync,
    {
        if range.is_empty() {
            trace!("Empty range {}, skipping to finalizer", range);
            finalizer.run();
            return Ok(());
        }

        let partition = Partition::new(range, ppt, self.width, self.splits_per_worker);
        let workers = self.width.min(partition.len());
        debug!(
            "Dispatching {} as {} chunks of {} over {} workers",
            range,
            partition.len(),
            partition.chunk_len(),
            workers
        );

        let queues: Vec<ChunkQueue> = (0..workers)
            .map(|w| {
                let (first, last) = seed_block(partition.len(), workers, w);
                ChunkQueue::new(first, last)
            })
            .collect();
        let failed = AtomicBool::new(false);
        let failure: Mutex<Option<ExecError>> = Mutex::new(None);

        let execute = |k: usize, worker: WorkerId| {
            if failed.load(Ordering::Acquire) {
                return;
            }
            let chunk = partition.chunk(k);
            trace!("{} running chunk {}", worker, chunk);
            if let Err(e) = per_chunk(chunk, worker) {
                failed.store(true, Ordering::Release);
                let mut slot = failure.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(e);
                }
            }
        };

        self.pool.run_on_workers(workers, |worker| {
            let own = &queues[worker.0];
            while let Some(k) = own.pop_front() {
                execute(k, worker);
            }
            for offset in 1..workers {
                let victim_id = (worker.0 + offset) % workers;
                let victim = &queues[victim_id];
                while let Some(k) = victim.steal_back() {
                    trace!("{} stole chunk {} from worker-{}", worker, k, victim_id);
                    execute(k, worker);
                }
            }
        });

        finalizer.run();

        match failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
