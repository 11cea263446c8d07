//! Process-wide worker pool.
//!
//! One fixed set of rayon worker threads is built at startup and shared by
//! every dispatch. Dispatches never spawn threads of their own.

use std::sync::OnceLock;

use parskel_core::config::load_dotenv;
use parskel_core::{ExecConfig, ExecError, ExecResult, WorkerId};
use tracing::info;

static GLOBAL: OnceLock<WorkPool> = OnceLock::new();

/// Fixed pool of worker threads.
#[derive(Debug)]
pub struct WorkPool {
    inner: rayon::ThreadPool,
    size: usize,
}

impl WorkPool {
    /// Build a pool of exactly `workers` threads.
    pub fn new(workers: usize) -> ExecResult<Self> {
        if workers == 0 {
            return Err(ExecError::Pool("pool needs at least one worker".into()));
        }
        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("parskel-worker-{}", i))
            .build()
            .map_err(|e| ExecError::Pool(e.to_string()))?;
        info!("Worker pool started with {} workers", workers);
        Ok(Self {
            inner,
            size: workers,
        })
    }

    pub fn from_config(config: &ExecConfig) -> ExecResult<Self> {
        Self::new(config.resolved_workers())
    }

    /// The shared pool, built from the environment on first use.
    pub fn global() -> ExecResult<&'static WorkPool> {
        if let Some(pool) = GLOBAL.get() {
            return Ok(pool);
        }
        load_dotenv();
        let config = ExecConfig::from_env();
        let pool = WorkPool::from_config(&config)?;
        // A racing initialiser may win; its pool is kept and ours dropped.
        Ok(GLOBAL.get_or_init(|| pool))
    }

    /// Build the shared pool from an explicit config. Fails if it already exists.
    pub fn init_global(config: &ExecConfig) -> ExecResult<&'static WorkPool> {
        config.validate()?;
        let pool = WorkPool::from_config(config)?;
        GLOBAL
            .set(pool)
            .map_err(|_| ExecError::Pool("global pool already initialised".into()))?;
        GLOBAL
            .get()
            .ok_or_else(|| ExecError::Pool("global pool missing after init".into()))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `work` once on each of the first `width` workers and block until
    /// all of them return. `width` is clamped to `1..=size`; a single-worker
    /// run reports itself as slot 0 whichever thread picks it up.
    pub(crate) fn run_on_workers<F>(&self, width: usize, work: F)
    where
        F: Fn(WorkerId) + Sync,
    {
        let width = width.clamp(1, self.size);
        if width == 1 {
            let work = &work;
            self.inner.install(move || work(WorkerId(0)));
            return;
        }
        self.inner.broadcast(|ctx| {
            if ctx.index() < width {
                work(WorkerId(ctx.index()));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn rejects_empty_pool() {
        assert!(matches!(WorkPool::new(0), Err(ExecError::Pool(_))));
    }

    #[test]
    fn size_matches_request() {
        assert_eq!(WorkPool::new(3).unwrap().size(), 3);
    }

    #[test]
    fn run_on_workers_visits_each_worker_once() {
        let pool = WorkPool::new(4).unwrap();
        let seen = Mutex::new(Vec::new());
        pool.run_on_workers(4, |w| seen.lock().unwrap().push(w.0));
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn run_on_workers_respects_width() {
        let pool = WorkPool::new(4).unwrap();
        let seen = Mutex::new(HashSet::new());
        pool.run_on_workers(2, |w| {
            seen.lock().unwrap().insert(w.0);
        });
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|&w| w < 2));
    }

    #[test]
    fn single_width_runs_on_a_pool_thread() {
        let pool = WorkPool::new(2).unwrap();
        let name = Mutex::new(None);
        pool.run_on_workers(1, |_| {
            *name.lock().unwrap() = std::thread::current().name().map(str::to_string);
        });
        let name = name.into_inner().unwrap().unwrap();
        assert!(name.starts_with("parskel-worker-"), "ran on {}", name);
    }
}
