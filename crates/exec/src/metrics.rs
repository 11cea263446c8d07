//! Optional per-call instrumentation.
//!
//! An [`Instrument`] sees every entry-point call after it returns. It cannot
//! change scheduling or results, and its errors are logged and dropped.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parskel_core::{Range, WorkerId};
use serde::Serialize;

/// One completed entry-point call.
#[derive(Debug, Clone, Copy)]
pub struct CallRecord<'a> {
    pub entry: &'a str,
    pub range: Range,
    pub worker: WorkerId,
    pub elapsed: Duration,
    pub succeeded: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("{0}")]
    Other(String),
}

/// Observer of kernel calls and dispatches.
pub trait Instrument: Send + Sync {
    fn on_call(&self, call: &CallRecord<'_>) -> Result<(), InstrumentError>;

    /// Called once per dispatch with the chosen strategy label.
    fn on_dispatch(&self, _strategy: &str) -> Result<(), InstrumentError> {
        Ok(())
    }
}

/// Counters collected by [`MetricsRecorder`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchMetrics {
    /// Entry-point calls by entry name.
    pub calls_by_entry: HashMap<String, u64>,
    /// Failed entry-point calls.
    pub failed_calls: u64,
    /// Average call duration by entry name.
    pub avg_call_duration: HashMap<String, Duration>,
    /// Last call time by entry name.
    pub last_call: HashMap<String, DateTime<Utc>>,
    /// Chunks executed per worker slot.
    pub chunks_by_worker: HashMap<usize, u64>,
    /// Total indices handed to entry points.
    pub indices_processed: u64,
    /// Dispatches by strategy label.
    pub dispatches_by_strategy: HashMap<String, u64>,
}

impl DispatchMetrics {
    /// Record one entry-point call.
    pub fn record_call(&mut self, call: &CallRecord<'_>) {
        *self.calls_by_entry.entry(call.entry.to_string()).or_default() += 1;
        *self.chunks_by_worker.entry(call.worker.0).or_default() += 1;
        self.indices_processed += call.range.len() as u64;
        if !call.succeeded {
            self.failed_calls += 1;
        }
        self.last_call.insert(call.entry.to_string(), Utc::now());

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let count = self.calls_by_entry[call.entry];
        let new_avg = match self.avg_call_duration.get(call.entry) {
            Some(prev) if count > 1 => {
                let prev_nanos = prev.as_nanos() as f64;
                let cur_nanos = call.elapsed.as_nanos() as f64;
                let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
                Duration::from_nanos(avg_nanos as u64)
            }
            _ => call.elapsed,
        };
        self.avg_call_duration.insert(call.entry.to_string(), new_avg);
    }

    pub fn record_dispatch(&mut self, strategy: &str) {
        *self
            .dispatches_by_strategy
            .entry(strategy.to_string())
            .or_default() += 1;
    }

    pub fn total_calls(&self) -> u64 {
        self.calls_by_entry.values().sum()
    }
}

/// Thread-safe [`Instrument`] that accumulates [`DispatchMetrics`].
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    metrics: Arc<RwLock<DispatchMetrics>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of the current metrics.
    pub fn snapshot(&self) -> DispatchMetrics {
        match self.metrics.read() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Get an Arc to the metrics (for external reads without cloning).
    pub fn handle(&self) -> Arc<RwLock<DispatchMetrics>> {
        Arc::clone(&self.metrics)
    }
}

impl Instrument for MetricsRecorder {
    fn on_call(&self, call: &CallRecord<'_>) -> Result<(), InstrumentError> {
        let mut m = self
            .metrics
            .write()
            .map_err(|e| InstrumentError::LockPoisoned(e.to_string()))?;
        m.record_call(call);
        Ok(())
    }

    fn on_dispatch(&self, strategy: &str) -> Result<(), InstrumentError> {
        let mut m = self
            .metrics
            .write()
            .map_err(|e| InstrumentError::LockPoisoned(e.to_string()))?;
        m.record_dispatch(strategy);
        Ok(())
    }
}
