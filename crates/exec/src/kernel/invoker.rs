use std::time::Instant;

use parskel_core::{ExecResult, Range, WorkerId};
use tracing::warn;

use crate::metrics::{CallRecord, Instrument};

use super::executable::{EntryFn, KernelExecutable, Payload};

/// One entry point bound to its environment for the length of a dispatch.
///
/// Each [`invoke`](Self::invoke) is exactly one native call covering exactly
/// the chunk it is given; the entry performs no further partitioning.
pub struct KernelInvoker<'k, T, E> {
    name: &'k str,
    entry: &'k EntryFn<T, E>,
    env: &'k E,
    instrument: Option<&'k dyn Instrument>,
}

impl<'k, T, E: Sync> KernelInvoker<'k, T, E> {
    /// Bind entry `name`. Fails before any call if the entry does not exist.
    pub fn new(exe: &'k KernelExecutable<T, E>, name: &'k str, env: &'k E) -> ExecResult<Self> {
        Ok(Self {
            name,
            entry: exe.entry(name)?,
            env,
            instrument: None,
        })
    }

    /// Bind the executable's default entry.
    pub fn default_entry(exe: &'k KernelExecutable<T, E>, env: &'k E) -> Self {
        Self {
            name: exe.default_name(),
            entry: exe.default_entry(),
            env,
            instrument: None,
        }
    }

    pub fn with_instrument(mut self, instrument: Option<&'k dyn Instrument>) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn entry_name(&self) -> &str {
        self.name
    }

    /// Call the entry for `chunk` on `worker`.
    pub fn invoke(&self, chunk: Range, worker: WorkerId, payload: Payload<'_, T>) -> ExecResult<()> {
        let Some(instrument) = self.instrument else {
            return (self.entry)(chunk.start, chunk.end, payload, self.env).map_err(Into::into);
        };

        let started = Instant::now();
        let result = (self.entry)(chunk.start, chunk.end, payload, self.env);
        let record = CallRecord {
            entry: self.name,
            range: chunk,
            worker,
            elapsed: started.elapsed(),
            succeeded: result.is_ok(),
        };
        if let Err(e) = instrument.on_call(&record) {
            warn!("Instrumentation failed for entry {}: {}", self.name, e);
        }
        result.map_err(Into::into)
    }
}
