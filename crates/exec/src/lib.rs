pub mod kernel;
pub mod metrics;
pub mod pool;
pub mod reduce;
pub mod scheduler;
pub mod skeleton;

#[cfg(test)]
mod test_kernels;

pub use kernel::{names, KernelExecutable, KernelInvoker, Payload};
pub use metrics::{CallRecord, DispatchMetrics, Instrument, InstrumentError, MetricsRecorder};
pub use pool::WorkPool;
pub use reduce::{FoldKind, FoldPlan, ReductionEngine};
pub use scheduler::{Finalizer, Partition, RangeScheduler};
pub use skeleton::{ElementwiseOp, SkeletonDispatcher};
