//! Work-stealing range scheduler.
//!
//! A dispatch range is cut into consecutive chunks no shorter than the
//! partition threshold, dealt into one queue per worker, and drained by the
//! pool: each worker empties its own queue front to back, then steals from
//! the back of the others. The caller blocks until every chunk and the
//! dispatch finalizer have run.
//!
//! Split into focused submodules:
//! - `partition`: chunk boundaries for a range
//! - `queue`: lock-free per-worker chunk queues
//! - `runner`: the blocking `RangeScheduler::run` driver and `Finalizer`

mod partition;
mod queue;
mod runner;

pub use partition::Partition;
pub use runner::{Finalizer, RangeScheduler};
