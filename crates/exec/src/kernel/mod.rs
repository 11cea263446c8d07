//! Compiled kernels and the adapter that calls them one chunk at a time.

mod executable;
mod invoker;

pub use executable::{names, EntryFn, KernelExecutable, Payload};
pub use invoker::KernelInvoker;
