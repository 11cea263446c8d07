pub mod array;
pub mod config;
pub mod error;
pub mod shape;

pub use array::{Allocator, Array, Element, HeapAllocator, OutputView};
pub use config::{ExecConfig, PptConfig, DEFAULT_SPLITS_PER_WORKER, DEFAULT_STRIPES_PER_WORKER};
pub use error::*;
pub use shape::{Ppt, Range, Shape, WorkerId};
