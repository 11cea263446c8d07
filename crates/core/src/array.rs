use std::marker::PhantomData;

use crate::error::{ExecError, ExecResult};
use crate::shape::{Range, Shape};

/// Element types the engine can move between buffers. The engine never looks
/// at element values; only kernels do.
pub trait Element: Copy + Default + Send + Sync + 'static {}

impl<T: Copy + Default + Send + Sync + 'static> Element for T {}

/// Shape plus an owned contiguous row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Array<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T> Array<T> {
    pub fn from_vec(shape: Shape, data: Vec<T>) -> ExecResult<Self> {
        if shape.size() != data.len() {
            return Err(ExecError::ShapeMismatch {
                expected: shape,
                actual: Shape::from([data.len()]),
            });
        }
        Ok(Self { shape, data })
    }

    /// A rank-0 array holding one value.
    pub fn scalar(value: T) -> Self {
        Self {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Shared write view for a parallel dispatch into this array.
    pub fn output_view(&mut self) -> OutputView<'_, T> {
        OutputView::new(&mut self.data)
    }
}

/// Destination buffer shared by every worker of one dispatch.
///
/// Workers carve out `&mut` sub-slices for the chunk they are running. The
/// view itself does no bookkeeping: disjointness of live slices is the
/// scheduler's partition guarantee.
pub struct OutputView<'a, T> {
    ptr: *mut T,
    len: usize,
    _buffer: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for OutputView<'_, T> {}
unsafe impl<T: Send> Sync for OutputView<'_, T> {}

impl<'a, T> OutputView<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _buffer: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mutable slice over `range` of the destination.
    ///
    /// # Panics
    ///
    /// Panics if `range` is inverted or reaches past the buffer.
    ///
    /// # Safety
    ///
    /// No other slice obtained from this view that overlaps `range` may be
    /// alive at the same time.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn chunk(&self, range: Range) -> &mut [T] {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "chunk {} outside destination of {} elements",
            range,
            self.len
        );
        std::slice::from_raw_parts_mut(self.ptr.add(range.start), range.len())
    }
}

/// Source of fresh result buffers.
pub trait Allocator: Send + Sync {
    /// A buffer for `shape`. Contents are unspecified to kernels.
    fn allocate<T: Element>(&self, shape: &Shape) -> ExecResult<Array<T>>;
}

/// Allocates from the global heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn allocate<T: Element>(&self, shape: &Shape) -> ExecResult<Array<T>> {
        let size = shape.size();
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|e| {
            ExecError::Allocation(format!("{} elements for shape {}: {}", size, shape, e))
        })?;
        data.resize(size, T::default());
        Ok(Array {
            shape: shape.clone(),
            data,
        })
    }
}
