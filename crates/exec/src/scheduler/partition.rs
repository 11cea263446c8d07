use parskel_core::{Ppt, Range};

/// Consecutive, equal-length chunks covering a range; only the final chunk
/// may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    range: Range,
    chunk_len: usize,
    count: usize,
}

impl Partition {
    /// Cut `range` for `workers` workers.
    ///
    /// A single worker gets the whole range as one chunk. Otherwise the range
    /// is cut into about `workers * splits_per_worker` chunks, never shorter
    /// than `ppt`.
    pub fn new(range: Range, ppt: Ppt, workers: usize, splits_per_worker: usize) -> Self {
        let len = range.len();
        if len == 0 {
            return Self {
                range,
                chunk_len: ppt.get(),
                count: 0,
            };
        }
        let chunk_len = if workers <= 1 {
            len
        } else {
            let target = workers.saturating_mul(splits_per_worker.max(1));
            len.div_ceil(target).max(ppt.get())
        };
        Self {
            range,
            chunk_len,
            count: len.div_ceil(chunk_len),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Chunk `k`, clipped to the end of the range.
    pub fn chunk(&self, k: usize) -> Range {
        debug_assert!(k < self.count);
        let start = self.range.start + k * self.chunk_len;
        Range::new(start, start + self.chunk_len.min(self.range.end - start))
    }

    pub fn chunks(&self) -> impl Iterator<Item = Range> + '_ {
        (0..self.count).map(move |k| self.chunk(k))
    }
}
