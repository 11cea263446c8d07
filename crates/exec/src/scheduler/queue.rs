//! Per-worker chunk queues.
//!
//! Each worker owns a contiguous block of chunk indices `[front, back)`. The
//! owner claims from the front; idle workers steal from the back. A shared
//! `remaining` counter is decremented before any index is taken, so owners and
//! thieves can never claim more indices than the block holds.

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

#[repr(C, align(64))]
pub(crate) struct ChunkQueue {
    front: AtomicUsize,
    back: AtomicUsize,
    remaining: AtomicIsize,
}

const _: () = assert!(std::mem::align_of::<ChunkQueue>() == 64);

impl ChunkQueue {
    pub(crate) fn new(first: usize, last: usize) -> Self {
        let len = last.saturating_sub(first);
        Self {
            front: AtomicUsize::new(first),
            back: AtomicUsize::new(first + len),
            remaining: AtomicIsize::new(len as isize),
        }
    }

    /// Reserve one index; `false` once the block is exhausted.
    #[inline]
    fn reserve(&self) -> bool {
        if self.remaining.fetch_sub(1, Ordering::Acquire) > 0 {
            true
        } else {
            self.remaining.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Owner side: next index from the front.
    #[inline]
    pub(crate) fn pop_front(&self) -> Option<usize> {
        self.reserve()
            .then(|| self.front.fetch_add(1, Ordering::Relaxed))
    }

    /// Thief side: last index from the back.
    #[inline]
    pub(crate) fn steal_back(&self) -> Option<usize> {
        self.reserve()
            .then(|| self.back.fetch_sub(1, Ordering::Relaxed) - 1)
    }

    #[cfg(test)]
    pub(crate) fn has_work(&self) -> bool {
        self.remaining.load(Ordering::Relaxed) > 0
    }
}

/// Deal `count` chunk indices into `workers` contiguous blocks; block `w`.
pub(crate) fn seed_block(count: usize, workers: usize, w: usize) -> (usize, usize) {
    (w * count / workers, (w + 1) * count / workers)
}
