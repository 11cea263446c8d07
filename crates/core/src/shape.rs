use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

/// Ordered extents of an array, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(extents: impl Into<Vec<usize>>) -> Self {
        Self(extents.into())
    }

    /// The rank-0 shape of a scalar.
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn extents(&self) -> &[usize] {
        &self.0
    }

    /// Number of elements: the product of all extents (1 for a scalar).
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Per-dimension minimum of two shapes of equal rank.
    pub fn intersect(&self, other: &Shape) -> ExecResult<Shape> {
        if self.rank() != other.rank() {
            return Err(ExecError::RankMismatch(self.rank(), other.rank()));
        }
        Ok(Shape(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (*a).min(*b))
                .collect(),
        ))
    }

    /// Every extent raised to at least 1.
    pub fn floor_ones(&self) -> Shape {
        Shape(self.0.iter().map(|&e| e.max(1)).collect())
    }

    /// Split off the innermost dimension: `(outer shape, inner extent)`.
    /// Returns `None` for a scalar.
    pub fn split_innermost(&self) -> Option<(Shape, usize)> {
        let (inner, outer) = self.0.split_last()?;
        Some((Shape(outer.to_vec()), *inner))
    }
}

impl From<Vec<usize>> for Shape {
    fn from(extents: Vec<usize>) -> Self {
        Self(extents)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(extents: [usize; N]) -> Self {
        Self(extents.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Half-open interval `[start, end)` over a flattened index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// `[0, len)`.
    pub fn upto(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Parallel partition threshold: the smallest chunk the scheduler may cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ppt(NonZeroUsize);

impl Ppt {
    /// A threshold of one index per chunk.
    pub const ONE: Ppt = Ppt(NonZeroUsize::MIN);

    pub fn new(value: usize) -> ExecResult<Self> {
        NonZeroUsize::new(value)
            .map(Ppt)
            .ok_or_else(|| ExecError::Precondition("partition threshold must be >= 1".into()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Slot of a worker in the pool, `0..N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_product_of_extents() {
        assert_eq!(Shape::from([2, 3, 4]).size(), 24);
        assert_eq!(Shape::from([5, 0, 7]).size(), 0);
        assert_eq!(Shape::scalar().size(), 1);
    }

    #[test]
    fn intersect_takes_minimum_extent() {
        let a = Shape::from([4, 10]);
        let b = Shape::from([6, 3]);
        assert_eq!(a.intersect(&b).unwrap(), Shape::from([4, 3]));
    }

    #[test]
    fn intersect_rejects_rank_mismatch() {
        let err = Shape::from([4]).intersect(&Shape::from([4, 4])).unwrap_err();
        assert!(matches!(err, ExecError::RankMismatch(1, 2)));
    }

    #[test]
    fn floor_ones_raises_zero_extents() {
        assert_eq!(Shape::from([0, 3, 0]).floor_ones(), Shape::from([1, 3, 1]));
    }

    #[test]
    fn split_innermost() {
        let (outer, inner) = Shape::from([2, 3]).split_innermost().unwrap();
        assert_eq!(outer, Shape::from([2]));
        assert_eq!(inner, 3);
        assert!(Shape::scalar().split_innermost().is_none());
    }

    #[test]
    fn range_empty_when_end_not_after_start() {
        assert!(Range::new(5, 5).is_empty());
        assert!(Range::new(7, 3).is_empty());
        assert_eq!(Range::new(7, 3).len(), 0);
        assert_eq!(Range::upto(9).len(), 9);
    }

    #[test]
    fn ppt_rejects_zero() {
        assert!(Ppt::new(0).is_err());
        assert_eq!(Ppt::new(64).unwrap().get(), 64);
        assert_eq!(Ppt::ONE.get(), 1);
    }
}
