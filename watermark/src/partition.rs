//! Static partitioning of the catalog among farm workers.
//!
//! With `N` images and `P` workers every worker receives one contiguous chunk of
//! exactly `N / P` images, in catalog order. The `N % P` images past the last chunk
//! are left to the [`RemainderPool`], which hands them out one at a time to whichever
//! worker finishes its chunk first.

use std::ops::Range;

use crate::remainder::RemainderPool;

/// Half-open range `[start, end)` of catalog indices assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The full static split of a catalog, fixed before any worker starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    total: usize,
    workload: usize,
    chunks: Vec<Chunk>,
}

impl Partition {
    /// Splits `total` images into `workers` equal chunks.
    ///
    /// When `workers > total` every chunk is empty and all images go to the remainder.
    ///
    /// # Panics
    ///
    /// Panics if `workers` is 0.
    pub fn new(total: usize, workers: usize) -> Self {
        assert!(workers > 0, "worker count must be > 0");

        let workload = total / workers;
        let chunks = (0..workers)
            .map(|i| Chunk {
                start: i * workload,
                end: (i + 1) * workload,
            })
            .collect();

        Self {
            total,
            workload,
            chunks,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Size of every chunk, `floor(total / workers)`.
    pub fn workload(&self) -> usize {
        self.workload
    }

    pub fn workers(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of images covered by static chunks.
    pub fn static_len(&self) -> usize {
        self.workload * self.chunks.len()
    }

    /// Number of trailing images left for dynamic distribution.
    pub fn remainder(&self) -> usize {
        self.total - self.static_len()
    }

    pub fn remainder_pool(&self) -> RemainderPool {
        RemainderPool::new(self.total, self.remainder())
    }
}

impl IntoIterator for Partition {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    /// Hands out each chunk exactly once, in catalog order.
    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}
