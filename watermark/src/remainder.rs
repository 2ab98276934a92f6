use parking_lot::Mutex;

/// Shared pool of the catalog's trailing images that no static chunk covers.
///
/// Holds a single counter `R` of unclaimed images. Each [`claim`](Self::claim) turns
/// the current `R` into the index `total - R` and decrements it inside one critical
/// section, so every index in `[total - R0, total)` goes to exactly one caller, in
/// ascending order. The lock is never held while an image is processed.
#[derive(Debug)]
pub struct RemainderPool {
    total: usize,
    remaining: Mutex<usize>,
}

impl RemainderPool {
    /// # Panics
    ///
    /// Panics if `remaining > total`.
    pub fn new(total: usize, remaining: usize) -> Self {
        assert!(
            remaining <= total,
            "remainder {remaining} exceeds catalog size {total}"
        );
        Self {
            total,
            remaining: Mutex::new(remaining),
        }
    }

    /// Takes the next unclaimed index, or `None` once the pool is drained.
    pub fn claim(&self) -> Option<usize> {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return None;
        }
        let index = self.total - *remaining;
        *remaining -= 1;
        Some(index)
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }
}
