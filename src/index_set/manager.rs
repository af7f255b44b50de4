//! Per-codimension index allocator.
//!
//! Hands out non-negative integers, takes them back, and recycles freed
//! values before growing the high watermark. Reuse order follows the
//! configured [`RecyclePolicy`]: `Lifo` returns the most recently freed
//! index first, `Fifo` the oldest.
//!
//! The watermark never shrinks. Once an index in the middle of the range is
//! freed, the held indices have holes until it is handed out again; the
//! extent `0..watermark` is what callers size per-entity arrays with.

use crate::debug_invariants::DebugInvariants;
use crate::index_set::RecyclePolicy;
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::Codim;
use std::collections::VecDeque;

/// Free-list allocator for one codimension.
#[derive(Clone, Debug)]
pub struct IndexManager {
    codim: Codim,
    policy: RecyclePolicy,
    free: VecDeque<usize>,
    /// `in_free[i]` is set while `i` waits in `free`.
    in_free: Vec<bool>,
    watermark: usize,
}

impl IndexManager {
    pub fn new(codim: Codim, policy: RecyclePolicy) -> Self {
        Self {
            codim,
            policy,
            free: VecDeque::new(),
            in_free: Vec::new(),
            watermark: 0,
        }
    }

    pub fn codim(&self) -> Codim {
        self.codim
    }

    pub fn policy(&self) -> RecyclePolicy {
        self.policy
    }

    /// One past the largest index ever handed out.
    pub fn watermark(&self) -> usize {
        self.watermark
    }

    /// Indices currently waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of indices currently held.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.watermark - self.free.len()
    }

    /// Take an index: a recycled one if available, else the watermark.
    pub fn allocate(&mut self) -> usize {
        let recycled = match self.policy {
            RecyclePolicy::Lifo => self.free.pop_back(),
            RecyclePolicy::Fifo => self.free.pop_front(),
        };
        let index = match recycled {
            Some(i) => {
                self.in_free[i] = false;
                i
            }
            None => {
                let i = self.watermark;
                self.watermark += 1;
                self.in_free.push(false);
                i
            }
        };
        log::trace!("codim {}: allocate {}", self.codim, index);
        index
    }

    /// Check that `index` could be returned without touching any state.
    pub fn check_free(&self, index: usize) -> Result<(), MeshIndexError> {
        match self.in_free.get(index) {
            None => Err(MeshIndexError::NeverAllocated {
                codim: self.codim,
                index,
            }),
            Some(true) => Err(MeshIndexError::DoubleFree {
                codim: self.codim,
                index,
            }),
            Some(false) => Ok(()),
        }
    }

    /// Return `index` for reuse.
    pub fn free(&mut self, index: usize) -> Result<(), MeshIndexError> {
        self.check_free(index)?;
        self.in_free[index] = true;
        self.free.push_back(index);
        log::trace!("codim {}: free {}", self.codim, index);
        Ok(())
    }

    /// Treat `0..n` as held and forget all freed indices.
    pub fn set_watermark(&mut self, n: usize) {
        self.free.clear();
        self.in_free.clear();
        self.in_free.resize(n, false);
        self.watermark = n;
    }

    /// Re-prime from a set of held indices, as read back from storage.
    ///
    /// The watermark becomes `max + 1` and every index below it that is not
    /// held is queued for reuse in ascending order.
    pub fn restore(&mut self, held: &[usize]) -> Result<(), MeshIndexError> {
        let watermark = held.iter().max().map_or(0, |m| m + 1);
        let mut is_held = vec![false; watermark];
        for &i in held {
            if std::mem::replace(&mut is_held[i], true) {
                return Err(MeshIndexError::CorruptIndexFile {
                    codim: self.codim,
                    reason: format!("index {i} appears twice"),
                });
            }
        }
        self.set_watermark(watermark);
        for (i, _) in is_held.iter().enumerate().filter(|(_, h)| !**h) {
            self.free(i)?;
        }
        log::trace!(
            "codim {}: restored {} held below watermark {}",
            self.codim,
            held.len(),
            watermark
        );
        Ok(())
    }
}

impl DebugInvariants for IndexManager {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "IndexManager");
    }

    fn validate_invariants(&self) -> Result<(), MeshIndexError> {
        if self.in_free.len() != self.watermark {
            return Err(MeshIndexError::NonBijective {
                codim: self.codim,
                reason: format!(
                    "free map covers {} indices, watermark is {}",
                    self.in_free.len(),
                    self.watermark
                ),
            });
        }
        let flagged = self.in_free.iter().filter(|&&f| f).count();
        if flagged != self.free.len() {
            return Err(MeshIndexError::NonBijective {
                codim: self.codim,
                reason: format!("{} flagged free, {} queued", flagged, self.free.len()),
            });
        }
        for &i in &self.free {
            if !self.in_free.get(i).copied().unwrap_or(false) {
                return Err(MeshIndexError::NeverAllocated {
                    codim: self.codim,
                    index: i,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_manager_counts_up() {
        let mut m = IndexManager::new(0, RecyclePolicy::Lifo);
        assert_eq!((0..4).map(|_| m.allocate()).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(m.live_count(), 4);
        m.validate_invariants().unwrap();
    }

    #[test]
    fn lifo_reuses_most_recent_first() {
        let mut m = IndexManager::new(1, RecyclePolicy::Lifo);
        for _ in 0..5 {
            m.allocate();
        }
        m.free(1).unwrap();
        m.free(3).unwrap();
        assert_eq!(m.live_count(), 3);
        assert_eq!(m.allocate(), 3);
        assert_eq!(m.allocate(), 1);
        assert_eq!(m.allocate(), 5);
    }

    #[test]
    fn fifo_reuses_oldest_first() {
        let mut m = IndexManager::new(1, RecyclePolicy::Fifo);
        for _ in 0..5 {
            m.allocate();
        }
        m.free(1).unwrap();
        m.free(3).unwrap();
        assert_eq!(m.allocate(), 1);
        assert_eq!(m.allocate(), 3);
    }

    #[test]
    fn double_free_is_rejected() {
        let mut m = IndexManager::new(2, RecyclePolicy::Lifo);
        m.allocate();
        m.free(0).unwrap();
        assert_eq!(m.free(0), Err(MeshIndexError::DoubleFree { codim: 2, index: 0 }));
        m.validate_invariants().unwrap();
    }

    #[test]
    fn never_allocated_is_rejected() {
        let mut m = IndexManager::new(0, RecyclePolicy::Lifo);
        m.allocate();
        assert_eq!(
            m.free(7),
            Err(MeshIndexError::NeverAllocated { codim: 0, index: 7 })
        );
        assert_eq!(m.live_count(), 1);
    }

    #[test]
    fn watermark_resets_free_list() {
        let mut m = IndexManager::new(0, RecyclePolicy::Lifo);
        m.allocate();
        m.allocate();
        m.free(0).unwrap();
        m.set_watermark(6);
        assert_eq!(m.live_count(), 6);
        assert_eq!(m.allocate(), 6);
        m.free(2).unwrap();
        m.validate_invariants().unwrap();
    }

    #[test]
    fn restore_requeues_holes() {
        let mut m = IndexManager::new(0, RecyclePolicy::Lifo);
        m.restore(&[0, 5, 2]).unwrap();
        assert_eq!(m.watermark(), 6);
        assert_eq!(m.live_count(), 3);
        assert_eq!(m.free_count(), 3);
        m.validate_invariants().unwrap();
        // holes 1, 3, 4 come back before the watermark grows
        let mut next: Vec<usize> = (0..4).map(|_| m.allocate()).collect();
        assert_eq!(next.pop(), Some(6));
        next.sort_unstable();
        assert_eq!(next, vec![1, 3, 4]);
        assert_eq!(
            m.restore(&[1, 1]),
            Err(MeshIndexError::CorruptIndexFile {
                codim: 0,
                reason: "index 1 appears twice".into()
            })
        );
    }
}
