//! Table of per-codimension state, built once and addressed by codimension.

use crate::mesh_error::MeshIndexError;
use crate::topology::entity::Codim;

/// One `T` for each codimension `0..=dimension`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodimTable<T> {
    entries: Vec<T>,
}

impl<T> CodimTable<T> {
    pub fn from_fn(dimension: usize, f: impl FnMut(Codim) -> T) -> Self {
        Self {
            entries: (0..=dimension).map(f).collect(),
        }
    }

    /// Largest valid codimension.
    pub fn dimension(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    fn out_of_range(&self, codim: Codim) -> MeshIndexError {
        MeshIndexError::InvalidCodim {
            codim,
            dimension: self.dimension(),
        }
    }

    pub fn get(&self, codim: Codim) -> Result<&T, MeshIndexError> {
        self.entries.get(codim).ok_or_else(|| self.out_of_range(codim))
    }

    pub fn get_mut(&mut self, codim: Codim) -> Result<&mut T, MeshIndexError> {
        let err = self.out_of_range(codim);
        self.entries.get_mut(codim).ok_or(err)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Codim, &T)> {
        self.entries.iter().enumerate()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Codim, &mut T)> {
        self.entries.iter_mut().enumerate()
    }
}
