//! `EntityHandle` and `Entity`: opaque references into mesh storage
//!
//! Every entity of a mesh (cell, face, edge, vertex) is owned by the mesh
//! storage backend. The indexing subsystem only ever sees an [`Entity`]: the
//! entity's codimension plus an opaque [`EntityHandle`] the backend can
//! resolve. `EntityHandle` wraps a nonzero `u64` so that 0 stays reserved as
//! an invalid or sentinel value.
//!
//! Handles are never reused by the in-memory backend: destroying an entity
//! and later creating "the same" geometric entity yields a fresh handle.

use crate::mesh_error::MeshIndexError;
use std::{fmt, num::NonZeroU64};

/// Codimension of an entity: 0 = cell, `dimension` = vertex.
pub type Codim = usize;

/// Opaque handle to one entity in mesh storage.
///
/// # Memory layout
/// `repr(transparent)` over `NonZeroU64`, so `Option<EntityHandle>` is the
/// same size as a `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct EntityHandle(NonZeroU64);

impl EntityHandle {
    /// Creates a handle from a raw `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshIndexError::InvalidEntityHandle`] if `raw == 0`.
    ///
    /// ```rust
    /// # use mesh_index::topology::entity::EntityHandle;
    /// let h = EntityHandle::new(1).unwrap();
    /// assert_eq!(h.get(), 1);
    /// assert!(EntityHandle::new(0).is_err());
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, MeshIndexError> {
        NonZeroU64::new(raw)
            .map(EntityHandle)
            .ok_or(MeshIndexError::InvalidEntityHandle)
    }

    /// Returns the raw `u64` behind this handle.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityHandle").field(&self.get()).finish()
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// One mesh entity: codimension plus handle into mesh storage.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Entity {
    /// Codimension of the entity within its mesh.
    pub codim: Codim,
    /// Backend handle.
    pub handle: EntityHandle,
}

impl Entity {
    #[inline]
    pub const fn new(codim: Codim, handle: EntityHandle) -> Self {
        Self { codim, handle }
    }

    /// `true` for codimension-0 entities.
    #[inline]
    pub const fn is_cell(&self) -> bool {
        self.codim == 0
    }
}

/// Prints as `c<codim>:<handle>`, e.g. `c2:17` for a vertex of a 2D mesh.
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}:{}", self.codim, self.handle)
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(EntityHandle, u64);
    assert_eq_size!(Option<EntityHandle>, u64);
    assert_eq_align!(EntityHandle, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(EntityHandle::new(0), Err(MeshIndexError::InvalidEntityHandle));
    }

    #[test]
    fn new_and_get() {
        let h = EntityHandle::new(42).unwrap();
        assert_eq!(h.get(), 42);
        assert_eq!(EntityHandle::new(u64::MAX).unwrap().get(), u64::MAX);
    }

    #[test]
    fn debug_and_display() {
        let h = EntityHandle::new(7).unwrap();
        assert_eq!(format!("{:?}", h), "EntityHandle(7)");
        assert_eq!(format!("{}", h), "7");
        let e = Entity::new(2, h);
        assert_eq!(e.to_string(), "c2:7");
    }

    #[test]
    fn ordering_is_codim_major() {
        let a = Entity::new(0, EntityHandle::new(9).unwrap());
        let b = Entity::new(1, EntityHandle::new(1).unwrap());
        assert!(a < b);
        assert!(a.is_cell());
        assert!(!b.is_cell());
    }
}
