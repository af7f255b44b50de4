#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-index
//!
//! mesh-index provides entity indexing and identity for hierarchical meshes
//! used in finite-element style discretizations. For every codimension
//! (0 = cell, ..., d = vertex) it maintains indices below a per-codimension
//! `size` that can size and address per-entity arrays, plus identifiers that survive
//! refinement, coarsening and renumbering.
//!
//! ## Numberings
//! - [`HierarchicIndexSet`](index_set::HierarchicIndexSet): persistent
//!   per-codimension numbering of every live entity on every level, kept in
//!   step with refine/coarsen through an explicit
//!   [`AdaptationObserver`](topology::AdaptationObserver). Indices never
//!   change while an entity lives, so coarsening can leave holes below
//!   `size`; freed indices are recycled LIFO by default (FIFO optional)
//!   before the range grows.
//! - [`LevelIndexSet`](index_set::LevelIndexSet) and
//!   [`LeafIndexSet`](index_set::LeafIndexSet): snapshot views renumbered
//!   `0..n` on every `update()`.
//! - [`IdSet`](index_set::IdSet): `(codim << shift) | hierarchic index`.
//!
//! ## Usage
//! ```
//! use mesh_index::prelude::*;
//! use mesh_index::grid::structured::structured_quads;
//!
//! let mesh = structured_quads(2, 2)?;
//! let mut grid = Grid::new(mesh, IndexSetOptions::default())?;
//! let cell = grid.mesh().entities(0).next().expect("four cells");
//! grid.adapt(&[cell], &[])?;
//! assert_eq!(grid.leaf_index_set().size(0), 7);
//! assert_eq!(grid.hierarchic_index_set().size(0), 8);
//! # Ok::<(), MeshIndexError>(())
//! ```
//!
//! ## Invariant checking
//! Internal consistency checks run in debug builds, or in release builds with
//! the `strict-invariants` / `check-invariants` features; see
//! [`DebugInvariants`].

pub mod debug_invariants;
pub mod grid;
pub mod index_set;
pub mod io;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::grid::{Grid, GridFactory, HierarchicalGridFactory};
    pub use crate::index_set::validation::ValidationOptions;
    pub use crate::index_set::{
        HierarchicIndexSet, IdSet, IdType, IndexManager, IndexSet, IndexSetOptions, LeafIndexSet,
        LevelIndexSet, MultipleCodimMapper, RecyclePolicy,
    };
    pub use crate::mesh_error::MeshIndexError;
    pub use crate::topology::{
        AdaptationObserver, AdaptiveMesh, Codim, Entity, EntityHandle, EntitySlots,
        GeometryType, HierarchicalMesh, MeshStorage, RefinementPatch,
    };
}
