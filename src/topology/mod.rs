//! Mesh topology consumed by the indexing subsystem.
//!
//! This module provides:
//! - entity handles and geometry types
//! - reference-element sub-entity numbering and red-refinement templates
//! - the storage contracts ([`EntitySlots`], [`MeshStorage`], [`AdaptiveMesh`])
//!   and refinement patches handed to an [`AdaptationObserver`]
//! - [`HierarchicalMesh`], an in-memory backend implementing all of them

pub mod entity;
pub mod geometry_type;
pub mod hierarchical_mesh;
pub mod patch;
pub mod reference;
pub mod storage;
pub mod subdivision;

pub use entity::{Codim, Entity, EntityHandle};
pub use geometry_type::GeometryType;
pub use hierarchical_mesh::HierarchicalMesh;
pub use patch::{AdaptationObserver, NoopObserver, RefinementPatch};
pub use storage::{AdaptiveMesh, EntitySlots, INVALID_INDEX, MeshStorage};
