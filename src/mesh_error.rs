//! MeshIndexError: unified error type for mesh-index public APIs
//!
//! Every fallible operation in the crate reports through this enum. Variants
//! fall into four groups: lookups against the wrong mesh or view, fatal
//! invariant violations (corruption or an upstream logic bug), adaptation
//! preconditions, and capabilities a backend does not offer.

use crate::topology::entity::Entity;
use thiserror::Error;

/// Unified error type for mesh-index operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshIndexError {
    // --- entity lookups -------------------------------------------------
    /// Attempted to construct an `EntityHandle` with a zero value.
    #[error("EntityHandle must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidEntityHandle,
    /// The entity does not belong to this mesh (or was already destroyed).
    #[error("entity {0} does not belong to this mesh")]
    InvalidEntity(Entity),
    /// Codimension outside `0..=dimension`.
    #[error("codimension {codim} out of range for a {dimension}-dimensional mesh")]
    InvalidCodim { codim: usize, dimension: usize },
    /// Local sub-entity number out of range for the parent's reference element.
    #[error("sub-entity {local} of codimension {codim} out of range (element has {count})")]
    InvalidSubEntity {
        codim: usize,
        local: usize,
        count: usize,
    },
    /// The entity exists but is filtered out of this level/leaf view.
    #[error("entity {0} is not contained in this index set")]
    NotContained(Entity),
    /// Operation needs a codimension-0 entity.
    #[error("entity {0} is not a cell")]
    NotACell(Entity),
    /// Level outside `0..=max_level`.
    #[error("level {level} does not exist (max level is {max_level})")]
    UnknownLevel { level: usize, max_level: usize },
    /// An entity is live but its slot holds no valid index.
    #[error("entity {0} has no index assigned")]
    UnassignedSlot(Entity),
    /// A freshly created entity already carries an index.
    #[error("new entity {0} already has an index assigned")]
    SlotAlreadyAssigned(Entity),

    // --- invariant violations (fatal) -----------------------------------
    /// An index was returned to its manager twice.
    #[error("double free of index {index} in codimension {codim}")]
    DoubleFree { codim: usize, index: usize },
    /// An index was returned that the manager never handed out.
    #[error("index {index} in codimension {codim} was never allocated")]
    NeverAllocated { codim: usize, index: usize },
    /// Live count of a codimension no longer fits below the identifier shift.
    #[error("identifier space overflow: codimension {codim} holds {size} entities (max {max})")]
    IdSpaceOverflow { codim: usize, size: usize, max: usize },
    /// Identifier shift leaves no room for the codimension bits.
    #[error("codimension shift {shift} cannot encode codimensions 0..={dimension} in 32 bits")]
    InvalidCodimShift { shift: u32, dimension: usize },
    /// Persisted data does not match the mesh it is read into.
    #[error("structural mismatch in codimension {codim}: expected {expected} entries, found {found}")]
    StructuralMismatch {
        codim: usize,
        expected: usize,
        found: usize,
    },
    /// Persisted indices are duplicated or unassigned.
    #[error("corrupt index file for codimension {codim}: {reason}")]
    CorruptIndexFile { codim: usize, reason: String },
    /// Two distinct entities map to the same identifier.
    #[error("entities {first} and {second} share identifier {id}")]
    DuplicateId {
        first: Entity,
        second: Entity,
        id: u32,
    },
    /// Numbering is not a bijection onto `0..size`.
    #[error("numbering of codimension {codim} is not bijective: {reason}")]
    NonBijective { codim: usize, reason: String },
    /// `sub_index(p, i, c)` disagrees with `index(sub_entity(p, i, c))`.
    #[error("sub-index mismatch for {parent} (local {local}, codimension {codim}): {sub_index} != {index}")]
    SubIndexMismatch {
        parent: Entity,
        local: usize,
        codim: usize,
        sub_index: usize,
        index: usize,
    },
    /// A child could not be found among its own father's children.
    #[error("cannot find child {child} in its own father {father}")]
    ChildNotInFather { child: Entity, father: Entity },
    /// A level-zero entity claims to have a father.
    #[error("level-zero entity {0} reports a father")]
    LevelZeroHasFather(Entity),

    // --- adaptation -----------------------------------------------------
    /// Cell cannot be refined (already refined, or not a cell).
    #[error("entity {0} cannot be refined")]
    NotRefinable(Entity),
    /// Cell cannot be coarsened (no children, or a child is itself refined).
    #[error("entity {0} cannot be coarsened")]
    NotCoarsenable(Entity),

    // --- construction ---------------------------------------------------
    /// Element references a vertex that was never inserted.
    #[error("element references unknown vertex {vertex} (only {count} inserted)")]
    UnknownVertex { vertex: usize, count: usize },
    /// Element vertex list does not match its geometry type.
    #[error("{geometry} expects {expected} vertices, got {found}")]
    VertexCountMismatch {
        geometry: crate::topology::geometry_type::GeometryType,
        expected: usize,
        found: usize,
    },
    /// Elements of different dimensions were inserted into one mesh.
    #[error("element dimension {found} does not match mesh dimension {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    /// Vertex coordinates of inconsistent length.
    #[error("vertex has {found} coordinates, expected {expected}")]
    CoordinateMismatch { expected: usize, found: usize },
    /// `finalize` called without any element.
    #[error("grid factory holds no elements")]
    EmptyGrid,

    // --- capabilities ---------------------------------------------------
    /// Operation is not implemented for this backend.
    #[error("not implemented for this backend: {0}")]
    Unsupported(&'static str),

    // --- I/O ------------------------------------------------------------
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// Malformed persisted index file.
    #[error("index file parse error: {0}")]
    IndexFileParse(String),
}

impl From<std::io::Error> for MeshIndexError {
    fn from(e: std::io::Error) -> Self {
        MeshIndexError::Io(e.to_string())
    }
}

impl MeshIndexError {
    /// `true` for errors that indicate corruption or an upstream logic bug.
    ///
    /// These are never retried; the caller should abort the operation.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            MeshIndexError::DoubleFree { .. }
                | MeshIndexError::NeverAllocated { .. }
                | MeshIndexError::IdSpaceOverflow { .. }
                | MeshIndexError::StructuralMismatch { .. }
                | MeshIndexError::CorruptIndexFile { .. }
                | MeshIndexError::DuplicateId { .. }
                | MeshIndexError::NonBijective { .. }
                | MeshIndexError::SubIndexMismatch { .. }
                | MeshIndexError::ChildNotInFather { .. }
                | MeshIndexError::LevelZeroHasFather(_)
                | MeshIndexError::UnassignedSlot(_)
                | MeshIndexError::SlotAlreadyAssigned(_)
        )
    }

    /// `true` when the backend lacks the requested capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MeshIndexError::Unsupported(_))
    }
}
