//! Refinement patches and adaptation observers.
//!
//! A [`RefinementPatch`] describes one refine or coarsen step: the parent cell
//! and, per codimension, the entities that step creates (refine) or is about
//! to destroy (coarsen). The mesh hands the patch to an explicit
//! [`AdaptationObserver`] passed into its `refine`/`coarsen` entry points;
//! there is no global callback registry.

use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::storage::EntitySlots;

/// Transient description of a single topology change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefinementPatch {
    /// Cell that was refined, or whose children are being removed.
    pub parent: Entity,
    /// `entities[c]` lists the affected entities of codimension `c`, in
    /// creation order (refine) or removal order (coarsen).
    pub entities: Vec<Vec<Entity>>,
}

impl RefinementPatch {
    /// Empty patch over `dimension + 1` codimensions.
    pub fn new(parent: Entity, dimension: usize) -> Self {
        Self {
            parent,
            entities: vec![Vec::new(); dimension + 1],
        }
    }

    /// Record an affected entity under its own codimension.
    pub fn push(&mut self, entity: Entity) {
        if entity.codim >= self.entities.len() {
            self.entities.resize(entity.codim + 1, Vec::new());
        }
        self.entities[entity.codim].push(entity);
    }

    /// Affected entities of one codimension.
    pub fn codim(&self, codim: Codim) -> &[Entity] {
        self.entities.get(codim).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Count of affected entities per codimension.
    pub fn counts(&self) -> Vec<usize> {
        self.entities.iter().map(Vec::len).collect()
    }

    /// Total number of affected entities.
    pub fn len(&self) -> usize {
        self.entities.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All affected entities, codimension-major.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().flatten().copied()
    }
}

/// Callback object notified around topology changes.
///
/// The mesh calls [`on_refine`](Self::on_refine) strictly after the new
/// entities exist in storage (their slots are addressable) and
/// [`on_coarsen`](Self::on_coarsen) strictly before the listed entities are
/// removed. A failing observer aborts the coarsening step before anything is
/// removed.
pub trait AdaptationObserver {
    fn on_refine(
        &mut self,
        patch: &RefinementPatch,
        slots: &mut dyn EntitySlots,
    ) -> Result<(), MeshIndexError>;

    fn on_coarsen(
        &mut self,
        patch: &RefinementPatch,
        slots: &mut dyn EntitySlots,
    ) -> Result<(), MeshIndexError>;
}

/// Observer that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl AdaptationObserver for NoopObserver {
    fn on_refine(&mut self, _: &RefinementPatch, _: &mut dyn EntitySlots) -> Result<(), MeshIndexError> {
        Ok(())
    }

    fn on_coarsen(&mut self, _: &RefinementPatch, _: &mut dyn EntitySlots) -> Result<(), MeshIndexError> {
        Ok(())
    }
}
