//! Multiple-codimension mapper: one consecutive index range over the
//! codimensions selected by a layout, used to size per-entity data arrays.

use crate::index_set::IndexSet;
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::geometry_type::GeometryType;

/// Layout accepting vertices only.
pub fn vertex_layout(geometry: GeometryType) -> bool {
    geometry.dimension() == 0
}

/// Maps every entity of the accepted codimensions to `offset[codim] + index`.
///
/// A codimension is accepted when the layout accepts all of its geometry
/// types. A layout that accepts only some of the types present in one
/// codimension is rejected.
pub struct MultipleCodimMapper<S, L> {
    set: S,
    layout: L,
    offsets: Vec<Option<usize>>,
    size: usize,
}

impl<S, L> MultipleCodimMapper<S, L>
where
    S: IndexSet,
    L: Fn(GeometryType) -> bool,
{
    pub fn new(set: S, layout: L) -> Result<Self, MeshIndexError> {
        let mut mapper = Self {
            set,
            layout,
            offsets: Vec::new(),
            size: 0,
        };
        mapper.compute_offsets()?;
        Ok(mapper)
    }

    /// Rebind to a freshly updated index set and recompute the offsets.
    pub fn update(&mut self, set: S) -> Result<(), MeshIndexError> {
        self.set = set;
        self.compute_offsets()
    }

    fn compute_offsets(&mut self) -> Result<(), MeshIndexError> {
        let mut offsets = Vec::with_capacity(self.set.dimension() + 1);
        let mut size = 0;
        for codim in 0..=self.set.dimension() {
            let types = self.set.geometry_types(codim);
            let accepted = types.iter().filter(|&&gt| (self.layout)(gt)).count();
            if accepted == 0 {
                offsets.push(None);
            } else if accepted == types.len() {
                offsets.push(Some(size));
                size += self.set.size(codim);
            } else {
                return Err(MeshIndexError::Unsupported(
                    "layout accepting part of one codimension",
                ));
            }
        }
        self.offsets = offsets;
        self.size = size;
        Ok(())
    }

    /// Total number of mapped entities.
    pub fn size(&self) -> usize {
        self.size
    }

    fn offset(&self, codim: Codim) -> Option<usize> {
        self.offsets.get(codim).copied().flatten()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.offset(entity.codim).is_some() && self.set.contains(entity)
    }

    pub fn index(&self, entity: Entity) -> Result<usize, MeshIndexError> {
        let offset = self
            .offset(entity.codim)
            .ok_or(MeshIndexError::NotContained(entity))?;
        Ok(offset + self.set.index(entity)?)
    }

    pub fn sub_index(&self, cell: Entity, local: usize, codim: Codim) -> Result<usize, MeshIndexError> {
        let offset = self.offset(codim).ok_or(MeshIndexError::InvalidCodim {
            codim,
            dimension: self.set.dimension(),
        })?;
        Ok(offset + self.set.sub_index(cell, local, codim)?)
    }
}
