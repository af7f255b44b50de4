//! In-memory hierarchical mesh backend.
//!
//! Entities are shared across levels: a vertex exists exactly once and keeps
//! the level on which it was created. Red refinement of a cell creates its
//! children plus every sub-entity of the children that does not exist yet.
//! Inserted points are deduplicated by the entity they are the center of
//! (edge midpoint, quad face center, hex/quad cell center), and edges/faces
//! by their sorted corner set, so neighbors refining a shared edge agree on
//! the new entities.
//!
//! Lower-dimensional entities are reference-counted by the live cells using
//! them; coarsening a cell destroys its children and every entity whose last
//! user was one of those children. Handles are never reused.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity, EntityHandle};
use crate::topology::geometry_type::GeometryType;
use crate::topology::patch::{AdaptationObserver, RefinementPatch};
use crate::topology::reference::{has_center, sub_entity_count, sub_entity_type, sub_entity_vertices};
use crate::topology::storage::{AdaptiveMesh, EntitySlots, INVALID_INDEX, MeshStorage};
use crate::topology::subdivision::{SubdivisionNodes, subdivide};
use hashbrown::{HashMap, HashSet};
use std::collections::BTreeMap;

/// Where a vertex came from; used to deduplicate inserted points.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum VertexOrigin {
    /// Inserted by the grid factory (index in insertion order).
    Macro(usize),
    /// Center of another entity (edge midpoint, face or cell center).
    Center(Entity),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EntityKey {
    Cell,
    Vertex(VertexOrigin),
    /// Codimension plus sorted corner handles.
    Face(Codim, Vec<EntityHandle>),
}

#[derive(Clone, Debug)]
struct CellData {
    father: Option<EntityHandle>,
    children: Vec<EntityHandle>,
    /// `sub_entities[c]` in reference order; `sub_entities[0] == [self]`.
    sub_entities: Vec<Vec<EntityHandle>>,
}

#[derive(Clone, Debug)]
struct EntityRecord {
    level: usize,
    geometry: GeometryType,
    /// Corners in reference order (`[self]` for a vertex).
    vertices: Vec<EntityHandle>,
    slot: usize,
    key: EntityKey,
    /// Live cells having this entity as a sub-entity (non-cells only).
    users: Vec<EntityHandle>,
    /// Vertex coordinates (empty for other entities).
    coords: Vec<f64>,
    cell: Option<CellData>,
}

/// Tree of nested cells with shared lower-dimensional entities.
#[derive(Clone, Debug)]
pub struct HierarchicalMesh {
    dimension: usize,
    world_dimension: usize,
    /// `records[c]`: live entities of codimension `c`, ordered by handle.
    records: Vec<BTreeMap<EntityHandle, EntityRecord>>,
    vertex_keys: HashMap<VertexOrigin, EntityHandle>,
    face_keys: HashMap<(Codim, Vec<EntityHandle>), EntityHandle>,
    cells_per_level: Vec<usize>,
    next_handle: u64,
    revision: u64,
}

impl HierarchicalMesh {
    /// Build the level-0 mesh from macro vertices and elements.
    ///
    /// Element vertex lists index into `vertices`. All elements must share
    /// one dimension; vertex coordinates must share one length.
    pub fn from_macro_elements(
        vertices: &[Vec<f64>],
        elements: &[(GeometryType, Vec<usize>)],
    ) -> Result<Self, MeshIndexError> {
        let Some((first, _)) = elements.first() else {
            return Err(MeshIndexError::EmptyGrid);
        };
        let dimension = first.dimension();
        if dimension == 0 {
            return Err(MeshIndexError::Unsupported("zero-dimensional meshes"));
        }
        let world_dimension = vertices.first().map(Vec::len).unwrap_or(dimension);

        let mut mesh = Self {
            dimension,
            world_dimension,
            records: vec![BTreeMap::new(); dimension + 1],
            vertex_keys: HashMap::new(),
            face_keys: HashMap::new(),
            cells_per_level: vec![0],
            next_handle: 1,
            revision: 0,
        };

        let mut vertex_handles = Vec::with_capacity(vertices.len());
        for (i, coords) in vertices.iter().enumerate() {
            if coords.len() != world_dimension {
                return Err(MeshIndexError::CoordinateMismatch {
                    expected: world_dimension,
                    found: coords.len(),
                });
            }
            let h = mesh.insert_vertex(VertexOrigin::Macro(i), 0, coords.clone())?;
            vertex_handles.push(h);
        }

        // macro creation needs no patch; collect into a throwaway one
        let scratch_parent = Entity::new(0, EntityHandle::new(u64::MAX)?);
        let mut scratch = RefinementPatch::new(scratch_parent, dimension);
        for (geometry, local) in elements {
            if geometry.dimension() != dimension {
                return Err(MeshIndexError::DimensionMismatch {
                    expected: dimension,
                    found: geometry.dimension(),
                });
            }
            if local.len() != geometry.vertex_count() {
                return Err(MeshIndexError::VertexCountMismatch {
                    geometry: *geometry,
                    expected: geometry.vertex_count(),
                    found: local.len(),
                });
            }
            let corners = local
                .iter()
                .map(|&v| {
                    vertex_handles
                        .get(v)
                        .copied()
                        .ok_or(MeshIndexError::UnknownVertex {
                            vertex: v,
                            count: vertex_handles.len(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            mesh.insert_cell(*geometry, corners, 0, None, &mut scratch)?;
        }
        mesh.cells_per_level[0] = elements.len();

        log::debug!(
            "built macro mesh: dim={} counts={:?}",
            dimension,
            mesh.records.iter().map(BTreeMap::len).collect::<Vec<_>>()
        );
        Ok(mesh)
    }

    /// Length of the vertex coordinate vectors.
    pub fn world_dimension(&self) -> usize {
        self.world_dimension
    }

    /// Coordinates of a vertex.
    pub fn vertex_coordinates(&self, vertex: Entity) -> Result<&[f64], MeshIndexError> {
        if vertex.codim != self.dimension {
            return Err(MeshIndexError::InvalidEntity(vertex));
        }
        Ok(self.record(vertex)?.coords.as_slice())
    }

    /// Corners of an entity in reference order.
    pub fn corners(&self, entity: Entity) -> Result<Vec<Entity>, MeshIndexError> {
        let dim = self.dimension;
        Ok(self
            .record(entity)?
            .vertices
            .iter()
            .map(|&h| Entity::new(dim, h))
            .collect())
    }

    /// Current leaf cells in discovery order.
    pub fn leaf_cells(&self) -> Vec<Entity> {
        self.leaf_entities(0).collect()
    }

    /// Number of cells living on `level`.
    pub fn cells_on_level(&self, level: usize) -> usize {
        self.cells_per_level.get(level).copied().unwrap_or(0)
    }

    fn record(&self, entity: Entity) -> Result<&EntityRecord, MeshIndexError> {
        self.records
            .get(entity.codim)
            .and_then(|m| m.get(&entity.handle))
            .ok_or(MeshIndexError::InvalidEntity(entity))
    }

    fn record_mut(&mut self, entity: Entity) -> Result<&mut EntityRecord, MeshIndexError> {
        self.records
            .get_mut(entity.codim)
            .and_then(|m| m.get_mut(&entity.handle))
            .ok_or(MeshIndexError::InvalidEntity(entity))
    }

    fn cell_data(&self, cell: Entity) -> Result<&CellData, MeshIndexError> {
        if cell.codim != 0 {
            return Err(MeshIndexError::NotACell(cell));
        }
        self.record(cell)?
            .cell
            .as_ref()
            .ok_or(MeshIndexError::NotACell(cell))
    }

    fn alloc_handle(&mut self) -> Result<EntityHandle, MeshIndexError> {
        let h = EntityHandle::new(self.next_handle)?;
        self.next_handle += 1;
        Ok(h)
    }

    fn insert_vertex(
        &mut self,
        origin: VertexOrigin,
        level: usize,
        coords: Vec<f64>,
    ) -> Result<EntityHandle, MeshIndexError> {
        let h = self.alloc_handle()?;
        self.vertex_keys.insert(origin.clone(), h);
        self.records[self.dimension].insert(
            h,
            EntityRecord {
                level,
                geometry: GeometryType::Vertex,
                vertices: vec![h],
                slot: INVALID_INDEX,
                key: EntityKey::Vertex(origin),
                users: Vec::new(),
                coords,
                cell: None,
            },
        );
        Ok(h)
    }

    /// Center vertex of `entity`, created on `level` if absent.
    fn center_vertex(
        &mut self,
        entity: Entity,
        level: usize,
        patch: &mut RefinementPatch,
    ) -> Result<EntityHandle, MeshIndexError> {
        let origin = VertexOrigin::Center(entity);
        if let Some(&h) = self.vertex_keys.get(&origin) {
            return Ok(h);
        }
        let corners = self.record(entity)?.vertices.clone();
        let mut coords = vec![0.0; self.world_dimension];
        for &c in &corners {
            let rec = self.record(Entity::new(self.dimension, c))?;
            for (acc, x) in coords.iter_mut().zip(&rec.coords) {
                *acc += x;
            }
        }
        let n = corners.len().max(1) as f64;
        for x in &mut coords {
            *x /= n;
        }
        let h = self.insert_vertex(origin, level, coords)?;
        patch.push(Entity::new(self.dimension, h));
        Ok(h)
    }

    /// Edge or face with the given corners, created on `level` if absent.
    fn face(
        &mut self,
        codim: Codim,
        geometry: GeometryType,
        corners: Vec<EntityHandle>,
        level: usize,
        patch: &mut RefinementPatch,
    ) -> Result<EntityHandle, MeshIndexError> {
        let mut sorted = corners.clone();
        sorted.sort_unstable();
        if let Some(&h) = self.face_keys.get(&(codim, sorted.clone())) {
            return Ok(h);
        }
        let h = self.alloc_handle()?;
        self.face_keys.insert((codim, sorted.clone()), h);
        self.records[codim].insert(
            h,
            EntityRecord {
                level,
                geometry,
                vertices: corners,
                slot: INVALID_INDEX,
                key: EntityKey::Face(codim, sorted),
                users: Vec::new(),
                coords: Vec::new(),
                cell: None,
            },
        );
        patch.push(Entity::new(codim, h));
        Ok(h)
    }

    /// Create a cell, its missing sub-entities, and register it as their user.
    fn insert_cell(
        &mut self,
        geometry: GeometryType,
        corners: Vec<EntityHandle>,
        level: usize,
        father: Option<EntityHandle>,
        patch: &mut RefinementPatch,
    ) -> Result<EntityHandle, MeshIndexError> {
        let dim = self.dimension;
        let h = self.alloc_handle()?;
        patch.push(Entity::new(0, h));

        let mut sub_entities = vec![Vec::new(); dim + 1];
        sub_entities[0].push(h);
        for codim in 1..dim {
            let sub_geometry = sub_entity_type(geometry, codim)?;
            for local in sub_entity_vertices(geometry, codim)? {
                let sub_corners: Vec<_> = local.iter().map(|&i| corners[i]).collect();
                let sub = self.face(codim, sub_geometry, sub_corners, level, patch)?;
                sub_entities[codim].push(sub);
            }
        }
        sub_entities[dim] = corners.clone();

        for (codim, subs) in sub_entities.iter().enumerate().skip(1) {
            for &sub in subs {
                self.records[codim]
                    .get_mut(&sub)
                    .ok_or(MeshIndexError::InvalidEntity(Entity::new(codim, sub)))?
                    .users
                    .push(h);
            }
        }

        self.records[0].insert(
            h,
            EntityRecord {
                level,
                geometry,
                vertices: corners,
                slot: INVALID_INDEX,
                key: EntityKey::Cell,
                users: Vec::new(),
                coords: Vec::new(),
                cell: Some(CellData {
                    father,
                    children: Vec::new(),
                    sub_entities,
                }),
            },
        );
        Ok(h)
    }

    fn remove_entity(&mut self, entity: Entity) -> Result<(), MeshIndexError> {
        let rec = self
            .records
            .get_mut(entity.codim)
            .and_then(|m| m.remove(&entity.handle))
            .ok_or(MeshIndexError::InvalidEntity(entity))?;
        match rec.key {
            EntityKey::Cell => {}
            EntityKey::Vertex(origin) => {
                self.vertex_keys.remove(&origin);
            }
            EntityKey::Face(codim, sorted) => {
                self.face_keys.remove(&(codim, sorted));
            }
        }
        Ok(())
    }

    /// Center vertices and children of `cell`, recorded in `patch` as they
    /// are created.
    #[allow(clippy::too_many_arguments)]
    fn create_children(
        &mut self,
        cell: Entity,
        geometry: GeometryType,
        corners: Vec<EntityHandle>,
        sub_entities: &[Vec<EntityHandle>],
        child_level: usize,
        patch: &mut RefinementPatch,
        children: &mut Vec<EntityHandle>,
    ) -> Result<(), MeshIndexError> {
        let dim = self.dimension;
        let mut centers = vec![Vec::new(); dim + 1];
        for (d, slot) in centers.iter_mut().enumerate().skip(1) {
            let codim = dim - d;
            for &sub in &sub_entities[codim] {
                let sub = Entity::new(codim, sub);
                if has_center(self.record(sub)?.geometry) {
                    slot.push(self.center_vertex(sub, child_level, patch)?);
                }
            }
        }

        let nodes = SubdivisionNodes {
            vertices: corners,
            centers,
        };
        for corners in subdivide(geometry, &nodes)? {
            children.push(self.insert_cell(geometry, corners, child_level, Some(cell.handle), patch)?);
        }
        Ok(())
    }

    /// Remove every entity of `patch`, unregistering its cells as users of
    /// their sub-entities first.
    fn discard(&mut self, patch: &RefinementPatch) -> Result<(), MeshIndexError> {
        for &cell in patch.codim(0) {
            let Ok(data) = self.cell_data(cell) else {
                continue;
            };
            let subs = data.sub_entities.clone();
            for (codim, list) in subs.iter().enumerate().skip(1) {
                for sub in list {
                    if let Some(rec) = self.records[codim].get_mut(sub) {
                        rec.users.retain(|&u| u != cell.handle);
                    }
                }
            }
        }
        for e in patch.iter() {
            if self.contains_entity(e) {
                self.remove_entity(e)?;
            }
        }
        Ok(())
    }

    /// Cells: created on `level`. Others: used by a cell created on `level`.
    fn in_level(&self, rec: &EntityRecord, level: usize) -> bool {
        match rec.cell {
            Some(_) => rec.level == level,
            None => rec
                .users
                .iter()
                .any(|u| self.records[0].get(u).is_some_and(|c| c.level == level)),
        }
    }

    fn is_leaf_cell(&self, handle: EntityHandle) -> bool {
        self.records[0]
            .get(&handle)
            .and_then(|r| r.cell.as_ref())
            .map(|c| c.children.is_empty())
            .unwrap_or(false)
    }
}

impl EntitySlots for HierarchicalMesh {
    fn slot(&self, entity: Entity) -> Result<usize, MeshIndexError> {
        Ok(self.record(entity)?.slot)
    }

    fn set_slot(&mut self, entity: Entity, value: usize) -> Result<(), MeshIndexError> {
        self.record_mut(entity)?.slot = value;
        Ok(())
    }
}

impl MeshStorage for HierarchicalMesh {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.record(entity).is_ok()
    }

    fn level(&self, entity: Entity) -> Result<usize, MeshIndexError> {
        Ok(self.record(entity)?.level)
    }

    fn max_level(&self) -> usize {
        self.cells_per_level.len().saturating_sub(1)
    }

    fn is_leaf(&self, entity: Entity) -> Result<bool, MeshIndexError> {
        let rec = self.record(entity)?;
        Ok(match &rec.cell {
            Some(cell) => cell.children.is_empty(),
            None => rec.users.iter().any(|&u| self.is_leaf_cell(u)),
        })
    }

    fn geometry_type(&self, entity: Entity) -> Result<GeometryType, MeshIndexError> {
        Ok(self.record(entity)?.geometry)
    }

    fn father(&self, entity: Entity) -> Result<Option<Entity>, MeshIndexError> {
        let rec = self.record(entity)?;
        Ok(rec
            .cell
            .as_ref()
            .and_then(|c| c.father)
            .map(|h| Entity::new(0, h)))
    }

    fn children(&self, entity: Entity) -> Result<Vec<Entity>, MeshIndexError> {
        let rec = self.record(entity)?;
        Ok(rec
            .cell
            .as_ref()
            .map(|c| c.children.iter().map(|&h| Entity::new(0, h)).collect())
            .unwrap_or_default())
    }

    fn entities(&self, codim: Codim) -> Box<dyn Iterator<Item = Entity> + '_> {
        match self.records.get(codim) {
            Some(map) => Box::new(map.keys().map(move |&h| Entity::new(codim, h))),
            None => Box::new(std::iter::empty()),
        }
    }

    fn level_entities(&self, level: usize, codim: Codim) -> Box<dyn Iterator<Item = Entity> + '_> {
        match self.records.get(codim) {
            Some(map) => Box::new(
                map.iter()
                    .filter(move |(_, rec)| self.in_level(rec, level))
                    .map(move |(&h, _)| Entity::new(codim, h)),
            ),
            None => Box::new(std::iter::empty()),
        }
    }

    fn entity_count(&self, codim: Codim) -> usize {
        self.records.get(codim).map(BTreeMap::len).unwrap_or(0)
    }

    fn sub_entity_count(&self, cell: Entity, codim: Codim) -> Result<usize, MeshIndexError> {
        let geometry = self.record(cell)?.geometry;
        if cell.codim != 0 {
            return Err(MeshIndexError::NotACell(cell));
        }
        sub_entity_count(geometry, codim)
    }

    fn sub_entity(&self, cell: Entity, local: usize, codim: Codim) -> Result<Entity, MeshIndexError> {
        let data = self.cell_data(cell)?;
        let subs = data
            .sub_entities
            .get(codim)
            .ok_or(MeshIndexError::InvalidCodim {
                codim,
                dimension: self.dimension,
            })?;
        subs.get(local)
            .map(|&h| Entity::new(codim, h))
            .ok_or(MeshIndexError::InvalidSubEntity {
                codim,
                local,
                count: subs.len(),
            })
    }
}

impl AdaptiveMesh for HierarchicalMesh {
    fn refine(
        &mut self,
        cell: Entity,
        observer: &mut dyn AdaptationObserver,
    ) -> Result<RefinementPatch, MeshIndexError> {
        let dim = self.dimension;
        let (geometry, level, corners, sub_entities) = {
            let rec = self.record(cell)?;
            let data = rec.cell.as_ref().ok_or(MeshIndexError::NotACell(cell))?;
            if !data.children.is_empty() {
                return Err(MeshIndexError::NotRefinable(cell));
            }
            (
                rec.geometry,
                rec.level,
                rec.vertices.clone(),
                data.sub_entities.clone(),
            )
        };
        let child_level = level + 1;
        let mut patch = RefinementPatch::new(cell, dim);
        let mut children = Vec::new();

        // nothing is committed to the parent until the observer accepted the patch
        let mut outcome = self.create_children(
            cell,
            geometry,
            corners,
            &sub_entities,
            child_level,
            &mut patch,
            &mut children,
        );
        if outcome.is_ok() {
            outcome = observer.on_refine(&patch, self);
        }
        if let Err(err) = outcome {
            self.discard(&patch)?;
            log::debug!("refinement of {cell} rolled back: {err}");
            return Err(err);
        }

        let child_count = children.len();
        if let Some(data) = self.record_mut(cell)?.cell.as_mut() {
            data.children = children;
        }
        if self.cells_per_level.len() <= child_level {
            self.cells_per_level.resize(child_level + 1, 0);
        }
        self.cells_per_level[child_level] += child_count;
        self.revision += 1;

        log::debug!(
            "refined {} into {} children; created per codim {:?}",
            cell,
            child_count,
            patch.counts()
        );
        Ok(patch)
    }

    fn coarsen(
        &mut self,
        cell: Entity,
        observer: &mut dyn AdaptationObserver,
    ) -> Result<RefinementPatch, MeshIndexError> {
        let dim = self.dimension;
        let (level, children) = {
            let rec = self.record(cell)?;
            let data = rec.cell.as_ref().ok_or(MeshIndexError::NotACell(cell))?;
            (rec.level, data.children.clone())
        };
        if children.is_empty() || children.iter().any(|&c| !self.is_leaf_cell(c)) {
            return Err(MeshIndexError::NotCoarsenable(cell));
        }

        let child_set: HashSet<EntityHandle> = children.iter().copied().collect();
        let mut patch = RefinementPatch::new(cell, dim);
        for &child in &children {
            patch.push(Entity::new(0, child));
        }
        let mut seen = HashSet::new();
        for codim in 1..=dim {
            for &child in &children {
                let data = self.cell_data(Entity::new(0, child))?;
                for &sub in &data.sub_entities[codim] {
                    if !seen.insert((codim, sub)) {
                        continue;
                    }
                    let sub = Entity::new(codim, sub);
                    if self.record(sub)?.users.iter().all(|u| child_set.contains(u)) {
                        patch.push(sub);
                    }
                }
            }
        }

        observer.on_coarsen(&patch, self)?;

        self.discard(&patch)?;
        if let Some(data) = self.record_mut(cell)?.cell.as_mut() {
            data.children.clear();
        }
        if let Some(count) = self.cells_per_level.get_mut(level + 1) {
            *count -= children.len();
        }
        while self.cells_per_level.len() > 1 && self.cells_per_level.last() == Some(&0) {
            self.cells_per_level.pop();
        }
        self.revision += 1;

        log::debug!(
            "coarsened {}; destroyed per codim {:?}",
            cell,
            patch.counts()
        );
        Ok(patch)
    }
}

impl DebugInvariants for HierarchicalMesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HierarchicalMesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshIndexError> {
        for (&h, rec) in &self.records[0] {
            let cell = Entity::new(0, h);
            let Some(data) = rec.cell.as_ref() else {
                return Err(MeshIndexError::NotACell(cell));
            };
            match data.father {
                None if rec.level != 0 => {
                    return Err(MeshIndexError::InvalidEntity(cell));
                }
                Some(_) if rec.level == 0 => {
                    return Err(MeshIndexError::LevelZeroHasFather(cell));
                }
                Some(f) => {
                    let father = Entity::new(0, f);
                    let siblings = &self.cell_data(father)?.children;
                    if !siblings.contains(&h) {
                        return Err(MeshIndexError::ChildNotInFather { child: cell, father });
                    }
                }
                None => {}
            }
            for (codim, subs) in data.sub_entities.iter().enumerate().skip(1) {
                for &sub in subs {
                    let sub = Entity::new(codim, sub);
                    if !self.record(sub)?.users.contains(&h) {
                        return Err(MeshIndexError::InvalidEntity(sub));
                    }
                }
            }
        }
        for (codim, map) in self.records.iter().enumerate().skip(1) {
            for (&h, rec) in map {
                for &u in &rec.users {
                    if !self.records[0].contains_key(&u) {
                        return Err(MeshIndexError::InvalidEntity(Entity::new(codim, h)));
                    }
                }
            }
        }
        let keyed = self.vertex_keys.len() + self.face_keys.len();
        let non_cells: usize = self.records.iter().skip(1).map(BTreeMap::len).sum();
        if keyed != non_cells {
            return Err(MeshIndexError::NonBijective {
                codim: self.dimension,
                reason: format!("{keyed} dedup keys for {non_cells} entities"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::patch::NoopObserver;

    fn unit_square_quads() -> HierarchicalMesh {
        // 2x2 quads, 9 vertices
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(vec![i as f64, j as f64]);
            }
        }
        let mut elements = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                let v0 = j * 3 + i;
                elements.push((GeometryType::Quadrilateral, vec![v0, v0 + 1, v0 + 4, v0 + 3]));
            }
        }
        HierarchicalMesh::from_macro_elements(&vertices, &elements).unwrap()
    }

    #[test]
    fn macro_counts() {
        let mesh = unit_square_quads();
        assert_eq!(mesh.entity_count(0), 4);
        assert_eq!(mesh.entity_count(1), 12);
        assert_eq!(mesh.entity_count(2), 9);
        assert_eq!(mesh.max_level(), 0);
        mesh.validate_invariants().unwrap();
    }

    #[test]
    fn refine_creates_children_and_shared_midpoints() {
        let mut mesh = unit_square_quads();
        let cell = mesh.entities(0).next().unwrap();
        let patch = mesh.refine(cell, &mut NoopObserver).unwrap();
        // 4 children, 4 split edges * 2 + 4 interior edges, 4 midpoints + center
        assert_eq!(patch.counts(), vec![4, 12, 5]);
        assert_eq!(mesh.max_level(), 1);
        assert!(!mesh.is_leaf(cell).unwrap());
        assert_eq!(mesh.leaf_cells().len(), 7);

        // neighbor reuses the midpoint on the shared edge
        let neighbor = mesh.entities(0).nth(1).unwrap();
        let patch = mesh.refine(neighbor, &mut NoopObserver).unwrap();
        assert_eq!(patch.counts(), vec![4, 10, 4]);
        mesh.validate_invariants().unwrap();
    }

    #[test]
    fn coarsen_removes_only_unshared_entities() {
        let mut mesh = unit_square_quads();
        let cells: Vec<_> = mesh.entities(0).collect();
        mesh.refine(cells[0], &mut NoopObserver).unwrap();
        mesh.refine(cells[1], &mut NoopObserver).unwrap();
        let patch = mesh.coarsen(cells[0], &mut NoopObserver).unwrap();
        // shared half-edges and the shared midpoint survive
        assert_eq!(patch.counts(), vec![4, 10, 4]);
        mesh.validate_invariants().unwrap();
        let patch = mesh.coarsen(cells[1], &mut NoopObserver).unwrap();
        assert_eq!(patch.counts(), vec![4, 12, 5]);
        assert_eq!(mesh.entity_count(1), 12);
        assert_eq!(mesh.entity_count(2), 9);
        assert_eq!(mesh.max_level(), 0);
    }

    /// Accepts nothing.
    struct Refuse;

    impl AdaptationObserver for Refuse {
        fn on_refine(&mut self, patch: &RefinementPatch, _: &mut dyn EntitySlots) -> Result<(), MeshIndexError> {
            Err(MeshIndexError::SlotAlreadyAssigned(patch.parent))
        }

        fn on_coarsen(&mut self, patch: &RefinementPatch, _: &mut dyn EntitySlots) -> Result<(), MeshIndexError> {
            Err(MeshIndexError::SlotAlreadyAssigned(patch.parent))
        }
    }

    #[test]
    fn refine_failure_creates_nothing() {
        let mut mesh = unit_square_quads();
        let cells: Vec<_> = mesh.entities(0).collect();
        mesh.refine(cells[1], &mut NoopObserver).unwrap();
        let counts = |m: &HierarchicalMesh| (0..=2).map(|c| m.entity_count(c)).collect::<Vec<_>>();
        let before = counts(&mesh);
        let revision = mesh.revision();

        assert!(mesh.refine(cells[0], &mut Refuse).is_err());
        assert_eq!(counts(&mesh), before);
        assert_eq!(mesh.revision(), revision);
        assert!(mesh.is_leaf(cells[0]).unwrap());
        assert!(mesh.children(cells[0]).unwrap().is_empty());
        assert_eq!(mesh.cells_on_level(1), 4);
        mesh.validate_invariants().unwrap();

        // the shared midpoint survives and is reused by a later refinement
        let patch = mesh.refine(cells[0], &mut NoopObserver).unwrap();
        assert_eq!(patch.counts(), vec![4, 10, 4]);
        mesh.validate_invariants().unwrap();
    }

    #[test]
    fn coarsen_failure_removes_nothing() {
        let mut mesh = unit_square_quads();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();
        let revision = mesh.revision();
        assert!(mesh.coarsen(cell, &mut Refuse).is_err());
        assert_eq!(mesh.children(cell).unwrap().len(), 4);
        assert_eq!(mesh.entity_count(2), 14);
        assert_eq!(mesh.revision(), revision);
        mesh.validate_invariants().unwrap();
    }

    #[test]
    fn refine_twice_is_rejected() {
        let mut mesh = unit_square_quads();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();
        assert_eq!(
            mesh.refine(cell, &mut NoopObserver),
            Err(MeshIndexError::NotRefinable(cell))
        );
    }

    #[test]
    fn coarsen_requires_leaf_children() {
        let mut mesh = unit_square_quads();
        let cell = mesh.entities(0).next().unwrap();
        assert_eq!(
            mesh.coarsen(cell, &mut NoopObserver),
            Err(MeshIndexError::NotCoarsenable(cell))
        );
        mesh.refine(cell, &mut NoopObserver).unwrap();
        let child = mesh.children(cell).unwrap()[0];
        mesh.refine(child, &mut NoopObserver).unwrap();
        assert_eq!(
            mesh.coarsen(cell, &mut NoopObserver),
            Err(MeshIndexError::NotCoarsenable(cell))
        );
    }

    #[test]
    fn midpoint_coordinates_are_averaged() {
        let mut mesh = unit_square_quads();
        let cell = mesh.entities(0).next().unwrap();
        let patch = mesh.refine(cell, &mut NoopObserver).unwrap();
        let center = *patch.codim(2).last().unwrap();
        assert_eq!(mesh.vertex_coordinates(center).unwrap(), &[0.5, 0.5]);
    }

    #[test]
    fn sub_entities_follow_reference_numbering() {
        let mesh = unit_square_quads();
        let cell = mesh.entities(0).next().unwrap();
        assert_eq!(mesh.sub_entity_count(cell, 1).unwrap(), 4);
        let v0 = mesh.sub_entity(cell, 0, 2).unwrap();
        assert_eq!(mesh.vertex_coordinates(v0).unwrap(), &[0.0, 0.0]);
        let e0 = mesh.sub_entity(cell, 0, 1).unwrap();
        let corners = mesh.corners(e0).unwrap();
        assert_eq!(corners[0], v0);
        assert!(matches!(
            mesh.sub_entity(cell, 4, 1),
            Err(MeshIndexError::InvalidSubEntity { local: 4, count: 4, .. })
        ));
        assert_eq!(mesh.sub_entity(cell, 0, 0).unwrap(), cell);
    }
}
