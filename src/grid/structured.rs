//! Structured macro meshes over unit boxes.

use crate::grid::factory::{GridFactory, HierarchicalGridFactory};
use crate::mesh_error::MeshIndexError;
use crate::topology::geometry_type::GeometryType;
use crate::topology::hierarchical_mesh::HierarchicalMesh;

fn positive(counts: &[usize]) -> Result<(), MeshIndexError> {
    if counts.iter().any(|&n| n == 0) {
        return Err(MeshIndexError::EmptyGrid);
    }
    Ok(())
}

fn lattice_2d(factory: &mut HierarchicalGridFactory, nx: usize, ny: usize) -> Result<(), MeshIndexError> {
    let (dx, dy) = (1.0 / nx as f64, 1.0 / ny as f64);
    for j in 0..=ny {
        for i in 0..=nx {
            factory.insert_vertex(&[dx * i as f64, dy * j as f64])?;
        }
    }
    Ok(())
}

fn lattice_3d(
    factory: &mut HierarchicalGridFactory,
    nx: usize,
    ny: usize,
    nz: usize,
) -> Result<(), MeshIndexError> {
    let (dx, dy, dz) = (1.0 / nx as f64, 1.0 / ny as f64, 1.0 / nz as f64);
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                factory.insert_vertex(&[dx * i as f64, dy * j as f64, dz * k as f64])?;
            }
        }
    }
    Ok(())
}

/// Corners of box cell `(i, j, k)` in hexahedron reference order.
fn box_corners(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> [usize; 8] {
    let row = nx + 1;
    let slab = row * (ny + 1);
    let v0 = k * slab + j * row + i;
    let v1 = v0 + 1;
    let v3 = v0 + row;
    let v2 = v3 + 1;
    let v4 = v0 + slab;
    let v5 = v4 + 1;
    let v7 = v4 + row;
    let v6 = v7 + 1;
    [v0, v1, v2, v3, v4, v5, v6, v7]
}

/// `n` line cells on `[0, 1]`.
pub fn unit_interval(n: usize) -> Result<HierarchicalMesh, MeshIndexError> {
    positive(&[n])?;
    let mut f = HierarchicalGridFactory::new();
    for i in 0..=n {
        f.insert_vertex(&[i as f64 / n as f64])?;
    }
    for i in 0..n {
        f.insert_element(GeometryType::Line, &[i, i + 1])?;
    }
    f.finalize()
}

/// `nx * ny` quadrilaterals on the unit square, row by row.
pub fn structured_quads(nx: usize, ny: usize) -> Result<HierarchicalMesh, MeshIndexError> {
    positive(&[nx, ny])?;
    let mut f = HierarchicalGridFactory::new();
    lattice_2d(&mut f, nx, ny)?;
    for j in 0..ny {
        for i in 0..nx {
            let [v0, v1, v2, v3, ..] = box_corners(i, j, 0, nx, ny);
            f.insert_element(GeometryType::Quadrilateral, &[v0, v1, v2, v3])?;
        }
    }
    f.finalize()
}

/// `2 * nx * ny` triangles on the unit square (each square cut along its
/// diagonal).
pub fn structured_triangles(nx: usize, ny: usize) -> Result<HierarchicalMesh, MeshIndexError> {
    positive(&[nx, ny])?;
    let mut f = HierarchicalGridFactory::new();
    lattice_2d(&mut f, nx, ny)?;
    for j in 0..ny {
        for i in 0..nx {
            let [v0, v1, v2, v3, ..] = box_corners(i, j, 0, nx, ny);
            f.insert_element(GeometryType::Triangle, &[v0, v1, v2])?;
            f.insert_element(GeometryType::Triangle, &[v0, v2, v3])?;
        }
    }
    f.finalize()
}

/// `nx * ny * nz` hexahedra on the unit cube.
pub fn structured_hexes(nx: usize, ny: usize, nz: usize) -> Result<HierarchicalMesh, MeshIndexError> {
    positive(&[nx, ny, nz])?;
    let mut f = HierarchicalGridFactory::new();
    lattice_3d(&mut f, nx, ny, nz)?;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                f.insert_element(GeometryType::Hexahedron, &box_corners(i, j, k, nx, ny))?;
            }
        }
    }
    f.finalize()
}

/// Kuhn split of every box cell into six tetrahedra sharing the main
/// diagonal `v0-v6`.
pub fn structured_tetrahedra(nx: usize, ny: usize, nz: usize) -> Result<HierarchicalMesh, MeshIndexError> {
    const KUHN: [[usize; 4]; 6] = [
        [0, 1, 2, 6],
        [0, 2, 3, 6],
        [0, 3, 7, 6],
        [0, 7, 4, 6],
        [0, 4, 5, 6],
        [0, 5, 1, 6],
    ];
    positive(&[nx, ny, nz])?;
    let mut f = HierarchicalGridFactory::new();
    lattice_3d(&mut f, nx, ny, nz)?;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let c = box_corners(i, j, k, nx, ny);
                for tet in KUHN {
                    f.insert_element(GeometryType::Tetrahedron, &tet.map(|l| c[l]))?;
                }
            }
        }
    }
    f.finalize()
}

/// The reference tetrahedron.
pub fn single_tetrahedron() -> Result<HierarchicalMesh, MeshIndexError> {
    let mut f = HierarchicalGridFactory::new();
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
        f.insert_vertex(&p)?;
    }
    f.insert_element(GeometryType::Tetrahedron, &[0, 1, 2, 3])?;
    f.finalize()
}
