#![allow(dead_code)]
use mesh_index::grid::Grid;
use mesh_index::grid::structured::structured_quads;
use mesh_index::index_set::{IndexSet, IndexSetOptions};
use mesh_index::topology::{Entity, HierarchicalMesh, MeshStorage};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;

pub fn rng() -> SmallRng {
    SmallRng::seed_from_u64(0xDEADBEEF)
}

/// Options with slot poisoning on, independent of the build profile.
pub fn strict_options() -> IndexSetOptions {
    IndexSetOptions {
        poison_freed_slots: true,
        ..IndexSetOptions::default()
    }
}

pub fn quad_grid(nx: usize, ny: usize) -> Grid<HierarchicalMesh> {
    Grid::new(structured_quads(nx, ny).unwrap(), strict_options()).unwrap()
}

pub fn cells(grid: &Grid<HierarchicalMesh>) -> Vec<Entity> {
    grid.mesh().entities(0).collect()
}

/// Index of every entity of `codim` the set contains, in discovery order.
pub fn indices_of<S: IndexSet>(set: &S, mesh: &HierarchicalMesh, codim: usize) -> Vec<usize> {
    mesh.entities(codim)
        .filter(|&e| set.contains(e))
        .map(|e| set.index(e).unwrap())
        .collect()
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

/// Fresh base path under the system temp dir; files land at `<base>.cd<c>`.
pub fn temp_base(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mesh-index-{}-{}", name, std::process::id()))
}

pub fn remove_dump(base: &std::path::Path, dimension: usize) {
    for codim in 0..=dimension {
        let _ = std::fs::remove_file(mesh_index::io::codim_path(base, codim));
    }
}
