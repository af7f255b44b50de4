use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_index::grid::Grid;
use mesh_index::grid::structured::structured_quads;
use mesh_index::index_set::{IndexSetOptions, LeafIndexSet};
use mesh_index::topology::{HierarchicalMesh, MeshStorage};

fn refined_grid(n: usize) -> Grid<HierarchicalMesh> {
    let mesh = structured_quads(n, n).expect("structured mesh");
    let mut grid = Grid::new(mesh, IndexSetOptions::default()).expect("grid");
    grid.global_refine(1).expect("refine");
    grid
}

fn bench_view_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_update");

    for &n in &[8usize, 32] {
        let mut grid = refined_grid(n);

        group.bench_with_input(BenchmarkId::new("grid_update", n), &n, |b, _| {
            b.iter(|| {
                grid.update().expect("update");
            });
        });

        let mut leaf = LeafIndexSet::new(grid.mesh()).expect("leaf view");
        group.bench_with_input(BenchmarkId::new("leaf_update", n), &n, |b, _| {
            b.iter(|| {
                leaf.update(grid.mesh()).expect("update");
                black_box(&leaf);
            });
        });

        group.bench_with_input(BenchmarkId::new("refine_coarsen_cycle", n), &n, |b, _| {
            let cell = grid.mesh().leaf_entities(0).next().expect("leaf cell");
            b.iter(|| {
                grid.refine(cell).expect("refine");
                grid.coarsen(cell).expect("coarsen");
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_view_update);
criterion_main!(benches);
