use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_store::prelude::*;
use mesh_store::topology::adjacency::coboundary_of;

/// Structured `n x n` quad grid split into triangles.
fn build_grid(n: usize) -> (Mesh, Vec<Handle>) {
    let mut mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
    let v: Vec<Handle> = (0..(n + 1) * (n + 1)).map(|_| mesh.insert_vertex(())).collect();
    let at = |i: usize, j: usize| v[i * (n + 1) + j];
    for i in 0..n {
        for j in 0..n {
            mesh.insert_element(ElementType::Triangle, [at(i, j), at(i + 1, j), at(i, j + 1)]);
            mesh.insert_element(ElementType::Triangle, [at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
        }
    }
    (mesh, v)
}

fn bench_adjacency_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjacency_cache");

    for &n in &[16usize, 64usize] {
        let (mut mesh, v) = build_grid(n);
        let centre = v[v.len() / 2];

        group.bench_with_input(BenchmarkId::new("coboundary_no_cache", n), &n, |b, _| {
            b.iter(|| {
                let out = coboundary_of(mesh.collection(), centre, ElementType::Triangle);
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("coboundary_cached", n), &n, |b, _| {
            b.iter(|| {
                let out = mesh.coboundary(centre, ElementType::Triangle).len();
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("coboundary_random_vertices", n), &n, |b, _| {
            let mut rng = SmallRng::seed_from_u64(42);
            b.iter(|| {
                let vertex = v[rng.gen_range(0..v.len())];
                black_box(mesh.coboundary(vertex, ElementType::Line).len());
            });
        });

        group.bench_with_input(BenchmarkId::new("neighbours_cached", n), &n, |b, _| {
            let cell = mesh.collection().get(ElementType::Triangle).handle_at(0);
            b.iter(|| {
                if let Some(cell) = cell {
                    black_box(mesh.neighbours(cell, ElementType::Line).len());
                }
            });
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_cascade");
    for &n in &[16usize, 32usize] {
        group.bench_with_input(BenchmarkId::new("triangle_grid", n), &n, |b, &n| {
            b.iter(|| black_box(build_grid(n).0.len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_adjacency_cache, bench_insert);
criterion_main!(benches);
