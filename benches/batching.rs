use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nebula_graphics::batch::{batch_index_buffers, batch_vertex_buffers};
use nebula_graphics::{
    batch_meshes, concatenate_into, GpuMesh, GraphicsBackend, HeadlessBackend, HostBuffer,
    NativeMesh,
};
use std::rc::Rc;

const QUAD_VERTICES: [f32; 12] = [
    -0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0,
];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

fn quads(count: usize) -> Vec<NativeMesh> {
    (0..count)
        .map(|_| {
            NativeMesh::with_data(
                HostBuffer::from_slice(&QUAD_VERTICES),
                HostBuffer::from_slice(&QUAD_INDICES),
            )
            .expect("quad buffers are direct")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Raw stream merging
// ---------------------------------------------------------------------------

fn bench_merge_streams(c: &mut Criterion) {
    let vertices: Vec<Vec<f32>> = (0..1000).map(|_| QUAD_VERTICES.to_vec()).collect();
    let indices: Vec<Vec<u32>> = (0..1000).map(|_| QUAD_INDICES.to_vec()).collect();

    c.bench_function("merge_vertex_streams_1000", |b| {
        b.iter(|| black_box(batch_vertex_buffers(black_box(&vertices))));
    });
    c.bench_function("merge_index_streams_1000", |b| {
        b.iter(|| black_box(batch_index_buffers(black_box(&indices))));
    });
}

// ---------------------------------------------------------------------------
// Mesh concatenation
// ---------------------------------------------------------------------------

fn bench_native_batch(c: &mut Criterion) {
    for count in [10, 100, 1000] {
        let meshes = quads(count);
        let sources: Vec<&NativeMesh> = meshes.iter().collect();
        c.bench_function(&format!("batch_native_quads_{count}"), |b| {
            b.iter(|| black_box(batch_meshes(black_box(&sources))));
        });
    }
}

fn bench_gpu_destination(c: &mut Criterion) {
    let backend: Rc<dyn GraphicsBackend> = Rc::new(HeadlessBackend::new());
    let meshes = quads(100);
    let sources: Vec<&NativeMesh> = meshes.iter().collect();
    let mut destination = GpuMesh::new(&backend).expect("headless buffers");

    c.bench_function("concatenate_into_headless_gpu_100", |b| {
        b.iter(|| {
            concatenate_into(&mut destination, black_box(&sources)).expect("batch");
        });
    });
}

criterion_group!(
    benches,
    bench_merge_streams,
    bench_native_batch,
    bench_gpu_destination,
);
criterion_main!(benches);
