mod common;

use common::{
    empty_mesh, headless, mesh, read_indices, read_vertices, Storage, QUAD_INDICES, QUAD_VERTICES,
};
use nebula_graphics::{
    batch_meshes, concatenate_into, GraphicsError, Mesh, MeshStorage, NativeMesh,
};
use rstest::rstest;
use std::error::Error;

#[rstest]
fn test_offsets_by_highest_index(
    #[values(Storage::Gpu, Storage::Native)] destination: Storage,
    #[values(Storage::Gpu, Storage::Native)] sources: Storage,
) {
    let (_, backend) = headless();
    let stream = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let first = mesh(sources, &backend, &stream, &[0, 1, 2, 3, 4, 5]);
    let second = mesh(sources, &backend, &stream, &[0, 1, 2, 3, 4, 5]);
    let mut merged = empty_mesh(destination, &backend);

    concatenate_into(&mut merged, &[&first, &second]).unwrap();

    assert_eq!(
        read_vertices(&merged),
        [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
    );
    assert_eq!(read_indices(&merged), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_two_quads(#[case] storage: Storage) {
    let (_, backend) = headless();
    let left = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);
    let right = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let merged = batch_meshes(&[&left, &right]).unwrap();

    assert_eq!(merged.vertices_len(), 24);
    assert_eq!(read_indices(&merged), [0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_lengths_are_summed(#[case] storage: Storage) {
    let (_, backend) = headless();
    let sources: Vec<Mesh> = (1..=4)
        .map(|n| {
            let indices: Vec<u32> = (0..n).collect();
            mesh(storage, &backend, &vec![0.5; n as usize * 3], &indices)
        })
        .collect();
    let refs: Vec<&Mesh> = sources.iter().collect();

    let merged = batch_meshes(&refs).unwrap();

    assert_eq!(merged.vertices_len(), 30);
    assert_eq!(merged.indices_len(), 10);
    assert_eq!(read_indices(&merged), (0..10).collect::<Vec<u32>>());
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_sources_are_left_untouched(#[case] storage: Storage) {
    let (headless, backend) = headless();
    let first = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);
    let second = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    batch_meshes(&[&first, &second]).unwrap();

    assert_eq!(read_indices(&second), QUAD_INDICES);
    assert_eq!(read_vertices(&first), QUAD_VERTICES);
    if storage == Storage::Gpu {
        assert_eq!(headless.live_buffers(), 4);
    }
}

#[test]
fn test_zero_sources_give_empty_mesh() {
    let sources: [&NativeMesh; 0] = [];
    let merged = batch_meshes(&sources).unwrap();
    assert_eq!(merged.vertices_len(), 0);
    assert_eq!(merged.indices_len(), 0);
}

#[test]
fn test_source_without_indices_adds_no_offset() {
    let (_, backend) = headless();
    let points = mesh(Storage::Native, &backend, &[1.0, 2.0, 3.0], &[]);
    let triangle = mesh(Storage::Gpu, &backend, &[0.0; 9], &[0, 1, 2]);
    let line = mesh(Storage::Native, &backend, &[0.0; 6], &[0, 1]);

    let merged = batch_meshes(&[&points, &triangle, &line]).unwrap();

    assert_eq!(merged.vertices_len(), 18);
    assert_eq!(read_indices(&merged), [0, 1, 2, 3, 4]);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_closed_source_reports_its_position(#[case] storage: Storage) {
    let (_, backend) = headless();
    let open = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);
    let mut closed = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);
    closed.close();
    let mut destination = NativeMesh::with_data(
        nebula_graphics::HostBuffer::from_slice(&[9.0]),
        nebula_graphics::HostBuffer::from_slice(&[9]),
    )
    .unwrap();

    let err = concatenate_into(&mut destination, &[&open, &closed]).unwrap_err();

    assert!(matches!(err, GraphicsError::BatchSource { index: 1, .. }));
    assert!(err.source().is_some());
    assert_eq!(read_indices(&destination), [9]);
}

#[test]
fn test_index_overflow_is_an_error() {
    let (_, backend) = headless();
    let large = mesh(Storage::Native, &backend, &[0.0; 3], &[0, u32::MAX - 1]);
    let small = mesh(Storage::Native, &backend, &[0.0; 3], &[5]);

    let err = batch_meshes(&[&large, &small]).unwrap_err();
    assert!(matches!(
        err,
        GraphicsError::IndexOverflow { index: 5, offset } if offset == u64::from(u32::MAX)
    ));
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_indices_reaching_u32_max_are_accepted(#[case] storage: Storage) {
    let (_, backend) = headless();
    let single = mesh(storage, &backend, &[0.0; 3], &[0, u32::MAX]);
    let merged = batch_meshes(&[&single]).unwrap();
    assert_eq!(read_indices(&merged), [0, u32::MAX]);

    let lower = mesh(storage, &backend, &[0.0; 3], &[0, 1 << 31]);
    let upper = mesh(storage, &backend, &[0.0; 3], &[0, (1 << 31) - 2]);
    let merged = batch_meshes(&[&lower, &upper]).unwrap();
    assert_eq!(
        read_indices(&merged),
        [0, 1 << 31, (1 << 31) + 1, u32::MAX]
    );
}
