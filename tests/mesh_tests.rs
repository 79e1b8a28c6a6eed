mod common;

use common::{
    empty_mesh, headless, mesh, read_indices, read_vertices, Storage, QUAD_INDICES, QUAD_VERTICES,
};
use nebula_graphics::{GraphicsError, HostBuffer, MeshStorage, NativeMesh, ReadPolicy};
use rstest::rstest;

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_streams_round_trip(#[case] storage: Storage) {
    let (_, backend) = headless();
    let quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    assert_eq!(quad.vertices_len(), 12);
    assert_eq!(quad.indices_len(), 6);
    assert_eq!(read_vertices(&quad), QUAD_VERTICES);
    assert_eq!(read_indices(&quad), QUAD_INDICES);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_new_mesh_is_empty(#[case] storage: Storage) {
    let (_, backend) = headless();
    let mesh = empty_mesh(storage, &backend);

    assert_eq!(mesh.vertices_len(), 0);
    assert_eq!(mesh.indices_len(), 0);
    assert!(read_vertices(&mesh).is_empty());
    assert!(read_indices(&mesh).is_empty());
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_replacing_with_different_length(#[case] storage: Storage) {
    let (_, backend) = headless();
    let mut quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    quad.set_indices(HostBuffer::from_slice(&[2, 1, 0])).unwrap();
    assert_eq!(quad.indices_len(), 3);
    assert_eq!(read_indices(&quad), [2, 1, 0]);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_range_view(#[case] storage: Storage) {
    let (_, backend) = headless();
    let quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let view = quad.indices_range(3, 3, ReadPolicy::Read).unwrap();
    assert_eq!(view.data(), &[0, 2, 3]);
    view.release().unwrap();
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_range_past_end_is_rejected(#[case] storage: Storage) {
    let (_, backend) = headless();
    let quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let result = quad.vertices_range(10, 4, ReadPolicy::Read);
    assert!(matches!(
        result,
        Err(GraphicsError::OutOfBounds { offset: 10, len: 4, size: 12 })
    ));
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_writable_view_updates_mesh(#[case] storage: Storage) {
    let (_, backend) = headless();
    let quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let mut view = quad.vertices(ReadPolicy::ReadWrite).unwrap();
    view.data_mut().unwrap()[0] = 7.0;
    view.release().unwrap();

    assert_eq!(read_vertices(&quad)[0], 7.0);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_read_view_refuses_writes(#[case] storage: Storage) {
    let (_, backend) = headless();
    let quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let mut view = quad.indices(ReadPolicy::Read).unwrap();
    assert!(matches!(view.data_mut(), Err(GraphicsError::ReadOnlyView)));
    view.release().unwrap();
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_update_overwrites_part(#[case] storage: Storage) {
    let (_, backend) = headless();
    let mut quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    quad.update_indices(4, &[3, 0]).unwrap();
    assert_eq!(read_indices(&quad), [0, 1, 2, 0, 3, 0]);
    assert!(matches!(
        quad.update_indices(5, &[1, 1]),
        Err(GraphicsError::OutOfBounds { .. })
    ));
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_managed_buffers_are_rejected(#[case] storage: Storage) {
    let (_, backend) = headless();
    let mut quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let result = quad.set_vertices(HostBuffer::wrap(vec![0.0; 3]));
    assert!(matches!(result, Err(GraphicsError::IndirectBuffer)));
    assert_eq!(read_vertices(&quad), QUAD_VERTICES);
}

#[rstest]
#[case::gpu(Storage::Gpu)]
#[case::native(Storage::Native)]
fn test_close_is_idempotent(#[case] storage: Storage) {
    let (headless, backend) = headless();
    let mut quad = mesh(storage, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    quad.close();
    quad.close();
    assert!(quad.is_closed());
    assert!(matches!(
        quad.vertices(ReadPolicy::Read),
        Err(GraphicsError::Closed(_))
    ));
    drop(quad);
    assert_eq!(headless.live_buffers(), 0);
    assert_eq!(headless.stale_deletes(), 0);
}

#[test]
fn test_native_views_share_reads_and_exclude_writes() {
    let mesh = NativeMesh::with_data(
        HostBuffer::from_slice(&QUAD_VERTICES),
        HostBuffer::from_slice(&QUAD_INDICES),
    )
    .unwrap();

    let first = mesh.indices(ReadPolicy::Read).unwrap();
    let second = mesh.indices(ReadPolicy::Read).unwrap();
    assert_eq!(first.data(), second.data());
    assert!(matches!(
        mesh.indices(ReadPolicy::Write),
        Err(GraphicsError::ViewOutstanding)
    ));
    first.release().unwrap();
    second.release().unwrap();

    let writer = mesh.indices(ReadPolicy::Write).unwrap();
    assert!(matches!(
        mesh.indices(ReadPolicy::Read),
        Err(GraphicsError::ViewOutstanding)
    ));
    writer.release().unwrap();
}

#[test]
fn test_gpu_mesh_keeps_one_mapping_per_stream() {
    let (headless, backend) = headless();
    let quad = mesh(Storage::Gpu, &backend, &QUAD_VERTICES, &QUAD_INDICES);

    let vertices = quad.vertices(ReadPolicy::Read).unwrap();
    let indices = quad.indices(ReadPolicy::Read).unwrap();
    assert!(vertices.is_mapped() && indices.is_mapped());
    assert!(matches!(
        quad.indices(ReadPolicy::Read),
        Err(GraphicsError::MapFailed(_))
    ));
    vertices.release().unwrap();
    indices.release().unwrap();
    assert_eq!(headless.map_calls(), 3);
}
