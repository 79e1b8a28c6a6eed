//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use nebula_graphics::{
    GpuMesh, GraphicsBackend, HeadlessBackend, HostBuffer, Mesh, MeshStorage, NativeMesh,
    ReadPolicy,
};
use std::rc::Rc;

/// Which mesh backend a test case runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Gpu,
    Native,
}

pub const QUAD_VERTICES: [f32; 12] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.5, 0.5, 0.0, //
    -0.5, 0.5, 0.0,
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub fn headless() -> (Rc<HeadlessBackend>, Rc<dyn GraphicsBackend>) {
    let headless = Rc::new(HeadlessBackend::new());
    let backend: Rc<dyn GraphicsBackend> = headless.clone();
    (headless, backend)
}

pub fn empty_mesh(storage: Storage, backend: &Rc<dyn GraphicsBackend>) -> Mesh {
    match storage {
        Storage::Gpu => GpuMesh::new(backend).unwrap().into(),
        Storage::Native => NativeMesh::new().into(),
    }
}

pub fn mesh(
    storage: Storage,
    backend: &Rc<dyn GraphicsBackend>,
    vertices: &[f32],
    indices: &[u32],
) -> Mesh {
    let mut mesh = empty_mesh(storage, backend);
    mesh.set_vertices(HostBuffer::from_slice(vertices)).unwrap();
    mesh.set_indices(HostBuffer::from_slice(indices)).unwrap();
    mesh
}

pub fn read_vertices(mesh: &impl MeshStorage) -> Vec<f32> {
    let view = mesh.vertices(ReadPolicy::Read).unwrap();
    let data = view.data().to_vec();
    view.release().unwrap();
    data
}

pub fn read_indices(mesh: &impl MeshStorage) -> Vec<u32> {
    let view = mesh.indices(ReadPolicy::Read).unwrap();
    let data = view.data().to_vec();
    view.release().unwrap();
    data
}
