//! Mesh storage
//!
//! A mesh is a flat `f32` vertex stream plus a `u32` index stream. Two backends implement the
//! [`MeshStorage`] contract: [`GpuMesh`] keeps both streams in GL buffer objects and hands out
//! mapped views, [`NativeMesh`] keeps them in host memory and hands out borrows. [`Mesh`] is
//! the closed set of both.

mod gpu;
mod native;
mod view;

pub use gpu::GpuMesh;
pub use native::NativeMesh;
pub use view::MeshView;

use crate::backend::MapAccess;
use crate::error::{GraphicsError, GraphicsResult};
use crate::memory::HostBuffer;

/// Access mode requested for a mesh view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadPolicy {
    Read,
    Write,
    ReadWrite,
}

impl ReadPolicy {
    /// Flags used when mapping GPU storage under this policy.
    pub fn map_access(self) -> MapAccess {
        match self {
            ReadPolicy::Read => MapAccess::READ,
            ReadPolicy::Write => MapAccess::WRITE,
            ReadPolicy::ReadWrite => MapAccess::READ_WRITE,
        }
    }

    pub fn is_readable(self) -> bool {
        matches!(self, ReadPolicy::Read | ReadPolicy::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, ReadPolicy::Write | ReadPolicy::ReadWrite)
    }
}

/// Contract shared by GPU- and host-resident meshes.
///
/// Views borrow the mesh, so every view is released before the mesh can be mutated or closed.
pub trait MeshStorage {
    fn vertices_len(&self) -> usize;

    fn indices_len(&self) -> usize;

    /// View `len` vertex components starting at `offset`.
    fn vertices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, f32>>;

    /// View `len` indices starting at `offset`.
    fn indices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, u32>>;

    fn vertices(&self, policy: ReadPolicy) -> GraphicsResult<MeshView<'_, f32>> {
        self.vertices_range(0, self.vertices_len(), policy)
    }

    fn indices(&self, policy: ReadPolicy) -> GraphicsResult<MeshView<'_, u32>> {
        self.indices_range(0, self.indices_len(), policy)
    }

    /// Replace the vertex stream. Equal-length replacements overwrite in place.
    fn set_vertices(&mut self, vertices: HostBuffer<f32>) -> GraphicsResult<()>;

    /// Replace the index stream. Equal-length replacements overwrite in place.
    fn set_indices(&mut self, indices: HostBuffer<u32>) -> GraphicsResult<()>;

    /// Overwrite vertex components starting at `offset`.
    fn update_vertices(&mut self, offset: usize, data: &[f32]) -> GraphicsResult<()>;

    /// Overwrite indices starting at `offset`.
    fn update_indices(&mut self, offset: usize, data: &[u32]) -> GraphicsResult<()>;

    /// Release all backing storage. Later calls are no-ops.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

pub(crate) fn check_range(offset: usize, len: usize, size: usize) -> GraphicsResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(GraphicsError::OutOfBounds { offset, len, size }),
    }
}

/// A mesh resident either on the GPU or in host memory.
#[derive(Debug)]
pub enum Mesh {
    Gpu(GpuMesh),
    Native(NativeMesh),
}

impl Mesh {
    pub fn is_gpu(&self) -> bool {
        matches!(self, Mesh::Gpu(_))
    }
}

impl From<GpuMesh> for Mesh {
    fn from(mesh: GpuMesh) -> Self {
        Mesh::Gpu(mesh)
    }
}

impl From<NativeMesh> for Mesh {
    fn from(mesh: NativeMesh) -> Self {
        Mesh::Native(mesh)
    }
}

impl MeshStorage for Mesh {
    fn vertices_len(&self) -> usize {
        match self {
            Mesh::Gpu(mesh) => mesh.vertices_len(),
            Mesh::Native(mesh) => mesh.vertices_len(),
        }
    }

    fn indices_len(&self) -> usize {
        match self {
            Mesh::Gpu(mesh) => mesh.indices_len(),
            Mesh::Native(mesh) => mesh.indices_len(),
        }
    }

    fn vertices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, f32>> {
        match self {
            Mesh::Gpu(mesh) => mesh.vertices_range(offset, len, policy),
            Mesh::Native(mesh) => mesh.vertices_range(offset, len, policy),
        }
    }

    fn indices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, u32>> {
        match self {
            Mesh::Gpu(mesh) => mesh.indices_range(offset, len, policy),
            Mesh::Native(mesh) => mesh.indices_range(offset, len, policy),
        }
    }

    fn set_vertices(&mut self, vertices: HostBuffer<f32>) -> GraphicsResult<()> {
        match self {
            Mesh::Gpu(mesh) => mesh.set_vertices(vertices),
            Mesh::Native(mesh) => mesh.set_vertices(vertices),
        }
    }

    fn set_indices(&mut self, indices: HostBuffer<u32>) -> GraphicsResult<()> {
        match self {
            Mesh::Gpu(mesh) => mesh.set_indices(indices),
            Mesh::Native(mesh) => mesh.set_indices(indices),
        }
    }

    fn update_vertices(&mut self, offset: usize, data: &[f32]) -> GraphicsResult<()> {
        match self {
            Mesh::Gpu(mesh) => mesh.update_vertices(offset, data),
            Mesh::Native(mesh) => mesh.update_vertices(offset, data),
        }
    }

    fn update_indices(&mut self, offset: usize, data: &[u32]) -> GraphicsResult<()> {
        match self {
            Mesh::Gpu(mesh) => mesh.update_indices(offset, data),
            Mesh::Native(mesh) => mesh.update_indices(offset, data),
        }
    }

    fn close(&mut self) {
        match self {
            Mesh::Gpu(mesh) => mesh.close(),
            Mesh::Native(mesh) => mesh.close(),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Mesh::Gpu(mesh) => mesh.is_closed(),
            Mesh::Native(mesh) => mesh.is_closed(),
        }
    }
}
