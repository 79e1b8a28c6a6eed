use crate::backend::{BufferTarget, BufferUsage, GraphicsBackend};
use crate::error::GraphicsResult;
use crate::memory::{require_direct, HostBuffer};
use crate::mesh::{check_range, MeshStorage, MeshView, ReadPolicy};
use crate::objects::Buffer;
use std::rc::Rc;

/// Mesh whose streams live in GL buffer objects.
///
/// Views map the requested range on demand and unmap when released.
#[derive(Debug)]
pub struct GpuMesh {
    vertices: Buffer,
    indices: Buffer,
    vertices_len: usize,
    indices_len: usize,
    usage: BufferUsage,
}

impl GpuMesh {
    /// Create an empty mesh.
    pub fn new(backend: &Rc<dyn GraphicsBackend>) -> GraphicsResult<Self> {
        Ok(Self {
            vertices: Buffer::new(backend, BufferTarget::Array)?,
            indices: Buffer::new(backend, BufferTarget::ElementArray)?,
            vertices_len: 0,
            indices_len: 0,
            usage: BufferUsage::DynamicDraw,
        })
    }

    pub fn with_data(
        backend: &Rc<dyn GraphicsBackend>,
        vertices: HostBuffer<f32>,
        indices: HostBuffer<u32>,
    ) -> GraphicsResult<Self> {
        let mut mesh = Self::new(backend)?;
        mesh.set_vertices(vertices)?;
        mesh.set_indices(indices)?;
        Ok(mesh)
    }

    /// Upload the contents of any other mesh.
    pub fn from_storage(
        backend: &Rc<dyn GraphicsBackend>,
        source: &(impl MeshStorage + ?Sized),
    ) -> GraphicsResult<Self> {
        let view = source.vertices(ReadPolicy::Read)?;
        let vertices = HostBuffer::from_slice(view.data());
        view.release()?;
        let view = source.indices(ReadPolicy::Read)?;
        let indices = HostBuffer::from_slice(view.data());
        view.release()?;
        Self::with_data(backend, vertices, indices)
    }

    pub fn vertex_buffer(&self) -> &Buffer {
        &self.vertices
    }

    pub fn index_buffer(&self) -> &Buffer {
        &self.indices
    }

    /// Usage hint applied when the streams are reallocated.
    pub fn set_usage(&mut self, usage: BufferUsage) {
        self.usage = usage;
    }
}

/// Reallocate `buffer` unless `data` fits the current store exactly.
fn replace_contents<T: bytemuck::Pod>(
    buffer: &mut Buffer,
    current_len: usize,
    data: &HostBuffer<T>,
    usage: BufferUsage,
) -> GraphicsResult<()> {
    if data.len() == current_len && !data.is_empty() {
        buffer.sub_data(0, data.as_slice())
    } else {
        buffer.data(data.as_slice(), usage)
    }
}

impl MeshStorage for GpuMesh {
    fn vertices_len(&self) -> usize {
        self.vertices_len
    }

    fn indices_len(&self) -> usize {
        self.indices_len
    }

    fn vertices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, f32>> {
        self.vertices.handle()?;
        check_range(offset, len, self.vertices_len)?;
        if len == 0 {
            return Ok(MeshView::empty(policy));
        }
        let range = self.vertices.map_range(offset, len, policy.map_access())?;
        Ok(MeshView::mapped(policy, range))
    }

    fn indices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, u32>> {
        self.indices.handle()?;
        check_range(offset, len, self.indices_len)?;
        if len == 0 {
            return Ok(MeshView::empty(policy));
        }
        let range = self.indices.map_range(offset, len, policy.map_access())?;
        Ok(MeshView::mapped(policy, range))
    }

    fn set_vertices(&mut self, vertices: HostBuffer<f32>) -> GraphicsResult<()> {
        require_direct(&vertices)?;
        replace_contents(&mut self.vertices, self.vertices_len, &vertices, self.usage)?;
        self.vertices_len = vertices.len();
        Ok(())
    }

    fn set_indices(&mut self, indices: HostBuffer<u32>) -> GraphicsResult<()> {
        require_direct(&indices)?;
        replace_contents(&mut self.indices, self.indices_len, &indices, self.usage)?;
        self.indices_len = indices.len();
        Ok(())
    }

    fn update_vertices(&mut self, offset: usize, data: &[f32]) -> GraphicsResult<()> {
        self.vertices.handle()?;
        check_range(offset, data.len(), self.vertices_len)?;
        self.vertices.sub_data(offset, data)
    }

    fn update_indices(&mut self, offset: usize, data: &[u32]) -> GraphicsResult<()> {
        self.indices.handle()?;
        check_range(offset, data.len(), self.indices_len)?;
        self.indices.sub_data(offset, data)
    }

    fn close(&mut self) {
        self.vertices.close();
        self.indices.close();
        self.vertices_len = 0;
        self.indices_len = 0;
    }

    fn is_closed(&self) -> bool {
        self.vertices.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::error::GraphicsError;

    fn setup() -> (Rc<HeadlessBackend>, Rc<dyn GraphicsBackend>) {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: Rc<dyn GraphicsBackend> = headless.clone();
        (headless, backend)
    }

    #[test]
    fn test_equal_length_set_overwrites_in_place() {
        let (headless, backend) = setup();
        let mut mesh = GpuMesh::new(&backend).unwrap();
        mesh.set_vertices(HostBuffer::from_slice(&[1.0, 2.0, 3.0]))
            .unwrap();
        let handle = mesh.vertex_buffer().handle().unwrap();

        mesh.set_vertices(HostBuffer::from_slice(&[4.0, 5.0, 6.0]))
            .unwrap();
        assert_eq!(mesh.vertex_buffer().handle().unwrap(), handle);
        assert_eq!(
            headless.buffer_contents::<f32>(handle),
            Some(vec![4.0, 5.0, 6.0])
        );
    }

    #[test]
    fn test_view_maps_and_unmaps() {
        let (headless, backend) = setup();
        let mesh = GpuMesh::with_data(
            &backend,
            HostBuffer::from_slice(&[0.0, 1.0]),
            HostBuffer::from_slice(&[0, 1]),
        )
        .unwrap();
        let handle = mesh.index_buffer().handle().unwrap();

        let view = mesh.indices(ReadPolicy::Read).unwrap();
        assert!(view.is_mapped());
        assert!(headless.is_mapped(handle));
        assert_eq!(view.data(), &[0, 1]);
        view.release().unwrap();
        assert!(!headless.is_mapped(handle));
    }

    #[test]
    fn test_bounds_checked_before_mapping() {
        let (headless, backend) = setup();
        let mesh = GpuMesh::with_data(
            &backend,
            HostBuffer::from_slice(&[0.0; 6]),
            HostBuffer::empty(),
        )
        .unwrap();

        let err = mesh.vertices_range(4, 3, ReadPolicy::Read).unwrap_err();
        assert!(matches!(err, GraphicsError::OutOfBounds { .. }));
        assert_eq!(headless.map_calls(), 0);
    }

    #[test]
    fn test_empty_view_skips_driver() {
        let (headless, backend) = setup();
        let mesh = GpuMesh::new(&backend).unwrap();
        let view = mesh.vertices(ReadPolicy::ReadWrite).unwrap();
        assert!(view.data().is_empty());
        view.release().unwrap();
        assert_eq!(headless.map_calls(), 0);
    }

    #[test]
    fn test_close_is_guarded() {
        let (headless, backend) = setup();
        let mut mesh = GpuMesh::new(&backend).unwrap();
        mesh.close();
        mesh.close();
        drop(mesh);

        assert_eq!(headless.live_buffers(), 0);
        assert_eq!(headless.stale_deletes(), 0);
    }

    #[test]
    fn test_closed_mesh_rejects_views() {
        let (_headless, backend) = setup();
        let mut mesh = GpuMesh::new(&backend).unwrap();
        mesh.close();
        assert!(matches!(
            mesh.vertices(ReadPolicy::Read),
            Err(GraphicsError::Closed("buffer"))
        ));
    }
}
