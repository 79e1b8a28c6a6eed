use crate::error::{GraphicsError, GraphicsResult};
use crate::memory::{require_direct, HostBuffer};
use crate::mesh::{check_range, MeshStorage, MeshView, ReadPolicy};
use bytemuck::Pod;
use std::cell::{Ref, RefCell, RefMut};

/// Mesh whose streams live in host memory.
///
/// Views borrow the stored buffers directly, so opening one is free and releasing it does
/// nothing. Any number of read views may be open at once; a writable view is exclusive.
#[derive(Debug, Default)]
pub struct NativeMesh {
    vertices: RefCell<HostBuffer<f32>>,
    indices: RefCell<HostBuffer<u32>>,
    // Kept outside the cells so lengths stay readable while a writable view is open.
    vertices_len: usize,
    indices_len: usize,
    closed: bool,
}

impl NativeMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(vertices: HostBuffer<f32>, indices: HostBuffer<u32>) -> GraphicsResult<Self> {
        require_direct(&vertices)?;
        require_direct(&indices)?;
        Ok(Self {
            vertices_len: vertices.len(),
            indices_len: indices.len(),
            vertices: RefCell::new(vertices),
            indices: RefCell::new(indices),
            closed: false,
        })
    }

    fn check_open(&self) -> GraphicsResult<()> {
        if self.closed {
            Err(GraphicsError::Closed("mesh"))
        } else {
            Ok(())
        }
    }
}

fn open_view<T: Pod>(
    cell: &RefCell<HostBuffer<T>>,
    offset: usize,
    len: usize,
    policy: ReadPolicy,
) -> GraphicsResult<MeshView<'_, T>> {
    let range = offset..offset + len;
    if policy.is_writable() {
        let data = cell
            .try_borrow_mut()
            .map_err(|_| GraphicsError::ViewOutstanding)?;
        Ok(MeshView::exclusive(
            policy,
            RefMut::map(data, |d| &mut d.as_mut_slice()[range]),
        ))
    } else {
        let data = cell
            .try_borrow()
            .map_err(|_| GraphicsError::ViewOutstanding)?;
        Ok(MeshView::shared(
            policy,
            Ref::map(data, |d| &d.as_slice()[range]),
        ))
    }
}

fn replace_contents<T: Pod>(stored: &mut HostBuffer<T>, data: HostBuffer<T>) {
    if stored.len() == data.len() {
        stored.copy_from_slice(&data);
    } else {
        *stored = data;
    }
}

impl MeshStorage for NativeMesh {
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
        self.check_open()?;
        check_range(offset, len, self.vertices_len())?;
        open_view(&self.vertices, offset, len, policy)
    }

    fn indices_range(
        &self,
        offset: usize,
        len: usize,
        policy: ReadPolicy,
    ) -> GraphicsResult<MeshView<'_, u32>> {
        self.check_open()?;
        check_range(offset, len, self.indices_len())?;
        open_view(&self.indices, offset, len, policy)
    }

    fn set_vertices(&mut self, vertices: HostBuffer<f32>) -> GraphicsResult<()> {
        require_direct(&vertices)?;
        self.check_open()?;
        self.vertices_len = vertices.len();
        replace_contents(self.vertices.get_mut(), vertices);
        Ok(())
    }

    fn set_indices(&mut self, indices: HostBuffer<u32>) -> GraphicsResult<()> {
        require_direct(&indices)?;
        self.check_open()?;
        self.indices_len = indices.len();
        replace_contents(self.indices.get_mut(), indices);
        Ok(())
    }

    fn update_vertices(&mut self, offset: usize, data: &[f32]) -> GraphicsResult<()> {
        self.check_open()?;
        let stored = self.vertices.get_mut();
        check_range(offset, data.len(), stored.len())?;
        stored[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn update_indices(&mut self, offset: usize, data: &[u32]) -> GraphicsResult<()> {
        self.check_open()?;
        let stored = self.indices.get_mut();
        check_range(offset, data.len(), stored.len())?;
        stored[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            *self.vertices.get_mut() = HostBuffer::empty();
            *self.indices.get_mut() = HostBuffer::empty();
            self.vertices_len = 0;
            self.indices_len = 0;
            self.closed = true;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
