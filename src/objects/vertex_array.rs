use crate::backend::{AttribPointer, BufferTarget, GraphicsBackend, VertexArrayHandle};
use crate::error::{GraphicsError, GraphicsResult};
use crate::objects::Buffer;
use std::rc::Rc;

/// An owned vertex array object.
pub struct VertexArray {
    backend: Rc<dyn GraphicsBackend>,
    handle: Option<VertexArrayHandle>,
}

impl VertexArray {
    pub fn new(backend: &Rc<dyn GraphicsBackend>) -> GraphicsResult<Self> {
        let handle = backend.create_vertex_array()?;
        Ok(Self {
            backend: Rc::clone(backend),
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> GraphicsResult<VertexArrayHandle> {
        self.handle.ok_or(GraphicsError::Closed("vertex array"))
    }

    pub fn bind(&self) -> GraphicsResult<()> {
        self.backend.bind_vertex_array(Some(self.handle()?));
        Ok(())
    }

    pub fn unbind(&self) {
        self.backend.bind_vertex_array(None);
    }

    pub fn enable_attribute(&self, index: u32) -> GraphicsResult<()> {
        self.backend.enable_vertex_attribute(self.handle()?, index);
        Ok(())
    }

    pub fn disable_attribute(&self, index: u32) -> GraphicsResult<()> {
        self.backend.disable_vertex_attribute(self.handle()?, index);
        Ok(())
    }

    /// Source attribute `pointer.index` from `buffer`.
    pub fn attribute_pointer(
        &self,
        buffer: &Buffer,
        pointer: &AttribPointer,
    ) -> GraphicsResult<()> {
        self.backend
            .vertex_attribute_pointer(self.handle()?, buffer.handle()?, pointer);
        Ok(())
    }

    /// Record `buffer` as this vertex array's element buffer.
    pub fn set_index_buffer(&self, buffer: &Buffer) -> GraphicsResult<()> {
        self.bind()?;
        self.backend
            .bind_buffer(BufferTarget::ElementArray, Some(buffer.handle()?));
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.delete_vertex_array(handle);
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.close();
    }
}
