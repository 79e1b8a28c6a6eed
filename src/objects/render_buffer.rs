use crate::backend::{GraphicsBackend, RenderBufferHandle, TextureFormat};
use crate::error::{GraphicsError, GraphicsResult};
use crate::objects::TextureDimensions;
use std::rc::Rc;

/// An owned renderbuffer, typically a depth/stencil target.
pub struct RenderBuffer {
    backend: Rc<dyn GraphicsBackend>,
    handle: Option<RenderBufferHandle>,
    format: TextureFormat,
    samples: u32,
    dimensions: TextureDimensions,
}

impl RenderBuffer {
    pub fn new(
        backend: &Rc<dyn GraphicsBackend>,
        format: TextureFormat,
        dimensions: TextureDimensions,
    ) -> GraphicsResult<Self> {
        Self::multisampled(backend, format, 0, dimensions)
    }

    /// Allocate multisampled storage; `samples == 0` is single-sampled.
    pub fn multisampled(
        backend: &Rc<dyn GraphicsBackend>,
        format: TextureFormat,
        samples: u32,
        dimensions: TextureDimensions,
    ) -> GraphicsResult<Self> {
        let handle = backend.create_render_buffer()?;
        let render_buffer = Self {
            backend: Rc::clone(backend),
            handle: Some(handle),
            format,
            samples,
            dimensions,
        };
        backend.render_buffer_storage(
            handle,
            format,
            samples,
            dimensions.width(),
            dimensions.height(),
        )?;
        Ok(render_buffer)
    }

    pub fn handle(&self) -> GraphicsResult<RenderBufferHandle> {
        self.handle.ok_or(GraphicsError::Closed("renderbuffer"))
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn dimensions(&self) -> TextureDimensions {
        self.dimensions
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.delete_render_buffer(handle);
        }
    }
}

impl Drop for RenderBuffer {
    fn drop(&mut self) {
        self.close();
    }
}
