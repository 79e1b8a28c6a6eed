//! Framebuffer objects with owned attachments.

use crate::backend::{
    AttachmentPoint, FrameBufferHandle, FramebufferStatus, GraphicsBackend, TextureFormat,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::objects::{RenderBuffer, Texture, TextureConfig, TextureDimensions, TextureFilter};
use std::rc::Rc;

/// Image attached to a framebuffer.
pub enum FrameBufferAttachment {
    Texture(Texture),
    RenderBuffer(RenderBuffer),
}

impl From<Texture> for FrameBufferAttachment {
    fn from(texture: Texture) -> Self {
        FrameBufferAttachment::Texture(texture)
    }
}

impl From<RenderBuffer> for FrameBufferAttachment {
    fn from(render_buffer: RenderBuffer) -> Self {
        FrameBufferAttachment::RenderBuffer(render_buffer)
    }
}

/// An owned framebuffer object. Attached images are owned by the framebuffer and deleted
/// with it.
pub struct FrameBuffer {
    backend: Rc<dyn GraphicsBackend>,
    handle: Option<FrameBufferHandle>,
    attachments: Vec<(AttachmentPoint, FrameBufferAttachment)>,
}

impl FrameBuffer {
    pub fn new(backend: &Rc<dyn GraphicsBackend>) -> GraphicsResult<Self> {
        let handle = backend.create_frame_buffer()?;
        Ok(Self {
            backend: Rc::clone(backend),
            handle: Some(handle),
            attachments: Vec::new(),
        })
    }

    /// Colour texture at attachment 0 plus a depth24/stencil8 renderbuffer, checked complete.
    pub fn with_default_attachments(
        backend: &Rc<dyn GraphicsBackend>,
        dimensions: TextureDimensions,
    ) -> GraphicsResult<Self> {
        let mut frame_buffer = Self::new(backend)?;
        let color = Texture::new(
            backend,
            dimensions,
            TextureFilter::default(),
            TextureConfig::default(),
        )?;
        let depth = RenderBuffer::new(backend, TextureFormat::Depth24Stencil8, dimensions)?;
        frame_buffer.attach(AttachmentPoint::Color(0), color)?;
        frame_buffer.attach(AttachmentPoint::DepthStencil, depth)?;
        frame_buffer.complete()?;
        Ok(frame_buffer)
    }

    pub fn handle(&self) -> GraphicsResult<FrameBufferHandle> {
        self.handle.ok_or(GraphicsError::Closed("framebuffer"))
    }

    /// Attach an image at `point`, replacing and dropping any previous attachment there.
    pub fn attach(
        &mut self,
        point: AttachmentPoint,
        attachment: impl Into<FrameBufferAttachment>,
    ) -> GraphicsResult<()> {
        let handle = self.handle()?;
        let attachment = attachment.into();
        match &attachment {
            FrameBufferAttachment::Texture(texture) => {
                self.backend
                    .frame_buffer_texture(handle, point, texture.handle()?, 0)
            }
            FrameBufferAttachment::RenderBuffer(render_buffer) => {
                self.backend
                    .frame_buffer_render_buffer(handle, point, render_buffer.handle()?)
            }
        }
        self.backend.bind_frame_buffer(None);
        self.attachments.retain(|(p, _)| *p != point);
        self.attachments.push((point, attachment));
        Ok(())
    }

    pub fn attachment(&self, point: AttachmentPoint) -> Option<&FrameBufferAttachment> {
        self.attachments
            .iter()
            .find(|(p, _)| *p == point)
            .map(|(_, attachment)| attachment)
    }

    /// The texture attached at `point`, if it is a texture.
    pub fn texture(&self, point: AttachmentPoint) -> Option<&Texture> {
        match self.attachment(point)? {
            FrameBufferAttachment::Texture(texture) => Some(texture),
            FrameBufferAttachment::RenderBuffer(_) => None,
        }
    }

    pub fn status(&self) -> GraphicsResult<FramebufferStatus> {
        let status = self.backend.frame_buffer_status(self.handle()?);
        self.backend.bind_frame_buffer(None);
        Ok(status)
    }

    /// Fail with the driver status unless the framebuffer is complete.
    pub fn complete(&self) -> GraphicsResult<()> {
        let status = self.status()?;
        if status.is_complete() {
            Ok(())
        } else {
            Err(GraphicsError::FramebufferIncomplete(status))
        }
    }

    pub fn bind(&self) -> GraphicsResult<()> {
        self.backend.bind_frame_buffer(Some(self.handle()?));
        Ok(())
    }

    /// Bind the default framebuffer.
    pub fn unbind(&self) {
        self.backend.bind_frame_buffer(None);
    }

    /// Delete the framebuffer and its attachments.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.delete_frame_buffer(handle);
        }
        self.attachments.clear();
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn setup() -> (Rc<HeadlessBackend>, Rc<dyn GraphicsBackend>) {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: Rc<dyn GraphicsBackend> = headless.clone();
        (headless, backend)
    }

    #[test]
    fn test_default_attachments_complete() {
        let (headless, backend) = setup();
        let dimensions = TextureDimensions::new(64, 32).unwrap();
        let frame_buffer = FrameBuffer::with_default_attachments(&backend, dimensions).unwrap();

        assert!(frame_buffer.texture(AttachmentPoint::Color(0)).is_some());
        assert!(frame_buffer.texture(AttachmentPoint::DepthStencil).is_none());
        assert!(matches!(
            frame_buffer.attachment(AttachmentPoint::DepthStencil),
            Some(FrameBufferAttachment::RenderBuffer(rb)) if rb.samples() == 0
        ));

        drop(frame_buffer);
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn test_incomplete_reports_status() {
        let (_headless, backend) = setup();
        let frame_buffer = FrameBuffer::new(&backend).unwrap();
        let err = frame_buffer.complete().unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::FramebufferIncomplete(FramebufferStatus::MISSING_ATTACHMENT)
        ));
    }

    #[test]
    fn test_reattach_replaces() {
        let (headless, backend) = setup();
        let dimensions = TextureDimensions::new(8, 8).unwrap();
        let mut frame_buffer = FrameBuffer::new(&backend).unwrap();
        for _ in 0..2 {
            let depth = RenderBuffer::new(&backend, TextureFormat::Depth24, dimensions).unwrap();
            frame_buffer.attach(AttachmentPoint::Depth, depth).unwrap();
        }
        // framebuffer + one renderbuffer
        assert_eq!(headless.live_objects(), 2);
    }
}
