//! Core backend abstraction trait
//!
//! Every GL object wrapper in this crate talks to the driver through [`GraphicsBackend`].
//! Methods are named after the GL entry points they forward to and take the object they
//! operate on explicitly, so implementations decide how binding state is managed.

use crate::backend::types::*;
use crate::error::GraphicsResult;
use std::num::NonZeroU32;
use std::ptr::NonNull;

/// Handle to a buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) NonZeroU32);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub(crate) NonZeroU32);

/// Handle to a texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) NonZeroU32);

/// Handle to a renderbuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderBufferHandle(pub(crate) NonZeroU32);

/// Handle to a framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameBufferHandle(pub(crate) NonZeroU32);

/// Handle to a shader stage object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) NonZeroU32);

/// Handle to a linked program object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) NonZeroU32);

/// Location of an active uniform within a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub(crate) u32);

/// Driver seam implemented by [`GlowBackend`](crate::backend::GlowBackend) and
/// [`HeadlessBackend`](crate::backend::HeadlessBackend).
///
/// All calls are synchronous and must happen on the thread owning the context.
pub trait GraphicsBackend {
    /// Get the backend name
    fn name(&self) -> &'static str;

    // === Buffers ===

    fn create_buffer(&self) -> GraphicsResult<BufferHandle>;
    fn delete_buffer(&self, buffer: BufferHandle);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    fn bind_buffer_base(&self, target: BufferTarget, index: u32, buffer: Option<BufferHandle>);

    /// Replace the data store with `data`, reallocating it.
    fn buffer_data(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        data: &[u8],
        usage: BufferUsage,
    ) -> GraphicsResult<()>;

    /// Reallocate the data store to `size` bytes with undefined contents.
    fn buffer_storage(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        size: usize,
        usage: BufferUsage,
    ) -> GraphicsResult<()>;

    fn buffer_sub_data(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        offset: usize,
        data: &[u8],
    ) -> GraphicsResult<()>;

    /// Map `len` bytes starting at `offset`. Only one mapping per buffer may be live.
    fn map_buffer_range(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        offset: usize,
        len: usize,
        access: MapAccess,
    ) -> GraphicsResult<NonNull<u8>>;

    fn unmap_buffer(&self, target: BufferTarget, buffer: BufferHandle) -> GraphicsResult<()>;

    // === Vertex arrays ===

    fn create_vertex_array(&self) -> GraphicsResult<VertexArrayHandle>;
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    fn enable_vertex_attribute(&self, vertex_array: VertexArrayHandle, index: u32);
    fn disable_vertex_attribute(&self, vertex_array: VertexArrayHandle, index: u32);
    fn vertex_attribute_pointer(
        &self,
        vertex_array: VertexArrayHandle,
        buffer: BufferHandle,
        pointer: &AttribPointer,
    );

    // === Textures ===

    fn create_texture(&self) -> GraphicsResult<TextureHandle>;
    fn delete_texture(&self, texture: TextureHandle);
    /// Bind to `GL_TEXTURE_2D`, first activating texture unit `slot` when given.
    fn bind_texture(&self, slot: Option<u32>, texture: Option<TextureHandle>);
    fn texture_image_2d(
        &self,
        texture: TextureHandle,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> GraphicsResult<()>;
    fn texture_filter(&self, texture: TextureHandle, min: FilterMode, mag: FilterMode);
    fn texture_wrap(&self, texture: TextureHandle, wrap: WrapMode);

    // === Renderbuffers ===

    fn create_render_buffer(&self) -> GraphicsResult<RenderBufferHandle>;
    fn delete_render_buffer(&self, render_buffer: RenderBufferHandle);
    /// Allocate storage; `samples == 0` selects single-sampled storage.
    fn render_buffer_storage(
        &self,
        render_buffer: RenderBufferHandle,
        format: TextureFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> GraphicsResult<()>;

    // === Framebuffers ===

    fn create_frame_buffer(&self) -> GraphicsResult<FrameBufferHandle>;
    fn delete_frame_buffer(&self, frame_buffer: FrameBufferHandle);
    fn bind_frame_buffer(&self, frame_buffer: Option<FrameBufferHandle>);
    fn frame_buffer_texture(
        &self,
        frame_buffer: FrameBufferHandle,
        point: AttachmentPoint,
        texture: TextureHandle,
        level: u32,
    );
    fn frame_buffer_render_buffer(
        &self,
        frame_buffer: FrameBufferHandle,
        point: AttachmentPoint,
        render_buffer: RenderBufferHandle,
    );
    fn frame_buffer_status(&self, frame_buffer: FrameBufferHandle) -> FramebufferStatus;

    // === Shaders ===

    fn create_shader(&self, stage: ShaderStage) -> GraphicsResult<ShaderHandle>;
    fn delete_shader(&self, shader: ShaderHandle);
    /// Upload the source and compile it, returning the compile status.
    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn create_program(&self) -> GraphicsResult<ProgramHandle>;
    fn delete_program(&self, program: ProgramHandle);
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Link the program, returning the link status.
    fn link_program(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn use_program(&self, program: Option<ProgramHandle>);
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, program: ProgramHandle, location: UniformLocation, value: &UniformValue);

    // === Drawing ===

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: ClearMask);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn draw_arrays(&self, mode: PrimitiveMode, first: u32, count: u32);
    /// Draw `count` `u32` indices from the bound element buffer, starting at byte `offset`.
    fn draw_elements(&self, mode: PrimitiveMode, count: u32, offset: usize);
    fn draw_elements_instanced(
        &self,
        mode: PrimitiveMode,
        count: u32,
        offset: usize,
        instances: u32,
    );
}
