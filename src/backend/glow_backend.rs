//! OpenGL backend implemented on top of `glow`.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{GraphicsError, GraphicsResult};
use glow::HasContext;
use std::cell::Cell;
use std::ptr::NonNull;

/// OpenGL backend.
///
/// Buffer, texture and renderbuffer calls bind the object to its target before forwarding,
/// mirroring the bind-to-edit model of desktop GL before direct state access.
pub struct GlowBackend {
    gl: glow::Context,
    bound_program: Cell<Option<ProgramHandle>>,
    bound_vertex_array: Cell<Option<VertexArrayHandle>>,
}

impl GlowBackend {
    /// Wrap a loaded GL context.
    ///
    /// # Safety
    /// The context must be current on the calling thread for as long as this backend and any
    /// resource created through it are alive.
    pub unsafe fn new(gl: glow::Context) -> Self {
        let version = gl.get_parameter_string(glow::VERSION);
        let renderer = gl.get_parameter_string(glow::RENDERER);
        log::info!("OpenGL {version} on {renderer}");
        Self {
            gl,
            bound_program: Cell::new(None),
            bound_vertex_array: Cell::new(None),
        }
    }

    /// The underlying `glow` context, for calls this crate does not wrap.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn check_error(&self, what: &str) -> GraphicsResult<()> {
        let code = unsafe { self.gl.get_error() };
        if code == glow::NO_ERROR {
            Ok(())
        } else {
            Err(GraphicsError::InvalidOperation(format!(
                "{what}: GL error 0x{code:04X}"
            )))
        }
    }

    fn use_cached_program(&self, program: Option<ProgramHandle>) {
        if self.bound_program.get() != program {
            unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.0))) };
            self.bound_program.set(program);
        }
    }

    fn bind_cached_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        if self.bound_vertex_array.get() != vertex_array {
            unsafe {
                self.gl
                    .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0)))
            };
            self.bound_vertex_array.set(vertex_array);
        }
    }

    fn bind_texture_2d(&self, texture: TextureHandle) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)))
        };
    }
}

fn gl_int(value: usize, what: &str) -> GraphicsResult<i32> {
    i32::try_from(value)
        .map_err(|_| GraphicsError::InvalidOperation(format!("{what} {value} exceeds GLint range")))
}

fn creation_error(kind: &'static str) -> impl FnOnce(String) -> GraphicsError {
    move |message| GraphicsError::ResourceCreation { kind, message }
}

impl GraphicsBackend for GlowBackend {
    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn create_buffer(&self) -> GraphicsResult<BufferHandle> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(creation_error("buffer"))?;
        Ok(BufferHandle(buffer.0))
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) };
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer(target.to_gl(), buffer.map(|b| glow::NativeBuffer(b.0)))
        };
    }

    fn bind_buffer_base(&self, target: BufferTarget, index: u32, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer_base(target.to_gl(), index, buffer.map(|b| glow::NativeBuffer(b.0)))
        };
    }

    fn buffer_data(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        data: &[u8],
        usage: BufferUsage,
    ) -> GraphicsResult<()> {
        self.bind_buffer(target, Some(buffer));
        unsafe {
            self.gl
                .buffer_data_u8_slice(target.to_gl(), data, usage.to_gl())
        };
        self.check_error("glBufferData")
    }

    fn buffer_storage(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        size: usize,
        usage: BufferUsage,
    ) -> GraphicsResult<()> {
        let size = gl_int(size, "buffer size")?;
        self.bind_buffer(target, Some(buffer));
        unsafe { self.gl.buffer_data_size(target.to_gl(), size, usage.to_gl()) };
        self.check_error("glBufferData")
    }

    fn buffer_sub_data(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        offset: usize,
        data: &[u8],
    ) -> GraphicsResult<()> {
        let offset = gl_int(offset, "buffer offset")?;
        self.bind_buffer(target, Some(buffer));
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(target.to_gl(), offset, data)
        };
        self.check_error("glBufferSubData")
    }

    fn map_buffer_range(
        &self,
        target: BufferTarget,
        buffer: BufferHandle,
        offset: usize,
        len: usize,
        access: MapAccess,
    ) -> GraphicsResult<NonNull<u8>> {
        let offset = gl_int(offset, "map offset")?;
        let len = gl_int(len, "map length")?;
        self.bind_buffer(target, Some(buffer));
        let ptr = unsafe {
            self.gl
                .map_buffer_range(target.to_gl(), offset, len, access.bits())
        };
        match NonNull::new(ptr) {
            Some(ptr) => Ok(ptr),
            None => {
                let code = unsafe { self.gl.get_error() };
                Err(GraphicsError::MapFailed(format!(
                    "glMapBufferRange returned null (GL error 0x{code:04X})"
                )))
            }
        }
    }

    fn unmap_buffer(&self, target: BufferTarget, buffer: BufferHandle) -> GraphicsResult<()> {
        self.bind_buffer(target, Some(buffer));
        unsafe { self.gl.unmap_buffer(target.to_gl()) };
        self.check_error("glUnmapBuffer")
            .map_err(|e| GraphicsError::UnmapFailed(e.to_string()))
    }

    fn create_vertex_array(&self) -> GraphicsResult<VertexArrayHandle> {
        let vertex_array =
            unsafe { self.gl.create_vertex_array() }.map_err(creation_error("vertex array"))?;
        Ok(VertexArrayHandle(vertex_array.0))
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        if self.bound_vertex_array.get() == Some(vertex_array) {
            self.bound_vertex_array.set(None);
        }
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.0))
        };
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.bind_cached_vertex_array(vertex_array);
    }

    fn enable_vertex_attribute(&self, vertex_array: VertexArrayHandle, index: u32) {
        self.bind_cached_vertex_array(Some(vertex_array));
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attribute(&self, vertex_array: VertexArrayHandle, index: u32) {
        self.bind_cached_vertex_array(Some(vertex_array));
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn vertex_attribute_pointer(
        &self,
        vertex_array: VertexArrayHandle,
        buffer: BufferHandle,
        pointer: &AttribPointer,
    ) {
        self.bind_cached_vertex_array(Some(vertex_array));
        self.bind_buffer(BufferTarget::Array, Some(buffer));
        let size = pointer.components as i32;
        let stride = pointer.stride as i32;
        let offset = pointer.offset as i32;
        let data_type = pointer.kind.to_gl();
        unsafe {
            match pointer.kind {
                ScalarKind::Float | ScalarKind::Short => self.gl.vertex_attrib_pointer_f32(
                    pointer.index,
                    size,
                    data_type,
                    pointer.normalized,
                    stride,
                    offset,
                ),
                ScalarKind::Int | ScalarKind::Sampler => self
                    .gl
                    .vertex_attrib_pointer_i32(pointer.index, size, data_type, stride, offset),
                ScalarKind::Double => self
                    .gl
                    .vertex_attrib_pointer_f64(pointer.index, size, data_type, stride, offset),
            }
        }
    }

    fn create_texture(&self) -> GraphicsResult<TextureHandle> {
        let texture = unsafe { self.gl.create_texture() }.map_err(creation_error("texture"))?;
        Ok(TextureHandle(texture.0))
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) };
    }

    fn bind_texture(&self, slot: Option<u32>, texture: Option<TextureHandle>) {
        unsafe {
            if let Some(slot) = slot {
                self.gl.active_texture(glow::TEXTURE0 + slot);
            }
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
        }
    }

    fn texture_image_2d(
        &self,
        texture: TextureHandle,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> GraphicsResult<()> {
        let width = gl_int(desc.width as usize, "texture width")?;
        let height = gl_int(desc.height as usize, "texture height")?;
        self.bind_texture_2d(texture);
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                desc.mip_level as i32,
                desc.format.internal_gl() as i32,
                width,
                height,
                0,
                desc.format.pixel_gl(),
                desc.pixel_type.to_gl(),
                pixels,
            );
        }
        self.check_error("glTexImage2D")
    }

    fn texture_filter(&self, texture: TextureHandle, min: FilterMode, mag: FilterMode) {
        self.bind_texture_2d(texture);
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min.to_gl());
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, mag.to_gl());
        }
    }

    fn texture_wrap(&self, texture: TextureHandle, wrap: WrapMode) {
        self.bind_texture_2d(texture);
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap.to_gl());
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap.to_gl());
        }
    }

    fn create_render_buffer(&self) -> GraphicsResult<RenderBufferHandle> {
        let render_buffer =
            unsafe { self.gl.create_renderbuffer() }.map_err(creation_error("renderbuffer"))?;
        Ok(RenderBufferHandle(render_buffer.0))
    }

    fn delete_render_buffer(&self, render_buffer: RenderBufferHandle) {
        unsafe {
            self.gl
                .delete_renderbuffer(glow::NativeRenderbuffer(render_buffer.0))
        };
    }

    fn render_buffer_storage(
        &self,
        render_buffer: RenderBufferHandle,
        format: TextureFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> GraphicsResult<()> {
        let width = gl_int(width as usize, "renderbuffer width")?;
        let height = gl_int(height as usize, "renderbuffer height")?;
        unsafe {
            self.gl.bind_renderbuffer(
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(render_buffer.0)),
            );
            if samples > 0 {
                self.gl.renderbuffer_storage_multisample(
                    glow::RENDERBUFFER,
                    samples as i32,
                    format.internal_gl(),
                    width,
                    height,
                );
            } else {
                self.gl
                    .renderbuffer_storage(glow::RENDERBUFFER, format.internal_gl(), width, height);
            }
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
        }
        self.check_error("glRenderbufferStorage")
    }

    fn create_frame_buffer(&self) -> GraphicsResult<FrameBufferHandle> {
        let frame_buffer =
            unsafe { self.gl.create_framebuffer() }.map_err(creation_error("framebuffer"))?;
        Ok(FrameBufferHandle(frame_buffer.0))
    }

    fn delete_frame_buffer(&self, frame_buffer: FrameBufferHandle) {
        unsafe {
            self.gl
                .delete_framebuffer(glow::NativeFramebuffer(frame_buffer.0))
        };
    }

    fn bind_frame_buffer(&self, frame_buffer: Option<FrameBufferHandle>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                frame_buffer.map(|f| glow::NativeFramebuffer(f.0)),
            )
        };
    }

    fn frame_buffer_texture(
        &self,
        frame_buffer: FrameBufferHandle,
        point: AttachmentPoint,
        texture: TextureHandle,
        level: u32,
    ) {
        self.bind_frame_buffer(Some(frame_buffer));
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                point.to_gl(),
                glow::TEXTURE_2D,
                Some(glow::NativeTexture(texture.0)),
                level as i32,
            );
        }
    }

    fn frame_buffer_render_buffer(
        &self,
        frame_buffer: FrameBufferHandle,
        point: AttachmentPoint,
        render_buffer: RenderBufferHandle,
    ) {
        self.bind_frame_buffer(Some(frame_buffer));
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                point.to_gl(),
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(render_buffer.0)),
            );
        }
    }

    fn frame_buffer_status(&self, frame_buffer: FrameBufferHandle) -> FramebufferStatus {
        self.bind_frame_buffer(Some(frame_buffer));
        FramebufferStatus(unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) })
    }

    fn create_shader(&self, stage: ShaderStage) -> GraphicsResult<ShaderHandle> {
        let shader =
            unsafe { self.gl.create_shader(stage.to_gl()) }.map_err(creation_error("shader"))?;
        Ok(ShaderHandle(shader.0))
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) };
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> bool {
        let shader = glow::NativeShader(shader.0);
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        unsafe { self.gl.get_shader_info_log(glow::NativeShader(shader.0)) }
    }

    fn create_program(&self) -> GraphicsResult<ProgramHandle> {
        let program = unsafe { self.gl.create_program() }.map_err(creation_error("program"))?;
        Ok(ProgramHandle(program.0))
    }

    fn delete_program(&self, program: ProgramHandle) {
        if self.bound_program.get() == Some(program) {
            self.bound_program.set(None);
        }
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) };
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .attach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0))
        };
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .detach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0))
        };
    }

    fn link_program(&self, program: ProgramHandle) -> bool {
        let program = glow::NativeProgram(program.0);
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        unsafe { self.gl.get_program_info_log(glow::NativeProgram(program.0)) }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.use_cached_program(program);
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
        }
        .map(|location| UniformLocation(location.0))
    }

    fn set_uniform(&self, program: ProgramHandle, location: UniformLocation, value: &UniformValue) {
        self.use_cached_program(Some(program));
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, *v),
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, *v),
                UniformValue::Bool(v) => self.gl.uniform_1_i32(location, i32::from(*v)),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::IVec2(v) => self.gl.uniform_2_i32(location, v.x, v.y),
                UniformValue::IVec3(v) => self.gl.uniform_3_i32(location, v.x, v.y, v.z),
                UniformValue::IVec4(v) => self.gl.uniform_4_i32(location, v.x, v.y, v.z, v.w),
                UniformValue::Mat2(m) => {
                    self.gl
                        .uniform_matrix_2_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat3(m) => {
                    self.gl
                        .uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::IntArray(values) => self.gl.uniform_1_i32_slice(location, values),
            }
        }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&self, mask: ClearMask) {
        unsafe { self.gl.clear(mask.bits()) };
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn draw_arrays(&self, mode: PrimitiveMode, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(mode.to_gl(), first as i32, count as i32) };
    }

    fn draw_elements(&self, mode: PrimitiveMode, count: u32, offset: usize) {
        unsafe {
            self.gl
                .draw_elements(mode.to_gl(), count as i32, glow::UNSIGNED_INT, offset as i32)
        };
    }

    fn draw_elements_instanced(
        &self,
        mode: PrimitiveMode,
        count: u32,
        offset: usize,
        instances: u32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced(
                mode.to_gl(),
                count as i32,
                glow::UNSIGNED_INT,
                offset as i32,
                instances as i32,
            )
        };
    }
}
