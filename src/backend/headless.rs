//! In-memory backend for tests and offscreen tooling.
//!
//! The headless backend keeps every object the driver would own in host memory and
//! enforces the GL rules the wrappers depend on: a buffer may only be mapped once,
//! a mapped buffer may not be respecified or sub-data updated, and deleting an
//! unknown name is reported. Shaders "compile" when they declare `void main`.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{GraphicsError, GraphicsResult};
use crate::layout::parse_uniform_attributes;
use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::ptr::NonNull;

/// A draw call recorded by the headless backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: PrimitiveMode,
    pub count: u32,
    pub offset: usize,
    pub instances: u32,
    pub program: Option<ProgramHandle>,
    pub vertex_array: Option<VertexArrayHandle>,
    pub indexed: bool,
}

#[derive(Debug, Default)]
struct HeadlessBuffer {
    // Word storage keeps mapped pointers 4-byte aligned.
    words: Vec<u32>,
    len: usize,
    mapped: Option<MapAccess>,
}

impl HeadlessBuffer {
    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.len]
    }

    fn resize(&mut self, len: usize) {
        self.words = vec![0; len.div_ceil(4)];
        self.len = len;
    }
}

#[derive(Debug)]
struct HeadlessShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct HeadlessProgram {
    shaders: Vec<ShaderHandle>,
    linked: bool,
    log: String,
    locations: HashMap<String, UniformLocation>,
    values: HashMap<UniformLocation, UniformValue>,
}

#[derive(Debug, Default)]
struct HeadlessTexture {
    desc: Option<TextureDesc>,
    filter: (FilterMode, FilterMode),
    wrap: WrapMode,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_name: u32,
    stale_deletes: usize,
    map_calls: usize,
    buffers: HashMap<BufferHandle, HeadlessBuffer>,
    bound_buffers: HashMap<BufferTarget, BufferHandle>,
    vertex_arrays: HashMap<VertexArrayHandle, HashMap<u32, (Option<AttribPointer>, bool)>>,
    bound_vertex_array: Option<VertexArrayHandle>,
    textures: HashMap<TextureHandle, HeadlessTexture>,
    render_buffers: HashMap<RenderBufferHandle, Option<(TextureFormat, u32, u32, u32)>>,
    frame_buffers: HashMap<FrameBufferHandle, HashMap<AttachmentPoint, (u32, u32)>>,
    shaders: HashMap<ShaderHandle, HeadlessShader>,
    programs: HashMap<ProgramHandle, HeadlessProgram>,
    bound_program: Option<ProgramHandle>,
    clear_color: [f32; 4],
    viewport: [i32; 4],
    draw_calls: Vec<DrawCall>,
}

impl HeadlessState {
    fn next_name(&mut self) -> NonZeroU32 {
        self.next_name += 1;
        NonZeroU32::new(self.next_name).unwrap_or(NonZeroU32::MIN)
    }

    fn buffer_mut(&mut self, buffer: BufferHandle) -> GraphicsResult<&mut HeadlessBuffer> {
        self.buffers.get_mut(&buffer).ok_or_else(|| {
            GraphicsError::InvalidOperation(format!("buffer {} does not exist", buffer.0))
        })
    }

    fn stale_delete(&mut self, kind: &str, name: NonZeroU32) {
        log::warn!("HeadlessBackend: deleting unknown {kind} {name}");
        self.stale_deletes += 1;
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(&texture)
            .and_then(|t| t.desc)
            .map(|d| (d.width, d.height))
    }
}

/// Headless backend.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    state: RefCell<HeadlessState>,
}

impl HeadlessBackend {
    /// Create a new headless backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a buffer's data store, reinterpreted as `T`.
    pub fn buffer_contents<T: bytemuck::Pod>(&self, buffer: BufferHandle) -> Option<Vec<T>> {
        let state = self.state.borrow();
        let bytes = state.buffers.get(&buffer)?.bytes();
        bytemuck::try_cast_slice(bytes).ok().map(<[T]>::to_vec)
    }

    pub fn is_mapped(&self, buffer: BufferHandle) -> bool {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .is_some_and(|b| b.mapped.is_some())
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Number of objects of any kind currently alive.
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.buffers.len()
            + state.vertex_arrays.len()
            + state.textures.len()
            + state.render_buffers.len()
            + state.frame_buffers.len()
            + state.shaders.len()
            + state.programs.len()
    }

    /// Deletes issued for names that were never created or already deleted.
    pub fn stale_deletes(&self) -> usize {
        self.state.borrow().stale_deletes
    }

    /// Number of `map_buffer_range` calls that reached the backend.
    pub fn map_calls(&self) -> usize {
        self.state.borrow().map_calls
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draw_calls.clone()
    }

    pub fn bound_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().bound_program
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        self.state.borrow().bound_buffers.get(&target).copied()
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    pub fn viewport_value(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    /// Last value uploaded to the named uniform of a program.
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let location = program.locations.get(name)?;
        program.values.get(location).cloned()
    }

    /// Attribute pointer and enabled flag recorded for `index` on a vertex array.
    pub fn vertex_attribute(
        &self,
        vertex_array: VertexArrayHandle,
        index: u32,
    ) -> Option<(Option<AttribPointer>, bool)> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)?
            .get(&index)
            .copied()
    }

    pub fn texture_desc(&self, texture: TextureHandle) -> Option<TextureDesc> {
        self.state.borrow().textures.get(&texture)?.desc
    }

    pub fn texture_sampling(
        &self,
        texture: TextureHandle,
    ) -> Option<(FilterMode, FilterMode, WrapMode)> {
        let state = self.state.borrow();
        let texture = state.textures.get(&texture)?;
        Some((texture.filter.0, texture.filter.1, texture.wrap))
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "Headless"
    }

    fn create_buffer(&self) -> GraphicsResult<BufferHandle> {
        let mut state = self.state.borrow_mut();
        let handle = BufferHandle(state.next_name());
        log::trace!("HeadlessBackend: creating buffer {}", handle.0);
        state.buffers.insert(handle, HeadlessBuffer::default());
        Ok(handle)
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_none() {
            state.stale_delete("buffer", buffer.0);
        }
        state.bound_buffers.retain(|_, b| *b != buffer);
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, buffer),
            None => state.bound_buffers.remove(&target),
        };
    }

    fn bind_buffer_base(&self, target: BufferTarget, index: u32, buffer: Option<BufferHandle>) {
        log::trace!("HeadlessBackend: binding {target:?}[{index}] to {buffer:?}");
        self.bind_buffer(target, buffer);
    }

    fn buffer_data(
        &self,
        _target: BufferTarget,
        buffer: BufferHandle,
        data: &[u8],
        usage: BufferUsage,
    ) -> GraphicsResult<()> {
        let mut state = self.state.borrow_mut();
        let store = state.buffer_mut(buffer)?;
        if store.mapped.is_some() {
            return Err(GraphicsError::InvalidOperation(
                "buffer data respecified while mapped".to_string(),
            ));
        }
        log::trace!("HeadlessBackend: buffer {} data {} bytes ({usage:?})", buffer.0, data.len());
        store.resize(data.len());
        store.bytes_mut().copy_from_slice(data);
        Ok(())
    }

    fn buffer_storage(
        &self,
        _target: BufferTarget,
        buffer: BufferHandle,
        size: usize,
        _usage: BufferUsage,
    ) -> GraphicsResult<()> {
        let mut state = self.state.borrow_mut();
        let store = state.buffer_mut(buffer)?;
        if store.mapped.is_some() {
            return Err(GraphicsError::InvalidOperation(
                "buffer storage respecified while mapped".to_string(),
            ));
        }
        store.resize(size);
        Ok(())
    }

    fn buffer_sub_data(
        &self,
        _target: BufferTarget,
        buffer: BufferHandle,
        offset: usize,
        data: &[u8],
    ) -> GraphicsResult<()> {
        let mut state = self.state.borrow_mut();
        let store = state.buffer_mut(buffer)?;
        if store.mapped.is_some() {
            return Err(GraphicsError::InvalidOperation(
                "sub data upload to a mapped buffer".to_string(),
            ));
        }
        let end = offset + data.len();
        if end > store.len {
            return Err(GraphicsError::InvalidOperation(format!(
                "sub data range {offset}..{end} exceeds store of {} bytes",
                store.len
            )));
        }
        store.bytes_mut()[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn map_buffer_range(
        &self,
        _target: BufferTarget,
        buffer: BufferHandle,
        offset: usize,
        len: usize,
        access: MapAccess,
    ) -> GraphicsResult<NonNull<u8>> {
        let mut state = self.state.borrow_mut();
        state.map_calls += 1;
        let store = state.buffer_mut(buffer)?;
        if store.mapped.is_some() {
            return Err(GraphicsError::MapFailed(format!(
                "buffer {} is already mapped",
                buffer.0
            )));
        }
        if len == 0 || offset + len > store.len {
            return Err(GraphicsError::MapFailed(format!(
                "range {offset}..{} invalid for store of {} bytes",
                offset + len,
                store.len
            )));
        }
        store.mapped = Some(access);
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut store.words);
        NonNull::new(bytes[offset..].as_mut_ptr())
            .ok_or_else(|| GraphicsError::MapFailed("null mapping".to_string()))
    }

    fn unmap_buffer(&self, _target: BufferTarget, buffer: BufferHandle) -> GraphicsResult<()> {
        let mut state = self.state.borrow_mut();
        let store = state.buffer_mut(buffer)?;
        match store.mapped.take() {
            Some(_) => Ok(()),
            None => Err(GraphicsError::UnmapFailed(format!(
                "buffer {} is not mapped",
                buffer.0
            ))),
        }
    }

    fn create_vertex_array(&self) -> GraphicsResult<VertexArrayHandle> {
        let mut state = self.state.borrow_mut();
        let handle = VertexArrayHandle(state.next_name());
        state.vertex_arrays.insert(handle, HashMap::new());
        Ok(handle)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array).is_none() {
            state.stale_delete("vertex array", vertex_array.0);
        }
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array;
    }

    fn enable_vertex_attribute(&self, vertex_array: VertexArrayHandle, index: u32) {
        if let Some(attributes) = self.state.borrow_mut().vertex_arrays.get_mut(&vertex_array) {
            attributes.entry(index).or_insert((None, false)).1 = true;
        }
    }

    fn disable_vertex_attribute(&self, vertex_array: VertexArrayHandle, index: u32) {
        if let Some(attributes) = self.state.borrow_mut().vertex_arrays.get_mut(&vertex_array) {
            attributes.entry(index).or_insert((None, false)).1 = false;
        }
    }

    fn vertex_attribute_pointer(
        &self,
        vertex_array: VertexArrayHandle,
        _buffer: BufferHandle,
        pointer: &AttribPointer,
    ) {
        if let Some(attributes) = self.state.borrow_mut().vertex_arrays.get_mut(&vertex_array) {
            attributes.entry(pointer.index).or_insert((None, false)).0 = Some(*pointer);
        }
    }

    fn create_texture(&self) -> GraphicsResult<TextureHandle> {
        let mut state = self.state.borrow_mut();
        let handle = TextureHandle(state.next_name());
        state.textures.insert(handle, HeadlessTexture::default());
        Ok(handle)
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture).is_none() {
            state.stale_delete("texture", texture.0);
        }
    }

    fn bind_texture(&self, slot: Option<u32>, texture: Option<TextureHandle>) {
        log::trace!("HeadlessBackend: binding texture {texture:?} to unit {}", slot.unwrap_or(0));
    }

    fn texture_image_2d(
        &self,
        texture: TextureHandle,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> GraphicsResult<()> {
        if let Some(pixels) = pixels {
            if pixels.len() < desc.byte_len() {
                return Err(GraphicsError::InvalidOperation(format!(
                    "texture upload of {} bytes, expected {}",
                    pixels.len(),
                    desc.byte_len()
                )));
            }
        }
        let mut state = self.state.borrow_mut();
        let entry = state.textures.get_mut(&texture).ok_or_else(|| {
            GraphicsError::InvalidOperation(format!("texture {} does not exist", texture.0))
        })?;
        entry.desc = Some(*desc);
        Ok(())
    }

    fn texture_filter(&self, texture: TextureHandle, min: FilterMode, mag: FilterMode) {
        if let Some(entry) = self.state.borrow_mut().textures.get_mut(&texture) {
            entry.filter = (min, mag);
        }
    }

    fn texture_wrap(&self, texture: TextureHandle, wrap: WrapMode) {
        if let Some(entry) = self.state.borrow_mut().textures.get_mut(&texture) {
            entry.wrap = wrap;
        }
    }

    fn create_render_buffer(&self) -> GraphicsResult<RenderBufferHandle> {
        let mut state = self.state.borrow_mut();
        let handle = RenderBufferHandle(state.next_name());
        state.render_buffers.insert(handle, None);
        Ok(handle)
    }

    fn delete_render_buffer(&self, render_buffer: RenderBufferHandle) {
        let mut state = self.state.borrow_mut();
        if state.render_buffers.remove(&render_buffer).is_none() {
            state.stale_delete("renderbuffer", render_buffer.0);
        }
    }

    fn render_buffer_storage(
        &self,
        render_buffer: RenderBufferHandle,
        format: TextureFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> GraphicsResult<()> {
        let mut state = self.state.borrow_mut();
        let entry = state.render_buffers.get_mut(&render_buffer).ok_or_else(|| {
            GraphicsError::InvalidOperation(format!(
                "renderbuffer {} does not exist",
                render_buffer.0
            ))
        })?;
        *entry = Some((format, samples, width, height));
        Ok(())
    }

    fn create_frame_buffer(&self) -> GraphicsResult<FrameBufferHandle> {
        let mut state = self.state.borrow_mut();
        let handle = FrameBufferHandle(state.next_name());
        state.frame_buffers.insert(handle, HashMap::new());
        Ok(handle)
    }

    fn delete_frame_buffer(&self, frame_buffer: FrameBufferHandle) {
        let mut state = self.state.borrow_mut();
        if state.frame_buffers.remove(&frame_buffer).is_none() {
            state.stale_delete("framebuffer", frame_buffer.0);
        }
    }

    fn bind_frame_buffer(&self, frame_buffer: Option<FrameBufferHandle>) {
        log::trace!("HeadlessBackend: binding framebuffer {frame_buffer:?}");
    }

    fn frame_buffer_texture(
        &self,
        frame_buffer: FrameBufferHandle,
        point: AttachmentPoint,
        texture: TextureHandle,
        _level: u32,
    ) {
        let mut state = self.state.borrow_mut();
        // An attachment without storage has zero size and leaves the framebuffer incomplete.
        let size = state.texture_size(texture).unwrap_or((0, 0));
        if let Some(attachments) = state.frame_buffers.get_mut(&frame_buffer) {
            attachments.insert(point, size);
        }
    }

    fn frame_buffer_render_buffer(
        &self,
        frame_buffer: FrameBufferHandle,
        point: AttachmentPoint,
        render_buffer: RenderBufferHandle,
    ) {
        let mut state = self.state.borrow_mut();
        let size = state
            .render_buffers
            .get(&render_buffer)
            .copied()
            .flatten()
            .map_or((0, 0), |(_, _, w, h)| (w, h));
        if let Some(attachments) = state.frame_buffers.get_mut(&frame_buffer) {
            attachments.insert(point, size);
        }
    }

    fn frame_buffer_status(&self, frame_buffer: FrameBufferHandle) -> FramebufferStatus {
        let state = self.state.borrow();
        let Some(attachments) = state.frame_buffers.get(&frame_buffer) else {
            return FramebufferStatus(glow::FRAMEBUFFER_UNDEFINED);
        };
        if attachments.is_empty() {
            return FramebufferStatus::MISSING_ATTACHMENT;
        }
        if attachments.values().any(|&(w, h)| w == 0 || h == 0) {
            return FramebufferStatus::INCOMPLETE_ATTACHMENT;
        }
        FramebufferStatus::COMPLETE
    }

    fn create_shader(&self, stage: ShaderStage) -> GraphicsResult<ShaderHandle> {
        let mut state = self.state.borrow_mut();
        let handle = ShaderHandle(state.next_name());
        state.shaders.insert(
            handle,
            HeadlessShader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(handle)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_none() {
            state.stale_delete("shader", shader.0);
        }
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.shaders.get_mut(&shader) else {
            return false;
        };
        entry.source = source.to_string();
        entry.compiled = source.contains("void main");
        entry.log = if entry.compiled {
            String::new()
        } else {
            "0:1(1): error: no function with name 'main'".to_string()
        };
        entry.compiled
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn create_program(&self) -> GraphicsResult<ProgramHandle> {
        let mut state = self.state.borrow_mut();
        let handle = ProgramHandle(state.next_name());
        state.programs.insert(handle, HeadlessProgram::default());
        Ok(handle)
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_none() {
            state.stale_delete("program", program.0);
        }
        if state.bound_program == Some(program) {
            state.bound_program = None;
        }
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program) {
            entry.shaders.push(shader);
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program) {
            entry.shaders.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program).map(|p| p.shaders.clone()) else {
            return false;
        };
        let stages: Vec<&HeadlessShader> = attached
            .iter()
            .filter_map(|s| state.shaders.get(s))
            .collect();

        let has_stage = |stage| stages.iter().any(|s| s.stage == stage && s.compiled);
        let result = if !has_stage(ShaderStage::Vertex) || !has_stage(ShaderStage::Fragment) {
            Err("error: program requires compiled vertex and fragment stages".to_string())
        } else {
            let sources: Vec<&str> = stages.iter().map(|s| s.source.as_str()).collect();
            parse_uniform_attributes(&sources).map_err(|e| format!("error: {e}"))
        };

        let Some(entry) = state.programs.get_mut(&program) else {
            return false;
        };
        match result {
            Ok(uniforms) => {
                entry.locations = uniforms
                    .iter()
                    .enumerate()
                    .map(|(i, u)| (u.name.clone(), UniformLocation(i as u32)))
                    .collect();
                entry.values.clear();
                entry.linked = true;
                entry.log.clear();
            }
            Err(log) => {
                entry.linked = false;
                entry.log = log;
            }
        }
        entry.linked
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.state.borrow_mut().bound_program = program;
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        if !program.linked {
            return None;
        }
        program.locations.get(name).copied()
    }

    fn set_uniform(&self, program: ProgramHandle, location: UniformLocation, value: &UniformValue) {
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program) {
            entry.values.insert(location, value.clone());
        }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, mask: ClearMask) {
        log::trace!("HeadlessBackend: clear {:#x}", mask.bits());
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    fn draw_arrays(&self, mode: PrimitiveMode, first: u32, count: u32) {
        let mut state = self.state.borrow_mut();
        let call = DrawCall {
            mode,
            count,
            offset: first as usize,
            instances: 1,
            program: state.bound_program,
            vertex_array: state.bound_vertex_array,
            indexed: false,
        };
        state.draw_calls.push(call);
    }

    fn draw_elements(&self, mode: PrimitiveMode, count: u32, offset: usize) {
        self.draw_elements_instanced(mode, count, offset, 1);
    }

    fn draw_elements_instanced(
        &self,
        mode: PrimitiveMode,
        count: u32,
        offset: usize,
        instances: u32,
    ) {
        let mut state = self.state.borrow_mut();
        let call = DrawCall {
            mode,
            count,
            offset,
            instances,
            program: state.bound_program,
            vertex_array: state.bound_vertex_array,
            indexed: true,
        };
        state.draw_calls.push(call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_mapping_enforced() {
        let backend = HeadlessBackend::new();
        let buffer = backend.create_buffer().unwrap();
        backend
            .buffer_data(BufferTarget::Array, buffer, &[0u8; 16], BufferUsage::DynamicDraw)
            .unwrap();

        backend
            .map_buffer_range(BufferTarget::Array, buffer, 0, 16, MapAccess::READ)
            .unwrap();
        assert!(backend.is_mapped(buffer));
        let second = backend.map_buffer_range(BufferTarget::Array, buffer, 0, 16, MapAccess::READ);
        assert!(matches!(second, Err(GraphicsError::MapFailed(_))));

        backend.unmap_buffer(BufferTarget::Array, buffer).unwrap();
        assert!(!backend.is_mapped(buffer));
        assert!(backend.unmap_buffer(BufferTarget::Array, buffer).is_err());
    }

    #[test]
    fn test_mapped_buffer_rejects_updates() {
        let backend = HeadlessBackend::new();
        let buffer = backend.create_buffer().unwrap();
        backend
            .buffer_data(BufferTarget::Array, buffer, &[1u8; 8], BufferUsage::StaticDraw)
            .unwrap();
        backend
            .map_buffer_range(BufferTarget::Array, buffer, 0, 8, MapAccess::WRITE)
            .unwrap();

        assert!(backend
            .buffer_sub_data(BufferTarget::Array, buffer, 0, &[2u8; 4])
            .is_err());
        assert!(backend
            .buffer_data(BufferTarget::Array, buffer, &[2u8; 4], BufferUsage::StaticDraw)
            .is_err());
    }

    #[test]
    fn test_delete_twice_is_counted() {
        let backend = HeadlessBackend::new();
        let buffer = backend.create_buffer().unwrap();
        backend.delete_buffer(buffer);
        backend.delete_buffer(buffer);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.stale_deletes(), 1);
    }

    #[test]
    fn test_link_requires_both_stages() {
        let backend = HeadlessBackend::new();
        let program = backend.create_program().unwrap();
        let vertex = backend.create_shader(ShaderStage::Vertex).unwrap();
        assert!(backend.compile_shader(vertex, "void main() {}"));
        backend.attach_shader(program, vertex);

        assert!(!backend.link_program(program));
        assert!(backend.program_info_log(program).contains("fragment"));
    }

    #[test]
    fn test_uniform_locations_follow_declarations() {
        let backend = HeadlessBackend::new();
        let program = backend.create_program().unwrap();
        let vertex = backend.create_shader(ShaderStage::Vertex).unwrap();
        let fragment = backend.create_shader(ShaderStage::Fragment).unwrap();
        backend.compile_shader(vertex, "uniform mat4 model;\nvoid main() {}");
        backend.compile_shader(fragment, "uniform float time;\nvoid main() {}");
        backend.attach_shader(program, vertex);
        backend.attach_shader(program, fragment);
        assert!(backend.link_program(program));

        let time = backend.uniform_location(program, "time").unwrap();
        backend.set_uniform(program, time, &UniformValue::Float(0.5));
        assert_eq!(
            backend.uniform_value(program, "time"),
            Some(UniformValue::Float(0.5))
        );
        assert!(backend.uniform_location(program, "missing").is_none());
    }
}
