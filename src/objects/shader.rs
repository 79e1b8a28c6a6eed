//! Shader programs.

use crate::backend::{
    GraphicsBackend, ProgramHandle, ShaderHandle, ShaderStage, UniformLocation, UniformValue,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::layout::{
    parse_uniform_attributes, parse_vertex_attributes, UniformAttributes, VertexAttributes,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A compiled stage, deleted when dropped.
struct StageObject<'a> {
    backend: &'a dyn GraphicsBackend,
    handle: ShaderHandle,
}

impl<'a> StageObject<'a> {
    fn compile(
        backend: &'a dyn GraphicsBackend,
        stage: ShaderStage,
        source: &str,
    ) -> GraphicsResult<Self> {
        let object = Self {
            backend,
            handle: backend.create_shader(stage)?,
        };
        if !backend.compile_shader(object.handle, source) {
            let log = backend.shader_info_log(object.handle);
            return Err(GraphicsError::ShaderCompile { stage, log });
        }
        Ok(object)
    }
}

impl Drop for StageObject<'_> {
    fn drop(&mut self) {
        self.backend.delete_shader(self.handle);
    }
}

/// A linked vertex + fragment program.
///
/// The vertex input layout and uniform set are parsed from the sources, so a program
/// knows how to format a vertex array for itself and which uniforms a material must provide.
pub struct ShaderProgram {
    backend: Rc<dyn GraphicsBackend>,
    handle: Option<ProgramHandle>,
    vertex_attributes: VertexAttributes,
    uniforms: UniformAttributes,
    locations: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl ShaderProgram {
    pub fn new(
        backend: &Rc<dyn GraphicsBackend>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> GraphicsResult<Self> {
        let vertex_attributes = parse_vertex_attributes(vertex_source)?;
        let uniforms = parse_uniform_attributes(&[vertex_source, fragment_source])?;

        let program = Self {
            backend: Rc::clone(backend),
            handle: Some(backend.create_program()?),
            vertex_attributes,
            uniforms,
            locations: RefCell::new(HashMap::new()),
        };
        let handle = program.handle()?;

        let vertex = StageObject::compile(backend.as_ref(), ShaderStage::Vertex, vertex_source)?;
        let fragment =
            StageObject::compile(backend.as_ref(), ShaderStage::Fragment, fragment_source)?;
        backend.attach_shader(handle, vertex.handle);
        backend.attach_shader(handle, fragment.handle);
        let linked = backend.link_program(handle);
        backend.detach_shader(handle, vertex.handle);
        backend.detach_shader(handle, fragment.handle);
        if !linked {
            return Err(GraphicsError::ShaderLinkage(backend.program_info_log(handle)));
        }

        log::debug!(
            "Linked program {handle:?} ({} inputs, {} uniforms)",
            program.vertex_attributes.len(),
            program.uniforms.len()
        );
        Ok(program)
    }

    pub fn handle(&self) -> GraphicsResult<ProgramHandle> {
        self.handle.ok_or(GraphicsError::Closed("shader program"))
    }

    pub fn vertex_attributes(&self) -> &VertexAttributes {
        &self.vertex_attributes
    }

    pub fn uniforms(&self) -> &UniformAttributes {
        &self.uniforms
    }

    pub fn bind(&self) -> GraphicsResult<()> {
        self.backend.use_program(Some(self.handle()?));
        Ok(())
    }

    pub fn unbind(&self) {
        self.backend.use_program(None);
    }

    /// Location of an active uniform, looked up once per name.
    pub fn uniform_location(&self, name: &str) -> GraphicsResult<Option<UniformLocation>> {
        let handle = self.handle()?;
        if let Some(location) = self.locations.borrow().get(name) {
            return Ok(*location);
        }
        let location = self.backend.uniform_location(handle, name);
        self.locations
            .borrow_mut()
            .insert(name.to_string(), location);
        Ok(location)
    }

    /// Upload a uniform value. Names the driver reports as inactive are skipped.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> GraphicsResult<()> {
        let handle = self.handle()?;
        match self.uniform_location(name)? {
            Some(location) => self.backend.set_uniform(handle, location, &value.into()),
            None => log::trace!("Uniform `{name}` is not active in program {handle:?}"),
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.delete_program(handle);
            self.locations.get_mut().clear();
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.close();
    }
}
