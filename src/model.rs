//! Instanced rendering of meshes grouped by material.
//!
//! A [`Model`] owns a set of meshes, each assigned to a [`Material`], and a list of instance
//! transforms. Rendering merges every material's meshes into one batched GPU mesh and issues a
//! single instanced draw per material. Instance transforms are uploaded as a `mat4` array to a
//! shader storage buffer at binding [`TRANSFORMS_BINDING`], so vertex shaders read them as
//!
//! ```glsl
//! layout(std430, binding = 0) buffer Transforms { mat4 transforms[]; };
//! // ...
//! gl_Position = transforms[gl_InstanceID] * vec4(position, 1.0);
//! ```

use crate::backend::{
    BufferTarget, BufferUsage, GraphicsBackend, MapAccess, PrimitiveMode, UniformValue,
};
use crate::batch::concatenate_into;
use crate::error::{GraphicsError, GraphicsResult};
use crate::layout::UniformAttributes;
use crate::mesh::{GpuMesh, Mesh, MeshStorage};
use crate::objects::{Buffer, ShaderProgram, Texture, VertexArray};
use glam::Mat4;
use std::fmt;
use std::rc::Rc;

/// Storage buffer binding point the instance transforms are bound to.
pub const TRANSFORMS_BINDING: u32 = 0;

const MAT4_FLOATS: usize = 16;

/// Surface description applied before a batch is drawn.
pub trait Material {
    /// Program the material's meshes are drawn with.
    fn shader(&self) -> &ShaderProgram;

    /// Bind the shader and upload the material's uniforms and textures.
    fn bind(&self) -> GraphicsResult<()>;

    /// Check that every uniform the material sets is declared in `uniforms`.
    fn validate(&self, uniforms: &UniformAttributes) -> GraphicsResult<()>;

    fn is_compatible(&self, uniforms: &UniformAttributes) -> bool {
        self.validate(uniforms).is_ok()
    }
}

/// Material made of a shader program and a set of named uniform values.
pub struct ShaderMaterial {
    shader: Rc<ShaderProgram>,
    uniforms: Vec<(String, UniformValue)>,
    textures: Vec<(u32, Rc<Texture>)>,
}

impl ShaderMaterial {
    pub fn new(shader: Rc<ShaderProgram>) -> Self {
        Self {
            shader,
            uniforms: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn with_uniform(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.set_uniform(name, value);
        self
    }

    /// Bind `texture` to `slot` and point the sampler uniform `name` at it.
    pub fn with_texture(mut self, name: &str, slot: u32, texture: Rc<Texture>) -> Self {
        self.set_uniform(name, slot as i32);
        self.textures.retain(|(existing, _)| *existing != slot);
        self.textures.push((slot, texture));
        self
    }

    /// Set or replace a uniform value. It is uploaded on the next [`Material::bind`].
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }
}

impl Material for ShaderMaterial {
    fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    fn bind(&self) -> GraphicsResult<()> {
        self.shader.bind()?;
        for (slot, texture) in &self.textures {
            texture.bind_to_slot(*slot)?;
        }
        for (name, value) in &self.uniforms {
            self.shader.set_uniform(name, value.clone())?;
        }
        Ok(())
    }

    fn validate(&self, uniforms: &UniformAttributes) -> GraphicsResult<()> {
        match self.uniforms.iter().find(|(name, _)| !uniforms.contains(name)) {
            Some((name, _)) => Err(GraphicsError::IncompatibleMaterial(name.clone())),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ShaderMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderMaterial")
            .field("shader", &self.shader.handle().ok())
            .field("uniforms", &self.uniforms)
            .field("textures", &self.textures.len())
            .finish()
    }
}

/// Identifies an instance within its [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

/// Merged geometry of one material, rebuilt when its mesh set changes.
struct Batch {
    mesh: GpuMesh,
    vertex_array: VertexArray,
}

struct MaterialGroup {
    material: Rc<dyn Material>,
    meshes: Vec<Mesh>,
    batch: Option<Batch>,
}

impl MaterialGroup {
    fn build_batch(&self, backend: &Rc<dyn GraphicsBackend>) -> GraphicsResult<Batch> {
        let sources: Vec<&Mesh> = self.meshes.iter().collect();
        let mut mesh = GpuMesh::new(backend)?;
        concatenate_into(&mut mesh, &sources)?;

        let vertex_array = VertexArray::new(backend)?;
        self.material
            .shader()
            .vertex_attributes()
            .format(&vertex_array, &[mesh.vertex_buffer()])?;
        vertex_array.set_index_buffer(mesh.index_buffer())?;
        Ok(Batch { mesh, vertex_array })
    }
}

/// Meshes drawn once per instance transform.
pub struct Model {
    backend: Rc<dyn GraphicsBackend>,
    groups: Vec<MaterialGroup>,
    instances: Vec<(InstanceId, Mat4)>,
    next_instance: u64,
    transforms: Buffer,
    uploaded_instances: usize,
}

impl Model {
    pub fn new(backend: &Rc<dyn GraphicsBackend>) -> GraphicsResult<Self> {
        Ok(Self {
            backend: backend.clone(),
            groups: Vec::new(),
            instances: Vec::new(),
            next_instance: 0,
            transforms: Buffer::new(backend, BufferTarget::ShaderStorage)?,
            uploaded_instances: 0,
        })
    }

    /// Add a mesh drawn with `material`.
    ///
    /// Meshes sharing a material (by identity) are batched together.
    pub fn add_mesh(
        &mut self,
        material: Rc<dyn Material>,
        mesh: impl Into<Mesh>,
    ) -> GraphicsResult<()> {
        material.validate(material.shader().uniforms())?;
        let mesh = mesh.into();
        match self
            .groups
            .iter_mut()
            .find(|group| Rc::ptr_eq(&group.material, &material))
        {
            Some(group) => {
                group.meshes.push(mesh);
                group.batch = None;
            }
            None => self.groups.push(MaterialGroup {
                material,
                meshes: vec![mesh],
                batch: None,
            }),
        }
        Ok(())
    }

    pub fn material_count(&self) -> usize {
        self.groups.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.groups.iter().map(|group| group.meshes.len()).sum()
    }

    /// Drop cached batches so the next render re-reads every mesh.
    pub fn invalidate_batches(&mut self) {
        self.groups.iter_mut().for_each(|group| group.batch = None);
    }

    /// Add an instance with the identity transform.
    pub fn create_instance(&mut self) -> InstanceId {
        self.create_instance_with(Mat4::IDENTITY)
    }

    pub fn create_instance_with(&mut self, transform: Mat4) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        self.instances.push((id, transform));
        id
    }

    pub fn transform(&self, id: InstanceId) -> Option<Mat4> {
        self.instances
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, transform)| *transform)
    }

    pub fn transform_mut(&mut self, id: InstanceId) -> Option<&mut Mat4> {
        self.instances
            .iter_mut()
            .find(|(existing, _)| *existing == id)
            .map(|(_, transform)| transform)
    }

    /// Remove an instance, returning its last transform.
    pub fn remove_instance(&mut self, id: InstanceId) -> Option<Mat4> {
        let position = self.instances.iter().position(|(existing, _)| *existing == id)?;
        Some(self.instances.remove(position).1)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Upload the instance transforms and draw every material batch once per instance.
    pub fn render_instances(&mut self) -> GraphicsResult<()> {
        if self.instances.is_empty() {
            return Ok(());
        }
        self.upload_transforms()?;
        self.transforms.bind_base(TRANSFORMS_BINDING)?;

        let instances = self.instances.len() as u32;
        for group in &mut self.groups {
            if group.batch.is_none() {
                group.batch = Some(group.build_batch(&self.backend)?);
            }
            let Some(batch) = group.batch.as_ref() else {
                continue;
            };
            let count = batch.mesh.indices_len() as u32;
            if count == 0 {
                continue;
            }
            group.material.bind()?;
            batch.vertex_array.bind()?;
            self.backend
                .draw_elements_instanced(PrimitiveMode::Triangles, count, 0, instances);
            batch.vertex_array.unbind();
        }
        Ok(())
    }

    fn upload_transforms(&mut self) -> GraphicsResult<()> {
        let floats = self.instances.len() * MAT4_FLOATS;
        if self.uploaded_instances != self.instances.len() {
            self.transforms
                .allocate(floats * std::mem::size_of::<f32>(), BufferUsage::DynamicDraw)?;
            self.uploaded_instances = self.instances.len();
        }

        let mut range = self.transforms.map_range::<f32>(0, floats, MapAccess::WRITE)?;
        let slots = range.as_mut_slice()?.chunks_exact_mut(MAT4_FLOATS);
        for (slot, (_, transform)) in slots.zip(&self.instances) {
            slot.copy_from_slice(&transform.to_cols_array());
        }
        range.unmap()
    }

    /// Release every mesh, batch and the transform buffer.
    pub fn close(&mut self) {
        for group in &mut self.groups {
            group.meshes.iter_mut().for_each(MeshStorage::close);
            if let Some(mut batch) = group.batch.take() {
                batch.mesh.close();
                batch.vertex_array.close();
            }
        }
        self.transforms.close();
        self.instances.clear();
        self.uploaded_instances = 0;
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("materials", &self.groups.len())
            .field("meshes", &self.mesh_count())
            .field("instances", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::memory::HostBuffer;
    use crate::mesh::NativeMesh;
    use glam::Vec3;

    const VERTEX: &str = "
layout(location = 0) in vec3 position;
layout(std430, binding = 0) buffer Transforms { mat4 transforms[]; };
void main() { gl_Position = transforms[gl_InstanceID] * vec4(position, 1.0); }
";

    const FRAGMENT: &str = "
uniform vec3 tint;
out vec4 color;
void main() { color = vec4(tint, 1.0); }
";

    fn setup() -> (Rc<HeadlessBackend>, Rc<dyn GraphicsBackend>) {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: Rc<dyn GraphicsBackend> = headless.clone();
        (headless, backend)
    }

    fn triangle(z: f32) -> NativeMesh {
        NativeMesh::with_data(
            HostBuffer::from_slice(&[0.0, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z]),
            HostBuffer::from_slice(&[0, 1, 2]),
        )
        .unwrap()
    }

    fn material(backend: &Rc<dyn GraphicsBackend>) -> Rc<ShaderMaterial> {
        let shader = Rc::new(ShaderProgram::new(backend, VERTEX, FRAGMENT).unwrap());
        Rc::new(ShaderMaterial::new(shader).with_uniform("tint", Vec3::ONE))
    }

    #[test]
    fn test_incompatible_material_is_rejected() {
        let (_, backend) = setup();
        let shader = Rc::new(ShaderProgram::new(&backend, VERTEX, FRAGMENT).unwrap());
        let material = Rc::new(ShaderMaterial::new(shader).with_uniform("missing", 1.0f32));
        let mut model = Model::new(&backend).unwrap();

        let result = model.add_mesh(material, triangle(0.0));
        assert!(matches!(
            result,
            Err(GraphicsError::IncompatibleMaterial(name)) if name == "missing"
        ));
        assert_eq!(model.mesh_count(), 0);
    }

    #[test]
    fn test_meshes_sharing_a_material_draw_once() {
        let (headless, backend) = setup();
        let material = material(&backend);
        let mut model = Model::new(&backend).unwrap();
        model.add_mesh(material.clone(), triangle(0.0)).unwrap();
        model.add_mesh(material, triangle(1.0)).unwrap();
        model.create_instance();
        model.create_instance_with(Mat4::from_translation(Vec3::X));

        model.render_instances().unwrap();

        let calls = headless.draw_calls();
        assert_eq!(model.material_count(), 1);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].count, 6);
        assert_eq!(calls[0].instances, 2);
        assert_eq!(calls[0].mode, PrimitiveMode::Triangles);
    }

    #[test]
    fn test_transforms_are_uploaded_in_instance_order() {
        let (headless, backend) = setup();
        let mut model = Model::new(&backend).unwrap();
        model.add_mesh(material(&backend), triangle(0.0)).unwrap();
        let first = model.create_instance();
        let second = model.create_instance();
        *model.transform_mut(second).unwrap() = Mat4::from_scale(Vec3::splat(2.0));

        model.render_instances().unwrap();

        let handle = model.transforms.handle().unwrap();
        let uploaded = headless.buffer_contents::<f32>(handle).unwrap();
        assert_eq!(uploaded.len(), 2 * MAT4_FLOATS);
        assert_eq!(&uploaded[..MAT4_FLOATS], &Mat4::IDENTITY.to_cols_array());
        assert_eq!(uploaded[MAT4_FLOATS], 2.0);
        assert!(!headless.is_mapped(handle));

        assert_eq!(model.remove_instance(first), Some(Mat4::IDENTITY));
        assert_eq!(model.remove_instance(first), None);
        assert_eq!(model.instance_count(), 1);
    }

    #[test]
    fn test_no_instances_draws_nothing() {
        let (headless, backend) = setup();
        let mut model = Model::new(&backend).unwrap();
        model.add_mesh(material(&backend), triangle(0.0)).unwrap();

        model.render_instances().unwrap();
        assert!(headless.draw_calls().is_empty());
    }

    #[test]
    fn test_close_releases_everything() {
        let (headless, backend) = setup();
        let material = material(&backend);
        let mut model = Model::new(&backend).unwrap();
        model.add_mesh(material.clone(), triangle(0.0)).unwrap();
        model.create_instance();
        model.render_instances().unwrap();

        model.close();
        model.close();
        drop(model);
        drop(material);
        assert_eq!(headless.live_objects(), 0);
        assert_eq!(headless.stale_deletes(), 0);
    }
}
