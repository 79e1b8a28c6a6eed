//! GLSL data types and shader interface layouts.
//!
//! A [`VertexAttributes`] layout describes the interleaved vertex inputs of a vertex shader
//! (`layout(location = N) in TYPE NAME;`) and can program a vertex array with matching
//! attribute pointers. [`UniformAttributes`] lists the uniforms a program declares.
//!
//! Layouts are usually obtained by parsing shader sources, see [`parse_vertex_attributes`] and
//! [`parse_uniform_attributes`].

mod parse;

pub use parse::{parse_uniform_attributes, parse_vertex_attributes};

use crate::backend::{AttribPointer, ScalarKind};
use crate::error::{GraphicsError, GraphicsResult};
use crate::objects::{Buffer, VertexArray};
use std::collections::HashSet;
use std::fmt;

/// GLSL data type of an attribute or uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Float,
    Int,
    Short,
    Double,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    Mat2,
    Mat3,
    Mat4,
    DMat2,
    DMat3,
    DMat4,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler1DShadow,
    Sampler2DShadow,
    Sampler2DRect,
    Sampler2DRectShadow,
    SamplerCubeShadow,
    SamplerBuffer,
    Sampler1DArray,
    Sampler2DArray,
    Sampler1DArrayShadow,
    Sampler2DArrayShadow,
    SamplerCubeArray,
    SamplerCubeArrayShadow,
}

impl GlslType {
    pub const ALL: [GlslType; 32] = [
        GlslType::Float,
        GlslType::Int,
        GlslType::Short,
        GlslType::Double,
        GlslType::Vec2,
        GlslType::Vec3,
        GlslType::Vec4,
        GlslType::IVec2,
        GlslType::IVec3,
        GlslType::IVec4,
        GlslType::Mat2,
        GlslType::Mat3,
        GlslType::Mat4,
        GlslType::DMat2,
        GlslType::DMat3,
        GlslType::DMat4,
        GlslType::Sampler1D,
        GlslType::Sampler2D,
        GlslType::Sampler3D,
        GlslType::SamplerCube,
        GlslType::Sampler1DShadow,
        GlslType::Sampler2DShadow,
        GlslType::Sampler2DRect,
        GlslType::Sampler2DRectShadow,
        GlslType::SamplerCubeShadow,
        GlslType::SamplerBuffer,
        GlslType::Sampler1DArray,
        GlslType::Sampler2DArray,
        GlslType::Sampler1DArrayShadow,
        GlslType::Sampler2DArrayShadow,
        GlslType::SamplerCubeArray,
        GlslType::SamplerCubeArrayShadow,
    ];

    /// Keyword used in GLSL source.
    pub fn glsl_name(self) -> &'static str {
        match self {
            GlslType::Float => "float",
            GlslType::Int => "int",
            GlslType::Short => "short",
            GlslType::Double => "double",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
            GlslType::IVec2 => "ivec2",
            GlslType::IVec3 => "ivec3",
            GlslType::IVec4 => "ivec4",
            GlslType::Mat2 => "mat2",
            GlslType::Mat3 => "mat3",
            GlslType::Mat4 => "mat4",
            GlslType::DMat2 => "dmat2",
            GlslType::DMat3 => "dmat3",
            GlslType::DMat4 => "dmat4",
            GlslType::Sampler1D => "sampler1D",
            GlslType::Sampler2D => "sampler2D",
            GlslType::Sampler3D => "sampler3D",
            GlslType::SamplerCube => "samplerCube",
            GlslType::Sampler1DShadow => "sampler1DShadow",
            GlslType::Sampler2DShadow => "sampler2DShadow",
            GlslType::Sampler2DRect => "sampler2DRect",
            GlslType::Sampler2DRectShadow => "sampler2DRectShadow",
            GlslType::SamplerCubeShadow => "samplerCubeShadow",
            GlslType::SamplerBuffer => "samplerBuffer",
            GlslType::Sampler1DArray => "sampler1DArray",
            GlslType::Sampler2DArray => "sampler2DArray",
            GlslType::Sampler1DArrayShadow => "sampler1DArrayShadow",
            GlslType::Sampler2DArrayShadow => "sampler2DArrayShadow",
            GlslType::SamplerCubeArray => "samplerCubeArray",
            GlslType::SamplerCubeArrayShadow => "samplerCubeArrayShadow",
        }
    }

    /// Look up a type by its GLSL keyword, ignoring case.
    pub fn from_glsl_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.glsl_name().eq_ignore_ascii_case(name))
    }

    pub fn scalar_kind(self) -> ScalarKind {
        match self {
            GlslType::Float
            | GlslType::Vec2
            | GlslType::Vec3
            | GlslType::Vec4
            | GlslType::Mat2
            | GlslType::Mat3
            | GlslType::Mat4 => ScalarKind::Float,
            GlslType::Int | GlslType::IVec2 | GlslType::IVec3 | GlslType::IVec4 => ScalarKind::Int,
            GlslType::Short => ScalarKind::Short,
            GlslType::Double | GlslType::DMat2 | GlslType::DMat3 | GlslType::DMat4 => {
                ScalarKind::Double
            }
            _ => ScalarKind::Sampler,
        }
    }

    /// Number of scalar components.
    pub fn components(self) -> u32 {
        match self {
            GlslType::Vec2 | GlslType::IVec2 => 2,
            GlslType::Vec3 | GlslType::IVec3 => 3,
            GlslType::Vec4 | GlslType::IVec4 | GlslType::Mat2 | GlslType::DMat2 => 4,
            GlslType::Mat3 | GlslType::DMat3 => 9,
            GlslType::Mat4 | GlslType::DMat4 => 16,
            _ => 1,
        }
    }

    pub fn byte_size(self) -> u32 {
        let scalar = match self.scalar_kind() {
            ScalarKind::Short => 2,
            ScalarKind::Double => 8,
            ScalarKind::Float | ScalarKind::Int | ScalarKind::Sampler => 4,
        };
        scalar * self.components()
    }

    /// GL type enum as reported by program introspection.
    pub fn gl_type(self) -> u32 {
        match self {
            GlslType::Float => glow::FLOAT,
            GlslType::Int => glow::INT,
            GlslType::Short => glow::SHORT,
            GlslType::Double => glow::DOUBLE,
            GlslType::Vec2 => glow::FLOAT_VEC2,
            GlslType::Vec3 => glow::FLOAT_VEC3,
            GlslType::Vec4 => glow::FLOAT_VEC4,
            GlslType::IVec2 => glow::INT_VEC2,
            GlslType::IVec3 => glow::INT_VEC3,
            GlslType::IVec4 => glow::INT_VEC4,
            GlslType::Mat2 => glow::FLOAT_MAT2,
            GlslType::Mat3 => glow::FLOAT_MAT3,
            GlslType::Mat4 => glow::FLOAT_MAT4,
            GlslType::DMat2 => glow::DOUBLE_MAT2,
            GlslType::DMat3 => glow::DOUBLE_MAT3,
            GlslType::DMat4 => glow::DOUBLE_MAT4,
            GlslType::Sampler1D => glow::SAMPLER_1D,
            GlslType::Sampler2D => glow::SAMPLER_2D,
            GlslType::Sampler3D => glow::SAMPLER_3D,
            GlslType::SamplerCube => glow::SAMPLER_CUBE,
            GlslType::Sampler1DShadow => glow::SAMPLER_1D_SHADOW,
            GlslType::Sampler2DShadow => glow::SAMPLER_2D_SHADOW,
            GlslType::Sampler2DRect => glow::SAMPLER_2D_RECT,
            GlslType::Sampler2DRectShadow => glow::SAMPLER_2D_RECT_SHADOW,
            GlslType::SamplerCubeShadow => glow::SAMPLER_CUBE_SHADOW,
            GlslType::SamplerBuffer => glow::SAMPLER_BUFFER,
            GlslType::Sampler1DArray => glow::SAMPLER_1D_ARRAY,
            GlslType::Sampler2DArray => glow::SAMPLER_2D_ARRAY,
            GlslType::Sampler1DArrayShadow => glow::SAMPLER_1D_ARRAY_SHADOW,
            GlslType::Sampler2DArrayShadow => glow::SAMPLER_2D_ARRAY_SHADOW,
            GlslType::SamplerCubeArray => glow::SAMPLER_CUBE_MAP_ARRAY,
            GlslType::SamplerCubeArrayShadow => glow::SAMPLER_CUBE_MAP_ARRAY_SHADOW,
        }
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

/// A `layout(location = N) in TYPE NAME;` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub data_type: GlslType,
    pub name: String,
    pub location: u32,
}

impl VertexAttribute {
    pub fn new(data_type: GlslType, name: impl Into<String>, location: u32) -> Self {
        Self {
            data_type,
            name: name.into(),
            location,
        }
    }
}

/// Ordered vertex inputs of a shader, one interleaved vertex per stride.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexAttributes {
    attributes: Vec<VertexAttribute>,
    components: u32,
    byte_size: u32,
}

impl VertexAttributes {
    /// Validate that locations run `0..n` in order and names are unique.
    pub fn new(attributes: Vec<VertexAttribute>) -> GraphicsResult<Self> {
        let mut names = HashSet::with_capacity(attributes.len());
        for (i, attribute) in attributes.iter().enumerate() {
            if attribute.location as usize != i {
                return Err(GraphicsError::InvalidVertexLayout(format!(
                    "expected location {i} but found location {}",
                    attribute.location
                )));
            }
            if !names.insert(attribute.name.as_str()) {
                return Err(GraphicsError::InvalidVertexLayout(format!(
                    "duplicate name: {}",
                    attribute.name
                )));
            }
        }

        let components = attributes.iter().map(|a| a.data_type.components()).sum();
        let byte_size = attributes.iter().map(|a| a.data_type.byte_size()).sum();
        Ok(Self {
            attributes,
            components,
            byte_size,
        })
    }

    /// Scalar components per vertex.
    pub fn components(&self) -> u32 {
        self.components
    }

    /// Bytes per vertex, which is also the stride.
    pub fn byte_size(&self) -> u32 {
        self.byte_size
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VertexAttribute> {
        self.attributes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VertexAttribute> {
        self.attributes.iter()
    }

    /// Program and enable one attribute pointer per attribute on `vertex_array`.
    ///
    /// Attribute `i` reads from `buffers[i]`; once buffers run out the last one is reused,
    /// so a single buffer describes a fully interleaved layout.
    pub fn format(&self, vertex_array: &VertexArray, buffers: &[&Buffer]) -> GraphicsResult<()> {
        let Some(last) = buffers.last() else {
            return Err(GraphicsError::InvalidVertexLayout(
                "no vertex buffers supplied".to_string(),
            ));
        };

        let mut offset = 0;
        for (i, attribute) in self.attributes.iter().enumerate() {
            let buffer = buffers.get(i).unwrap_or(last);
            let pointer = AttribPointer {
                index: attribute.location,
                components: attribute.data_type.components(),
                kind: attribute.data_type.scalar_kind(),
                normalized: false,
                stride: self.byte_size,
                offset,
            };
            vertex_array.attribute_pointer(buffer, &pointer)?;
            vertex_array.enable_attribute(attribute.location)?;
            offset += attribute.data_type.byte_size();
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a VertexAttributes {
    type Item = &'a VertexAttribute;
    type IntoIter = std::slice::Iter<'a, VertexAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

/// A `uniform TYPE NAME;` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformAttribute {
    pub data_type: GlslType,
    pub name: String,
}

impl UniformAttribute {
    pub fn new(data_type: GlslType, name: impl Into<String>) -> Self {
        Self {
            data_type,
            name: name.into(),
        }
    }
}

/// Uniforms declared by a program, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniformAttributes {
    uniforms: Vec<UniformAttribute>,
}

impl UniformAttributes {
    pub fn new(uniforms: Vec<UniformAttribute>) -> GraphicsResult<Self> {
        let mut names = HashSet::with_capacity(uniforms.len());
        for uniform in &uniforms {
            if !names.insert(uniform.name.as_str()) {
                return Err(GraphicsError::DuplicateUniform(uniform.name.clone()));
            }
        }
        Ok(Self { uniforms })
    }

    pub fn get(&self, name: &str) -> Option<&UniformAttribute> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UniformAttribute> {
        self.uniforms.iter()
    }
}

impl<'a> IntoIterator for &'a UniformAttributes {
    type Item = &'a UniformAttribute;
    type IntoIter = std::slice::Iter<'a, UniformAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.uniforms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferTarget, GraphicsBackend, HeadlessBackend};
    use rstest::rstest;
    use std::rc::Rc;

    #[rstest]
    #[case::float(GlslType::Float, 1, 4)]
    #[case::short(GlslType::Short, 1, 2)]
    #[case::vec3(GlslType::Vec3, 3, 12)]
    #[case::ivec4(GlslType::IVec4, 4, 16)]
    #[case::mat3(GlslType::Mat3, 9, 36)]
    #[case::dmat2(GlslType::DMat2, 4, 32)]
    #[case::sampler(GlslType::Sampler2DArrayShadow, 1, 4)]
    fn test_type_sizes(#[case] ty: GlslType, #[case] components: u32, #[case] bytes: u32) {
        assert_eq!(ty.components(), components);
        assert_eq!(ty.byte_size(), bytes);
    }

    #[test]
    fn test_lookup_ignores_case() {
        for ty in GlslType::ALL {
            assert_eq!(GlslType::from_glsl_name(ty.glsl_name()), Some(ty));
        }
        assert_eq!(GlslType::from_glsl_name("SAMPLER2D"), Some(GlslType::Sampler2D));
        assert_eq!(GlslType::from_glsl_name("vec5"), None);
    }

    #[test]
    fn test_layout_totals() {
        let layout = VertexAttributes::new(vec![
            VertexAttribute::new(GlslType::Vec3, "position", 0),
            VertexAttribute::new(GlslType::Vec2, "uv", 1),
        ])
        .unwrap();
        assert_eq!(layout.components(), 5);
        assert_eq!(layout.byte_size(), 20);
    }

    #[test]
    fn test_layout_rejects_gaps() {
        let err = VertexAttributes::new(vec![
            VertexAttribute::new(GlslType::Vec3, "position", 0),
            VertexAttribute::new(GlslType::Vec2, "uv", 2),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid vertex layout: expected location 1 but found location 2"
        );
    }

    #[test]
    fn test_layout_rejects_duplicates() {
        let err = VertexAttributes::new(vec![
            VertexAttribute::new(GlslType::Vec3, "position", 0),
            VertexAttribute::new(GlslType::Vec3, "position", 1),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid vertex layout: duplicate name: position");
    }

    #[test]
    fn test_uniforms_reject_duplicates() {
        let err = UniformAttributes::new(vec![
            UniformAttribute::new(GlslType::Float, "time"),
            UniformAttribute::new(GlslType::Int, "time"),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphicsError::DuplicateUniform(name) if name == "time"));
    }

    #[test]
    fn test_format_interleaves_and_reuses_last_buffer() {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: Rc<dyn GraphicsBackend> = headless.clone();
        let vertex_array = VertexArray::new(&backend).unwrap();
        let buffer = Buffer::new(&backend, BufferTarget::Array).unwrap();
        let layout = VertexAttributes::new(vec![
            VertexAttribute::new(GlslType::Vec3, "position", 0),
            VertexAttribute::new(GlslType::Vec2, "uv", 1),
            VertexAttribute::new(GlslType::Float, "shade", 2),
        ])
        .unwrap();

        layout.format(&vertex_array, &[&buffer]).unwrap();

        let handle = vertex_array.handle().unwrap();
        let (uv, enabled) = headless.vertex_attribute(handle, 1).unwrap();
        assert!(enabled);
        assert_eq!(
            uv,
            Some(AttribPointer {
                index: 1,
                components: 2,
                kind: ScalarKind::Float,
                normalized: false,
                stride: 24,
                offset: 12,
            })
        );
        let (shade, _) = headless.vertex_attribute(handle, 2).unwrap();
        assert_eq!(shade.map(|p| p.offset), Some(20));
    }

    #[test]
    fn test_format_without_buffers() {
        let backend: Rc<dyn GraphicsBackend> = Rc::new(HeadlessBackend::new());
        let vertex_array = VertexArray::new(&backend).unwrap();
        let layout =
            VertexAttributes::new(vec![VertexAttribute::new(GlslType::Vec4, "color", 0)]).unwrap();
        assert!(layout.format(&vertex_array, &[]).is_err());
    }
}
