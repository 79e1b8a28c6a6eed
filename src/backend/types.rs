//! Common types shared between backends

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::fmt;

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
    Uniform,
    ShaderStorage,
    PixelUnpack,
}

impl BufferTarget {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER,
            BufferTarget::ShaderStorage => glow::SHADER_STORAGE_BUFFER,
            BufferTarget::PixelUnpack => glow::PIXEL_UNPACK_BUFFER,
        }
    }
}

/// Buffer data store usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    StaticDraw,
    #[default]
    DynamicDraw,
    StreamDraw,
    StaticRead,
    DynamicRead,
    StaticCopy,
}

impl BufferUsage {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
            BufferUsage::StaticRead => glow::STATIC_READ,
            BufferUsage::DynamicRead => glow::DYNAMIC_READ,
            BufferUsage::StaticCopy => glow::STATIC_COPY,
        }
    }
}

/// Access flags for a mapped buffer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapAccess(u32);

impl MapAccess {
    pub const READ: Self = Self(glow::MAP_READ_BIT);
    pub const WRITE: Self = Self(glow::MAP_WRITE_BIT);
    pub const READ_WRITE: Self = Self(glow::MAP_READ_BIT | glow::MAP_WRITE_BIT);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for MapAccess {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn to_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Scalar kind an attribute is fed to the shader as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float,
    Int,
    Short,
    Double,
    Sampler,
}

impl ScalarKind {
    pub fn to_gl(self) -> u32 {
        match self {
            ScalarKind::Float => glow::FLOAT,
            ScalarKind::Int | ScalarKind::Sampler => glow::INT,
            ScalarKind::Short => glow::SHORT,
            ScalarKind::Double => glow::DOUBLE,
        }
    }
}

/// One `glVertexAttribPointer` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
    pub index: u32,
    pub components: u32,
    pub kind: ScalarKind,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}

/// Texture storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    R8,
    Rg8,
    Rgb8,
    #[default]
    Rgba8,
    Rgba16Float,
    Rgba32Float,
    Depth24,
    Depth24Stencil8,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth24 | TextureFormat::Depth24Stencil8)
    }

    pub fn internal_gl(self) -> u32 {
        match self {
            TextureFormat::R8 => glow::R8,
            TextureFormat::Rg8 => glow::RG8,
            TextureFormat::Rgb8 => glow::RGB8,
            TextureFormat::Rgba8 => glow::RGBA8,
            TextureFormat::Rgba16Float => glow::RGBA16F,
            TextureFormat::Rgba32Float => glow::RGBA32F,
            TextureFormat::Depth24 => glow::DEPTH_COMPONENT24,
            TextureFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        }
    }

    /// Client-side pixel layout used for uploads
    pub fn pixel_gl(self) -> u32 {
        match self {
            TextureFormat::R8 => glow::RED,
            TextureFormat::Rg8 => glow::RG,
            TextureFormat::Rgb8 => glow::RGB,
            TextureFormat::Rgba8 | TextureFormat::Rgba16Float | TextureFormat::Rgba32Float => {
                glow::RGBA
            }
            TextureFormat::Depth24 => glow::DEPTH_COMPONENT,
            TextureFormat::Depth24Stencil8 => glow::DEPTH_STENCIL,
        }
    }

    pub fn channels(&self) -> u32 {
        match self {
            TextureFormat::R8 | TextureFormat::Depth24 => 1,
            TextureFormat::Rg8 | TextureFormat::Depth24Stencil8 => 2,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 | TextureFormat::Rgba16Float | TextureFormat::Rgba32Float => 4,
        }
    }
}

/// Component type of uploaded texel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    #[default]
    UnsignedByte,
    Float,
    UnsignedInt,
    UnsignedInt24_8,
}

impl PixelType {
    pub fn to_gl(self) -> u32 {
        match self {
            PixelType::UnsignedByte => glow::UNSIGNED_BYTE,
            PixelType::Float => glow::FLOAT,
            PixelType::UnsignedInt => glow::UNSIGNED_INT,
            PixelType::UnsignedInt24_8 => glow::UNSIGNED_INT_24_8,
        }
    }

    pub fn byte_size(&self) -> u32 {
        match self {
            PixelType::UnsignedByte => 1,
            PixelType::Float | PixelType::UnsignedInt | PixelType::UnsignedInt24_8 => 4,
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    NearestMipmapNearest,
    LinearMipmapLinear,
}

impl FilterMode {
    pub fn to_gl(self) -> i32 {
        (match self {
            FilterMode::Nearest => glow::NEAREST,
            FilterMode::Linear => glow::LINEAR,
            FilterMode::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }) as i32
    }
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

impl WrapMode {
    pub fn to_gl(self) -> i32 {
        (match self {
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        }) as i32
    }
}

/// Full description of a 2D texture image upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub mip_level: u32,
    pub format: TextureFormat,
    pub pixel_type: PixelType,
}

impl TextureDesc {
    /// Bytes a tightly packed upload for this image occupies.
    pub fn byte_len(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.format.channels() as usize
            * self.pixel_type.byte_size() as usize
    }
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    pub fn to_gl(self) -> u32 {
        match self {
            AttachmentPoint::Color(i) => glow::COLOR_ATTACHMENT0 + i,
            AttachmentPoint::Depth => glow::DEPTH_ATTACHMENT,
            AttachmentPoint::Stencil => glow::STENCIL_ATTACHMENT,
            AttachmentPoint::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
        }
    }
}

/// Raw `glCheckFramebufferStatus` result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferStatus(pub u32);

impl FramebufferStatus {
    pub const COMPLETE: Self = Self(glow::FRAMEBUFFER_COMPLETE);
    pub const INCOMPLETE_ATTACHMENT: Self = Self(glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT);
    pub const MISSING_ATTACHMENT: Self = Self(glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT);
    pub const UNSUPPORTED: Self = Self(glow::FRAMEBUFFER_UNSUPPORTED);
    pub const INCOMPLETE_MULTISAMPLE: Self = Self(glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE);

    pub fn is_complete(&self) -> bool {
        *self == Self::COMPLETE
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            glow::FRAMEBUFFER_COMPLETE => "COMPLETE",
            glow::FRAMEBUFFER_UNDEFINED => "UNDEFINED",
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "INCOMPLETE_ATTACHMENT",
            glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "INCOMPLETE_MISSING_ATTACHMENT",
            glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "INCOMPLETE_DRAW_BUFFER",
            glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "INCOMPLETE_READ_BUFFER",
            glow::FRAMEBUFFER_UNSUPPORTED => "UNSUPPORTED",
            glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "INCOMPLETE_MULTISAMPLE",
            glow::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "INCOMPLETE_LAYER_TARGETS",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.0)
    }
}

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

impl PrimitiveMode {
    pub fn to_gl(self) -> u32 {
        match self {
            PrimitiveMode::Points => glow::POINTS,
            PrimitiveMode::Lines => glow::LINES,
            PrimitiveMode::LineStrip => glow::LINE_STRIP,
            PrimitiveMode::Triangles => glow::TRIANGLES,
            PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
        }
    }
}

/// Buffers cleared by `glClear`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask(u32);

impl ClearMask {
    pub const COLOR: Self = Self(glow::COLOR_BUFFER_BIT);
    pub const DEPTH: Self = Self(glow::DEPTH_BUFFER_BIT);
    pub const STENCIL: Self = Self(glow::STENCIL_BUFFER_BIT);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for ClearMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Value uploaded to a shader uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
    IntArray(Vec<i32>),
}

macro_rules! impl_uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

impl_uniform_from! {
    f32 => Float,
    i32 => Int,
    bool => Bool,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    IVec2 => IVec2,
    IVec3 => IVec3,
    IVec4 => IVec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Vec<i32> => IntArray,
}

impl From<&[i32]> for UniformValue {
    fn from(value: &[i32]) -> Self {
        UniformValue::IntArray(value.to_vec())
    }
}
