//! Crate-wide error type.

use crate::backend::types::{FramebufferStatus, ShaderStage};
use thiserror::Error;

/// Errors raised by mesh storage, GL object wrappers and the window layer.
#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error("expected a direct buffer, received a managed heap buffer")]
    IndirectBuffer,
    #[error("range {offset}..{offset}+{len} exceeds buffer length {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },
    #[error("view was opened read-only")]
    ReadOnlyView,
    #[error("another view of this storage is still open")]
    ViewOutstanding,
    #[error("{0} has been closed")]
    Closed(&'static str),
    #[error("index {index} shifted by {offset} overflows u32")]
    IndexOverflow { index: u32, offset: u64 },
    #[error("mesh {index} could not be batched: {source}")]
    BatchSource {
        index: usize,
        #[source]
        source: Box<GraphicsError>,
    },

    #[error("failed to create {kind}: {message}")]
    ResourceCreation { kind: &'static str, message: String },
    #[error("failed to map buffer: {0}")]
    MapFailed(String),
    #[error("mapped pointer is not aligned for {0}")]
    MisalignedMapping(&'static str),
    #[error("failed to unmap buffer: {0}")]
    UnmapFailed(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("shader linkage failed: {0}")]
    ShaderLinkage(String),
    #[error("framebuffer incomplete: {0}")]
    FramebufferIncomplete(FramebufferStatus),

    #[error("invalid vertex layout: {0}")]
    InvalidVertexLayout(String),
    #[error("unrecognized {kind} attribute data type: {name}")]
    UnknownDataType { kind: &'static str, name: String },
    #[error("duplicate uniform `{0}`")]
    DuplicateUniform(String),
    #[error("texture dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("material is not compatible with shader: missing uniform `{0}`")]
    IncompatibleMaterial(String),

    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error("window error: {0}")]
    Window(String),
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;

impl GraphicsError {
    /// Tags an error with the position of the batch source that produced it.
    pub(crate) fn at_source(self, index: usize) -> Self {
        Self::BatchSource {
            index,
            source: Box::new(self),
        }
    }
}
