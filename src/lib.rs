//! Nebula Graphics - OpenGL resource wrappers with mesh batching
//!
//! The crate wraps OpenGL objects in owning handles that release their driver resources
//! when closed or dropped, and provides meshes that live either on the GPU or in host memory
//! behind one storage interface.
//!
//! # Features
//! - RAII buffers, vertex arrays, textures, render buffers, frame buffers and shader programs
//! - GPU and host-resident meshes with mapped or borrowed views over their data
//! - Concatenation of many meshes into one batch with rebased indices
//! - Vertex layouts and uniforms parsed from GLSL source
//! - Instanced rendering of material batches
//! - A windowed OpenGL context via winit and glutin (feature `window`)
//!
//! Every object talks to the driver through [`GraphicsBackend`]. [`GlowBackend`] drives a real
//! context; [`HeadlessBackend`] emulates one in memory and backs the test suite.

pub mod backend;
pub mod batch;
pub mod debug;
pub mod error;
pub mod hints;
pub mod image_data;
pub mod layout;
pub mod memory;
pub mod mesh;
pub mod model;
pub mod objects;

#[cfg(feature = "window")]
pub mod window;

pub use backend::{GlowBackend, GraphicsBackend, HeadlessBackend};
pub use batch::{batch_meshes, concatenate_into, default_index_buffer};
pub use error::{GraphicsError, GraphicsResult};
pub use hints::{WindowHint, WindowHints};
pub use image_data::ImageData;
pub use layout::{GlslType, UniformAttribute, UniformAttributes, VertexAttribute, VertexAttributes};
pub use memory::HostBuffer;
pub use mesh::{GpuMesh, Mesh, MeshStorage, MeshView, NativeMesh, ReadPolicy};
pub use model::{InstanceId, Material, Model, ShaderMaterial};
pub use objects::{
    Buffer, FrameBuffer, MappedRange, RenderBuffer, ShaderProgram, Texture, TextureDimensions,
    VertexArray,
};
#[cfg(feature = "window")]
pub use window::Window;

/// Environment variable that requests a debug context
pub const DEBUG_ENV_VAR: &str = "NEBULA_GL_DEBUG";

/// Configuration for creating a window and its OpenGL context
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Wait for vertical blank when swapping
    pub vsync: bool,
    /// Requested core profile version as (major, minor)
    pub gl_version: (u8, u8),
    /// Request a debug context and route driver messages to the log
    pub debug: bool,
    pub hints: WindowHints,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            title: "Nebula".to_string(),
            width: 500,
            height: 500,
            vsync: true,
            gl_version: (4, 3),
            debug: debug_requested(std::env::var(DEBUG_ENV_VAR).ok().as_deref()),
            hints: WindowHints::default_hints(),
        }
    }
}

/// Whether a [`DEBUG_ENV_VAR`] value enables debug output.
fn debug_requested(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// Install `env_logger`, defaulting to the `info` level when `RUST_LOG` is unset.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_requested() {
        assert!(debug_requested(Some("1")));
        assert!(debug_requested(Some("TRUE")));
        assert!(debug_requested(Some(" on ")));
        assert!(!debug_requested(Some("0")));
        assert!(!debug_requested(Some("")));
        assert!(!debug_requested(None));
    }

    #[test]
    fn test_default_config() {
        let config = ContextConfig::default();
        assert_eq!(config.title, "Nebula");
        assert_eq!((config.width, config.height), (500, 500));
        assert_eq!(config.gl_version, (4, 3));
        assert!(config.vsync);
        assert_eq!(config.hints, WindowHints::default_hints());
    }
}
