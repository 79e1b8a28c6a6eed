//! Backend abstraction layer
//!
//! Provides the driver trait plus an OpenGL implementation (via `glow`) and an in-memory
//! headless implementation used by tests and offscreen tools.

pub mod glow_backend;
pub mod headless;
pub mod traits;
pub mod types;

pub use glow_backend::GlowBackend;
pub use headless::{DrawCall, HeadlessBackend};
pub use traits::*;
pub use types::*;
