//! Owning wrappers around GL objects.
//!
//! Every wrapper holds the backend it was created with and deletes its object on drop.
//! `close()` deletes early and is safe to call repeatedly.

mod buffer;
mod frame_buffer;
mod render_buffer;
mod shader;
mod texture;
mod vertex_array;

pub use buffer::{Buffer, MappedRange};
pub use frame_buffer::{FrameBuffer, FrameBufferAttachment};
pub use render_buffer::RenderBuffer;
pub use shader::ShaderProgram;
pub use texture::{Texture, TextureConfig, TextureDimensions, TextureFilter};
pub use vertex_array::VertexArray;
