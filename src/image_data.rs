//! Decoded image pixels for textures and window icons.

use crate::backend::TextureFormat;
use crate::error::{GraphicsError, GraphicsResult};
use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// Tightly packed RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl ImageData {
    /// Load and decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GraphicsResult<Self> {
        let img = image::open(path)?;
        Ok(Self::from_image(img))
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> GraphicsResult<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(img))
    }

    /// Wrap raw RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> GraphicsResult<Self> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(GraphicsError::InvalidOperation(format!(
                "{width}x{height} RGBA8 image needs {expected} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes,
            width,
            height,
            channels: 4,
        })
    }

    fn from_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            bytes: img.to_rgba8().into_raw(),
            width,
            height,
            channels: 4,
        }
    }

    /// A 1x1 image of a single color
    pub fn solid_color(color: [u8; 4]) -> Self {
        Self {
            bytes: color.to_vec(),
            width: 1,
            height: 1,
            channels: 4,
        }
    }

    /// Texture format matching the pixel layout.
    pub fn format(&self) -> TextureFormat {
        match self.channels {
            1 => TextureFormat::R8,
            2 => TextureFormat::Rg8,
            3 => TextureFormat::Rgb8,
            _ => TextureFormat::Rgba8,
        }
    }
}
