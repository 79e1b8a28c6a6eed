//! 2D textures.

use crate::backend::{
    FilterMode, GraphicsBackend, PixelType, TextureDesc, TextureFormat, TextureHandle, WrapMode,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::image_data::ImageData;
use std::rc::Rc;

/// Width and height of a texture or renderbuffer, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDimensions {
    width: u32,
    height: u32,
}

impl TextureDimensions {
    pub fn new(width: u32, height: u32) -> GraphicsResult<Self> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Minification and magnification filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFilter {
    pub min: FilterMode,
    pub mag: FilterMode,
}

impl TextureFilter {
    pub const NEAREST: Self = Self {
        min: FilterMode::Nearest,
        mag: FilterMode::Nearest,
    };
}

/// Storage parameters of a texture image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureConfig {
    pub mip_level: u32,
    pub pixel_type: PixelType,
    pub format: TextureFormat,
}

/// An owned 2D texture object.
pub struct Texture {
    backend: Rc<dyn GraphicsBackend>,
    handle: Option<TextureHandle>,
    dimensions: TextureDimensions,
    config: TextureConfig,
}

impl Texture {
    /// Allocate a texture with undefined contents.
    pub fn new(
        backend: &Rc<dyn GraphicsBackend>,
        dimensions: TextureDimensions,
        filter: TextureFilter,
        config: TextureConfig,
    ) -> GraphicsResult<Self> {
        let texture = Self::create(backend, dimensions, filter, config)?;
        texture.upload_image(None)?;
        Ok(texture)
    }

    /// Upload decoded image pixels as an RGBA8 texture that repeats outside `0..1`.
    pub fn from_image(
        backend: &Rc<dyn GraphicsBackend>,
        image: &ImageData,
        filter: TextureFilter,
    ) -> GraphicsResult<Self> {
        let dimensions = TextureDimensions::new(image.width, image.height)?;
        let config = TextureConfig {
            format: image.format(),
            ..TextureConfig::default()
        };
        let texture = Self::create(backend, dimensions, filter, config)?;
        backend.texture_wrap(texture.handle()?, WrapMode::Repeat);
        texture.upload_image(Some(&image.bytes))?;
        Ok(texture)
    }

    fn create(
        backend: &Rc<dyn GraphicsBackend>,
        dimensions: TextureDimensions,
        filter: TextureFilter,
        config: TextureConfig,
    ) -> GraphicsResult<Self> {
        let handle = backend.create_texture()?;
        backend.texture_filter(handle, filter.min, filter.mag);
        log::debug!(
            "Created texture {handle:?} ({}x{} {:?})",
            dimensions.width,
            dimensions.height,
            config.format
        );
        Ok(Self {
            backend: Rc::clone(backend),
            handle: Some(handle),
            dimensions,
            config,
        })
    }

    fn upload_image(&self, pixels: Option<&[u8]>) -> GraphicsResult<()> {
        let desc = TextureDesc {
            width: self.dimensions.width,
            height: self.dimensions.height,
            mip_level: self.config.mip_level,
            format: self.config.format,
            pixel_type: self.config.pixel_type,
        };
        self.backend.texture_image_2d(self.handle()?, &desc, pixels)
    }

    /// Replace the whole image with tightly packed `pixels`.
    pub fn upload(&self, pixels: &[u8]) -> GraphicsResult<()> {
        self.upload_image(Some(pixels))
    }

    pub fn handle(&self) -> GraphicsResult<TextureHandle> {
        self.handle.ok_or(GraphicsError::Closed("texture"))
    }

    pub fn dimensions(&self) -> TextureDimensions {
        self.dimensions
    }

    pub fn config(&self) -> TextureConfig {
        self.config
    }

    pub fn set_wrap(&self, wrap: WrapMode) -> GraphicsResult<()> {
        self.backend.texture_wrap(self.handle()?, wrap);
        Ok(())
    }

    pub fn bind(&self) -> GraphicsResult<()> {
        self.backend.bind_texture(None, Some(self.handle()?));
        Ok(())
    }

    /// Bind to texture unit `slot`.
    pub fn bind_to_slot(&self, slot: u32) -> GraphicsResult<()> {
        self.backend.bind_texture(Some(slot), Some(self.handle()?));
        Ok(())
    }

    pub fn unbind(&self) {
        self.backend.bind_texture(None, None);
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.delete_texture(handle);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn test_dimensions_must_be_positive() {
        assert!(TextureDimensions::new(1, 1).is_ok());
        assert!(matches!(
            TextureDimensions::new(0, 16),
            Err(GraphicsError::InvalidDimensions {
                width: 0,
                height: 16
            })
        ));
    }

    #[test]
    fn test_defaults() {
        let filter = TextureFilter::default();
        assert_eq!(filter.min, FilterMode::Linear);
        assert_eq!(filter.mag, FilterMode::Linear);

        let config = TextureConfig::default();
        assert_eq!(config.mip_level, 0);
        assert_eq!(config.pixel_type, PixelType::UnsignedByte);
        assert_eq!(config.format, TextureFormat::Rgba8);
    }

    #[test]
    fn test_from_image_repeats() {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: Rc<dyn GraphicsBackend> = headless.clone();
        let image = ImageData::from_rgba8(2, 1, vec![255; 8]).unwrap();

        let texture = Texture::from_image(&backend, &image, TextureFilter::NEAREST).unwrap();
        let handle = texture.handle().unwrap();

        let desc = headless.texture_desc(handle).unwrap();
        assert_eq!((desc.width, desc.height), (2, 1));
        assert_eq!(
            headless.texture_sampling(handle),
            Some((FilterMode::Nearest, FilterMode::Nearest, WrapMode::Repeat))
        );
    }

    #[test]
    fn test_short_upload_rejected() {
        let backend: Rc<dyn GraphicsBackend> = Rc::new(HeadlessBackend::new());
        let texture = Texture::new(
            &backend,
            TextureDimensions::new(4, 4).unwrap(),
            TextureFilter::default(),
            TextureConfig::default(),
        )
        .unwrap();
        assert!(texture.upload(&[0; 16]).is_err());
    }
}
