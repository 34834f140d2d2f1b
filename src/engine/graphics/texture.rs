use std::fs;
use std::path::Path;
use std::rc::Rc;

use image::DynamicImage;
use log::{debug, info};

use super::backend::{GraphicsBackend, PixelFormat, TextureFilter, TextureWrap};
use super::error::GraphicsError;

/// Pixels handed over by the image decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Reads and decodes an image file, flipped so row 0 is the bottom row
    /// as GL samples it.
    pub fn open(path: &Path) -> Result<Self, GraphicsError> {
        let bytes = fs::read(path).map_err(|source| GraphicsError::ResourceLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let img = image::load_from_memory(&bytes).map_err(|source| GraphicsError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_dynamic(img.flipv()))
    }

    /// Keeps three-channel images as RGB; everything else becomes RGBA.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        if img.color().channel_count() == 3 {
            Self { width, height, format: PixelFormat::Rgb8, pixels: img.into_rgb8().into_raw() }
        } else {
            Self { width, height, format: PixelFormat::Rgba8, pixels: img.into_rgba8().into_raw() }
        }
    }

    /// Two-tone RGBA checkerboard with `cell`-texel squares.
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let light = ((x / cell) + (y / cell)) % 2 == 0;
                let texel: [u8; 4] = if light { [230, 230, 230, 255] } else { [200, 40, 200, 255] };
                pixels.extend_from_slice(&texel);
            }
        }
        Self { width: size, height: size, format: PixelFormat::Rgba8, pixels }
    }

    pub fn channels(&self) -> u8 {
        self.format.channels()
    }
}

pub struct Texture2D<B: GraphicsBackend> {
    backend: Rc<B>,
    handle: B::Texture,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<B: GraphicsBackend> Texture2D<B> {
    pub fn load(backend: &Rc<B>, path: impl AsRef<Path>) -> Result<Self, GraphicsError> {
        let path = path.as_ref();
        let image = DecodedImage::open(path)?;
        info!(
            "[texture] Loaded texture: {}x{} ({} channels) from {}",
            image.width,
            image.height,
            image.channels(),
            path.display()
        );
        Self::from_image(backend, &image)
    }

    /// Fallback used when a lesson texture is missing. Sampled nearest and
    /// clamped so the cells keep hard edges.
    pub fn checkerboard(backend: &Rc<B>) -> Result<Self, GraphicsError> {
        let image = DecodedImage::checkerboard(64, 8);
        Self::from_image_with(backend, &image, TextureWrap::ClampToEdge, TextureFilter::Nearest)
    }

    /// Uploads `image` with repeat wrapping, linear filtering and mipmaps.
    pub fn from_image(backend: &Rc<B>, image: &DecodedImage) -> Result<Self, GraphicsError> {
        Self::from_image_with(backend, image, TextureWrap::Repeat, TextureFilter::Linear)
    }

    pub fn from_image_with(
        backend: &Rc<B>,
        image: &DecodedImage,
        wrap: TextureWrap,
        filter: TextureFilter,
    ) -> Result<Self, GraphicsError> {
        let handle = backend
            .create_texture()
            .map_err(|reason| GraphicsError::ObjectCreation { what: "texture", reason })?;
        backend.bind_texture_2d(Some(handle));
        backend.tex_parameters_2d(wrap, filter);
        backend.tex_image_2d(image.width, image.height, image.format, &image.pixels);
        backend.generate_mipmap_2d();
        backend.bind_texture_2d(None);
        debug!("[texture] uploaded {:?} as {:?}", image.format, handle);
        Ok(Self {
            backend: Rc::clone(backend),
            handle,
            width: image.width,
            height: image.height,
            format: image.format,
        })
    }

    /// Binds to texture unit `unit`; samplers select it with an int uniform.
    pub fn bind(&self, unit: u32) {
        self.backend.active_texture(unit);
        self.backend.bind_texture_2d(Some(self.handle));
    }

    pub fn handle(&self) -> B::Texture {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

impl<B: GraphicsBackend> Drop for Texture2D<B> {
    fn drop(&mut self) {
        self.backend.delete_texture(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::headless::HeadlessBackend;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("learngl-texture-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_rgb_image_keeps_three_channels_and_flips() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let path = temp_path("top-left-red.png");
        img.save(&path).unwrap();

        let decoded = DecodedImage::open(&path).unwrap();
        assert_eq!(decoded.format, PixelFormat::Rgb8);
        assert_eq!(decoded.pixels.len(), 12);
        // Top-left texel ends up in the last row after the flip.
        assert_eq!(&decoded.pixels[6..9], &[255, 0, 0]);
    }

    #[test]
    fn test_rgba_image_uploads_to_unit() {
        let backend = Rc::new(HeadlessBackend::new());
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 4])));
        let texture = Texture2D::from_image(&backend, &DecodedImage::from_dynamic(img)).unwrap();
        texture.bind(1);

        assert_eq!(backend.bound_texture(1), Some(texture.handle()));
        let info = backend.texture(texture.handle()).unwrap();
        assert_eq!((info.width, info.height, info.format), (4, 2, PixelFormat::Rgba8));
        assert_eq!(info.wrap, Some(TextureWrap::Repeat));
        assert!(info.mipmapped);
        assert_eq!(backend.take_error(), None);
    }

    #[test]
    fn test_missing_and_corrupt_files_are_distinguished() {
        let backend = Rc::new(HeadlessBackend::new());
        let missing = temp_path("nope.png");
        assert!(matches!(
            Texture2D::load(&backend, &missing).err().unwrap(),
            GraphicsError::ResourceLoad { .. }
        ));

        let corrupt = temp_path("corrupt.png");
        fs::write(&corrupt, b"not an image").unwrap();
        assert!(matches!(
            Texture2D::load(&backend, &corrupt).err().unwrap(),
            GraphicsError::ImageDecode { .. }
        ));
        assert_eq!(backend.live_objects().textures, 0);
    }

    #[test]
    fn test_checkerboard_alternates_cells() {
        let image = DecodedImage::checkerboard(4, 2);
        assert_eq!(image.pixels.len(), 64);
        assert_ne!(image.pixels[0..4], image.pixels[8..12]);
        assert_eq!(image.pixels[0..4], image.pixels[40..44]);
    }

    #[test]
    fn test_drop_releases_texture() {
        let backend = Rc::new(HeadlessBackend::new());
        let texture = Texture2D::checkerboard(&backend).unwrap();
        texture.bind(0);
        let info = backend.texture(texture.handle()).unwrap();
        assert_eq!(info.wrap, Some(TextureWrap::ClampToEdge));
        assert_eq!(info.filter, Some(TextureFilter::Nearest));
        drop(texture);
        assert_eq!(backend.live_objects().textures, 0);
        assert_eq!(backend.bound_texture(0), None);
    }
}
