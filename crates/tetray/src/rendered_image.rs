//! Rendered images and saving them to disk.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use image::{ImageBuffer, Rgba as ImageRgba};

/// One premultiplied RGBA pixel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Straight-alpha 8-bit channels.
    pub fn to_rgba8(self) -> [u8; 4] {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a <= 0.0 {
            return [0, 0, 0, 0];
        }
        [
            to_u8(self.r / self.a),
            to_u8(self.g / self.a),
            to_u8(self.b / self.a),
            to_u8(self.a),
        ]
    }
}

impl From<glam::DVec4> for Rgba {
    fn from(v: glam::DVec4) -> Self {
        Self {
            r: v.x as f32,
            g: v.y as f32,
            b: v.z as f32,
            a: v.w as f32,
        }
    }
}

/// A rendered image. Row 0 is the bottom row, matching pixel `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl RenderedImage {
    /// A transparent image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width * height],
        }
    }

    /// Image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row by row from the bottom.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    /// Sets pixel `(x, y)`.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: Rgba) {
        self.pixels[y * self.width + x] = value;
    }

    /// Raw `f32` channel data.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Number of pixels with non-zero opacity.
    pub fn coverage(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0.0).count()
    }

    /// Straight-alpha 8-bit RGBA with the top row first.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for row in self.pixels.chunks_exact(self.width.max(1)).rev() {
            out.extend(row.iter().flat_map(|p| p.to_rgba8()));
        }
        out
    }

    fn buffer(&self) -> Result<ImageBuffer<ImageRgba<u8>, Vec<u8>>, ImageError> {
        let width = u32::try_from(self.width).map_err(|_| ImageError::InvalidImageData)?;
        let height = u32::try_from(self.height).map_err(|_| ImageError::InvalidImageData)?;
        ImageBuffer::from_raw(width, height, self.to_rgba8()).ok_or(ImageError::InvalidImageData)
    }

    /// Saves the image. The format follows the extension (`png`, `jpg`, `jpeg`).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let img = self.buffer()?;
        match extension.as_str() {
            "png" => img.save_with_format(path, image::ImageFormat::Png)?,
            "jpg" | "jpeg" => {
                // JPEG has no alpha channel
                let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
                rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
            }
            _ => return Err(ImageError::UnsupportedFormat(extension)),
        }
        log::info!("saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Encodes the image as PNG in memory.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ImageError> {
        let img = self.buffer()?;
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

/// Error type for image output.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to write image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Encoding(#[from] image::ImageError),

    #[error("unsupported image format: {0:?}")]
    UnsupportedFormat(String),

    #[error("invalid image data")]
    InvalidImageData,
}
