use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// One opaque output frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major. Alpha is always 255.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Opaque black frame.
    pub fn blank(canvas: Canvas) -> Self {
        let mut data = vec![0u8; canvas.rgba_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    pub fn from_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    pub fn into_image(self) -> ReelResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| ReelError::composition("frame buffer does not match its dimensions"))
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn write_png(&self, path: &Path) -> ReelResult<()> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write frame '{}'", path.display()))?;
        Ok(())
    }
}
