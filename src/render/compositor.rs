use std::path::Path;

use image::imageops::FilterType;

use crate::assets::decode::load_rgba;
use crate::foundation::core::Canvas;
use crate::render::caption::Captioner;
use crate::render::frame::FrameRGBA;

/// Centre-crop `img` to the canvas aspect ratio, then scale the crop to exactly `canvas`.
///
/// Cropping happens in source pixels first, so the working buffer never exceeds the larger of
/// the source and the canvas whatever the source aspect ratio is.
pub fn fit_to_canvas(img: &image::RgbaImage, canvas: Canvas) -> image::RgbaImage {
    let (w, h) = img.dimensions();
    let (cw, ch) = (canvas.width, canvas.height);
    if w == 0 || h == 0 || cw == 0 || ch == 0 {
        return image::RgbaImage::from_pixel(cw, ch, image::Rgba([0, 0, 0, 255]));
    }

    let target_aspect = canvas.aspect();
    let img_aspect = f64::from(w) / f64::from(h);
    let (sw, sh) = if img_aspect > target_aspect {
        (((f64::from(h) * target_aspect).round() as u32).clamp(1, w), h)
    } else {
        (w, ((f64::from(w) / target_aspect).round() as u32).clamp(1, h))
    };
    let left = (w - sw) / 2;
    let top = (h - sh) / 2;
    let region = image::imageops::crop_imm(img, left, top, sw, sh).to_image();

    if (sw, sh) == (cw, ch) {
        region
    } else {
        image::imageops::resize(&region, cw, ch, FilterType::Lanczos3)
    }
}

/// Composite one still: decode, fit, and optionally caption.
///
/// An unreadable image yields a black frame so one bad file never aborts a render.
pub fn compose_still(
    path: &Path,
    caption: Option<&str>,
    canvas: Canvas,
    captioner: &Captioner,
) -> FrameRGBA {
    let mut img = match load_rgba(path) {
        Ok(src) => fit_to_canvas(&src, canvas),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable image, using blank frame");
            return FrameRGBA::blank(canvas);
        }
    };

    if let Some(text) = caption {
        captioner.draw(&mut img, text);
    }
    FrameRGBA::from_image(img)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
