use std::path::Path;

use anyhow::Context;

use crate::foundation::error::ReelResult;

/// Sniff `bytes` for a known raster format. Used to reject HTML error pages served with 200.
pub fn looks_like_image(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Decode an image file into opaque RGBA8, sniffing the format from content rather than the
/// file extension (cache entries are all named `.jpg`).
pub fn load_rgba(path: &Path) -> ReelResult<image::RgbaImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniff image format '{}'", path.display()))?
        .decode()
        .with_context(|| format!("decode image '{}'", path.display()))?;
    let mut rgba = img.to_rgba8();
    flatten_onto_black(&mut rgba);
    Ok(rgba)
}

/// Video frames carry no alpha: premultiply against black and force full opacity.
fn flatten_onto_black(rgba: &mut image::RgbaImage) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
        px[3] = 255;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
