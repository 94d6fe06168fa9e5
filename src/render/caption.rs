//! Caption band: darkened strip along the bottom with centred white text.
//!
//! Text goes through usvg/resvg so glyph shaping and font fallback come from the system font
//! database rather than a bundled bitmap font.

use std::sync::Arc;

use crate::foundation::math::{mul_div255_u16, scale_u8};

/// Fraction of the frame height covered by the caption band.
const BAND_FRACTION: f64 = 0.12;
/// Channel multiplier inside the band (about 70% black overlay).
const BAND_KEEP: u16 = 77;
const FONT_FRACTION: f32 = 0.5;
const MAX_TEXT_WIDTH: f32 = 0.9;

pub fn band_height(frame_height: u32) -> u32 {
    (f64::from(frame_height) * BAND_FRACTION) as u32
}

#[derive(Clone)]
pub struct Captioner {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for Captioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Captioner")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for Captioner {
    fn default() -> Self {
        Self::with_system_fonts()
    }
}

impl Captioner {
    pub fn with_system_fonts() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if db.is_empty() {
            tracing::warn!("no system fonts found, captions will render without text");
        }
        Self { fontdb: Arc::new(db) }
    }

    pub fn with_fontdb(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fontdb }
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Darken the bottom band of `img` and draw `text` centred in it.
    pub fn draw(&self, img: &mut image::RgbaImage, text: &str) {
        let (w, h) = img.dimensions();
        let band = band_height(h);
        if band == 0 || w == 0 {
            return;
        }
        let top = h - band;

        for y in top..h {
            for x in 0..w {
                let px = img.get_pixel_mut(x, y);
                px[0] = scale_u8(px[0], BAND_KEEP);
                px[1] = scale_u8(px[1], BAND_KEEP);
                px[2] = scale_u8(px[2], BAND_KEEP);
            }
        }

        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(pixmap) = self.rasterize(text, w, band) else {
            return;
        };

        for (i, src) in pixmap.data().chunks_exact(4).enumerate() {
            let a = u16::from(src[3]);
            if a == 0 {
                continue;
            }
            let x = (i as u32) % w;
            let y = top + (i as u32) / w;
            let dst = img.get_pixel_mut(x, y);
            let inv = 255 - a;
            // Pixmap data is premultiplied.
            for c in 0..3 {
                let v = u16::from(src[c]) + mul_div255_u16(u16::from(dst[c]), inv);
                dst[c] = v.min(255) as u8;
            }
        }
    }

    fn rasterize(&self, text: &str, width: u32, band: u32) -> Option<resvg::tiny_skia::Pixmap> {
        let mut font_size = band as f32 * FONT_FRACTION;
        let mut tree = self.layout(text, width, band, font_size)?;

        let max_w = width as f32 * MAX_TEXT_WIDTH;
        let text_w = tree.root().abs_bounding_box().width();
        if text_w > max_w {
            font_size *= max_w / text_w;
            tree = self.layout(text, width, band, font_size)?;
        }

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, band)?;
        resvg::render(&tree, resvg::tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        Some(pixmap)
    }

    fn layout(&self, text: &str, width: u32, band: u32, font_size: f32) -> Option<usvg::Tree> {
        // Baseline sits a little below centre so cap height is visually centred.
        let baseline = band as f32 / 2.0 + font_size * 0.35;
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{band}"><text x="{cx}" y="{baseline}" font-family="sans-serif" font-size="{font_size}" fill="white" text-anchor="middle">{body}</text></svg>"#,
            cx = width as f32 / 2.0,
            body = escape_xml(text),
        );
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: caption_font_resolver(),
            ..Default::default()
        };
        match usvg::Tree::from_str(&svg, &opts) {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(error = %e, "caption layout failed");
                None
            }
        }
    }
}

/// Requested families first, then any installed face, so captions still render on systems
/// without the default "Arial" sans-serif mapping.
fn caption_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
