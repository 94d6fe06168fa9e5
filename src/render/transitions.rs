use image::imageops::FilterType;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{lerp_u8, weight_u8};
use crate::render::frame::FrameRGBA;

const ZOOM_STRENGTH: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Fade,
    SlideLeft,
    SlideRight,
    ZoomIn,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 4] = [
        TransitionKind::Fade,
        TransitionKind::SlideLeft,
        TransitionKind::SlideRight,
        TransitionKind::ZoomIn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::SlideLeft => "slide_left",
            Self::SlideRight => "slide_right",
            Self::ZoomIn => "zoom_in",
        }
    }

    /// Uniform pick over all kinds.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame between `a` and `b` at `progress` in `[0, 1]`.
///
/// Both endpoints are exact for every kind: `progress <= 0` is `a`, `progress >= 1` is `b`.
pub fn transition(
    a: &FrameRGBA,
    b: &FrameRGBA,
    kind: TransitionKind,
    progress: f32,
) -> ReelResult<FrameRGBA> {
    if a.width != b.width || a.height != b.height || a.data.len() != b.data.len() {
        return Err(ReelError::composition(format!(
            "transition expects equal frame sizes, got {}x{} and {}x{}",
            a.width, a.height, b.width, b.height
        )));
    }
    if progress.is_nan() || progress <= 0.0 {
        return Ok(a.clone());
    }
    if progress >= 1.0 {
        return Ok(b.clone());
    }

    match kind {
        TransitionKind::Fade => Ok(fade(a, b, progress)),
        TransitionKind::SlideLeft => Ok(slide(a, b, progress, true)),
        TransitionKind::SlideRight => Ok(slide(a, b, progress, false)),
        TransitionKind::ZoomIn => zoom_in(a, b, progress),
    }
}

fn fade(a: &FrameRGBA, b: &FrameRGBA, progress: f32) -> FrameRGBA {
    let tt = weight_u8(progress);
    let data = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(&x, &y)| lerp_u8(x, y, tt))
        .collect();
    FrameRGBA {
        width: a.width,
        height: a.height,
        data,
    }
}

fn slide(a: &FrameRGBA, b: &FrameRGBA, progress: f32, leftwards: bool) -> FrameRGBA {
    let w = a.width as usize;
    let offset = ((progress * a.width as f32).floor() as usize).min(w);
    let keep = w - offset;
    let row_bytes = w * 4;

    let mut data = vec![0u8; a.data.len()];
    for ((out, ra), rb) in data
        .chunks_exact_mut(row_bytes)
        .zip(a.data.chunks_exact(row_bytes))
        .zip(b.data.chunks_exact(row_bytes))
    {
        if leftwards {
            // A moves out to the left, B enters from the right.
            out[..keep * 4].copy_from_slice(&ra[offset * 4..]);
            out[keep * 4..].copy_from_slice(&rb[..offset * 4]);
        } else {
            out[..offset * 4].copy_from_slice(&rb[keep * 4..]);
            out[offset * 4..].copy_from_slice(&ra[..keep * 4]);
        }
    }
    FrameRGBA {
        width: a.width,
        height: a.height,
        data,
    }
}

fn zoom_in(a: &FrameRGBA, b: &FrameRGBA, progress: f32) -> ReelResult<FrameRGBA> {
    let blended = fade(a, b, progress);
    let (w, h) = (a.width, a.height);
    let scale = 1.0 + ZOOM_STRENGTH * progress;
    let sw = ((w as f32 * scale) as u32).max(w);
    let sh = ((h as f32 * scale) as u32).max(h);
    if (sw, sh) == (w, h) {
        return Ok(blended);
    }

    let img = blended.into_image()?;
    let scaled = image::imageops::resize(&img, sw, sh, FilterType::Triangle);
    let left = (sw - w) / 2;
    let top = (sh - h) / 2;
    let cropped = image::imageops::crop_imm(&scaled, left, top, w, h).to_image();
    Ok(FrameRGBA::from_image(cropped))
}

#[cfg(test)]
#[path = "../../tests/unit/render/transitions.rs"]
mod tests;
