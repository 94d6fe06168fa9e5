pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Quantize a blend weight in `[0, 1]` to `0..=255`.
pub(crate) fn weight_u8(t: f32) -> u16 {
    ((t.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

/// `a*(1-t) + b*t` on u8 channels with `t` quantized to 1/255 steps.
///
/// `t == 0` returns `a` exactly and `t == 1` returns `b` exactly.
pub(crate) fn lerp_u8(a: u8, b: u8, tt: u16) -> u8 {
    let it = 255u16 - tt;
    let v = mul_div255_u16(u16::from(a), it) + mul_div255_u16(u16::from(b), tt);
    v.min(255) as u8
}

/// Scale a channel by `keep/255`, used for darkening under the caption band.
pub(crate) fn scale_u8(c: u8, keep: u16) -> u8 {
    mul_div255_u16(u16::from(c), keep).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
