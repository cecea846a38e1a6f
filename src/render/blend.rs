use crate::{
    foundation::error::{PixreelError, PixreelResult},
    foundation::math::mul_div255_u8,
    render::surface::Bgra8,
};

/// Straight-alpha "source over destination" for one BGRA8 pixel.
///
/// `outA = srcA + dstA * (1 - srcA)`; color channels are blended premultiplied
/// and divided back by `outA`. A transparent source leaves `dst` untouched and an
/// opaque source replaces it outright.
pub fn over(dst: Bgra8, src: Bgra8) -> Bgra8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let da = u32::from(mul_div255_u8(u16::from(dst[3]), inv));
    let sa = u32::from(sa);
    let out_a = sa + da;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa + u32::from(dst[i]) * da;
        out[i] = ((num + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Scale the alpha of a straight-alpha pixel by `opacity` in `[0, 1]`.
pub fn with_opacity(px: Bgra8, opacity: f32) -> Bgra8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return px;
    }
    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    [px[0], px[1], px[2], mul_div255_u8(u16::from(px[3]), op)]
}

/// Alpha-over two equally sized BGRA8 buffers in place.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> PixreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PixreelError::render(
            "over_in_place expects equal-length bgra8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
