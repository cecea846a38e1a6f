use crate::{
    foundation::core::Vec2,
    foundation::math::clamp_u8,
    render::surface::{Bgra8, Surface},
    timeline::stage::CaptureRect,
};

/// Resampling filter used when the stage maps its capture rectangle to the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScalingAlgorithm {
    /// Point sampling; keeps pixel art crisp.
    #[default]
    NearestNeighbor,
    /// 2x2 linear filter.
    Bilinear,
    /// 4x4 Catmull-Rom filter.
    Bicubic,
}

/// Sample `rect` of `src` into a new `out_width x out_height` surface.
///
/// Source pixels outside `src` read as fully transparent.
pub fn sample_rect(
    src: &Surface,
    rect: CaptureRect,
    out_width: u32,
    out_height: u32,
    algorithm: ScalingAlgorithm,
) -> Surface {
    let mut out = Surface::new(out_width, out_height);
    if out_width == 0 || out_height == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
        return out;
    }
    let step_x = rect.width / f64::from(out_width);
    let step_y = rect.height / f64::from(out_height);

    for oy in 0..out_height {
        let sy = rect.y + (f64::from(oy) + 0.5) * step_y;
        for ox in 0..out_width {
            let sx = rect.x + (f64::from(ox) + 0.5) * step_x;
            let px = match algorithm {
                ScalingAlgorithm::NearestNeighbor => nearest(src, sx, sy),
                ScalingAlgorithm::Bilinear => bilinear(src, sx, sy),
                ScalingAlgorithm::Bicubic => bicubic(src, sx, sy),
            };
            out.set_pixel(i64::from(ox), i64::from(oy), px);
        }
    }
    out
}

/// Alpha-over `src` onto `dst`, scaled by `scale` with nearest-neighbour
/// sampling, top-left at `origin`.
pub fn draw_scaled_nearest(dst: &mut Surface, src: &Surface, origin: Vec2, scale: Vec2) {
    if !(scale.x > 0.0 && scale.y > 0.0) || !scale.is_finite() || !origin.is_finite() {
        return;
    }
    let out_w = (f64::from(src.width()) * scale.x).round() as i64;
    let out_h = (f64::from(src.height()) * scale.y).round() as i64;
    let ox = origin.x.round() as i64;
    let oy = origin.y.round() as i64;

    let x_lo = 0.max(-ox);
    let x_hi = out_w.min(i64::from(dst.width()) - ox);
    let y_lo = 0.max(-oy);
    let y_hi = out_h.min(i64::from(dst.height()) - oy);

    for dy in y_lo..y_hi {
        let sy = ((dy as f64 + 0.5) / scale.y).floor() as i64;
        for dx in x_lo..x_hi {
            let sx = ((dx as f64 + 0.5) / scale.x).floor() as i64;
            let Some(px) = src.pixel(sx, sy) else {
                continue;
            };
            if px[3] == 0 {
                continue;
            }
            dst.blend_pixel(ox + dx, oy + dy, px);
        }
    }
}

fn nearest(src: &Surface, sx: f64, sy: f64) -> Bgra8 {
    src.pixel(sx.floor() as i64, sy.floor() as i64)
        .unwrap_or([0, 0, 0, 0])
}

fn bilinear(src: &Surface, sx: f64, sy: f64) -> Bgra8 {
    let u = sx - 0.5;
    let v = sy - 0.5;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = Accum::default();
    for (dy, wy) in [(0, 1.0 - fy), (1, fy)] {
        for (dx, wx) in [(0, 1.0 - fx), (1, fx)] {
            acc.add(src.pixel(x0 + dx, y0 + dy), wx * wy);
        }
    }
    acc.finish()
}

fn bicubic(src: &Surface, sx: f64, sy: f64) -> Bgra8 {
    let u = sx - 0.5;
    let v = sy - 0.5;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let wx = catmull_rom_weights(fx);
    let wy = catmull_rom_weights(fy);
    let mut acc = Accum::default();
    for (j, wyj) in wy.iter().enumerate() {
        for (i, wxi) in wx.iter().enumerate() {
            acc.add(
                src.pixel(x0 - 1 + i as i64, y0 - 1 + j as i64),
                wxi * wyj,
            );
        }
    }
    acc.finish()
}

fn catmull_rom_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// Alpha-weighted accumulator so transparent taps don't darken edges.
#[derive(Default)]
struct Accum {
    c: [f64; 3],
    a: f64,
}

impl Accum {
    fn add(&mut self, px: Option<Bgra8>, w: f64) {
        let Some(px) = px else {
            return;
        };
        let a = f64::from(px[3]) / 255.0;
        for i in 0..3 {
            self.c[i] += f64::from(px[i]) * a * w;
        }
        self.a += a * w;
    }

    fn finish(self) -> Bgra8 {
        let a = self.a.clamp(0.0, 1.0);
        if self.a <= 1e-9 || a <= 0.0 {
            return [0, 0, 0, 0];
        }
        [
            clamp_u8(self.c[0] / self.a),
            clamp_u8(self.c[1] / self.a),
            clamp_u8(self.c[2] / self.a),
            clamp_u8(a * 255.0),
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sample.rs"]
mod tests;
