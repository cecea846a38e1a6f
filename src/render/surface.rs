use crate::{
    foundation::core::Canvas,
    foundation::error::{PixreelError, PixreelResult},
    render::blend,
};

/// Straight-alpha BGRA8 pixel buffer, row-major, no padding.
///
/// Deserializing checks the buffer length against the dimensions.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawSurface")]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[derive(serde::Deserialize)]
struct RawSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TryFrom<RawSurface> for Surface {
    type Error = PixreelError;

    fn try_from(raw: RawSurface) -> PixreelResult<Self> {
        Self::from_pixels(raw.width, raw.height, raw.pixels)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// One BGRA8 pixel.
pub type Bgra8 = [u8; 4];

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; Canvas { width, height }.pixel_count() * 4],
        }
    }

    /// Surface filled with a single color.
    pub fn filled(width: u32, height: u32, color: Bgra8) -> Self {
        let mut s = Self::new(width, height);
        s.fill(color);
        s
    }

    /// Wrap an existing BGRA8 buffer, checking its length.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> PixreelResult<Self> {
        let s = Self {
            width,
            height,
            pixels,
        };
        s.validate()?;
        Ok(s)
    }

    /// Build from straight-alpha RGBA8 bytes (the `image` crate layout).
    pub fn from_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> PixreelResult<Self> {
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        Self::from_pixels(width, height, rgba)
    }

    /// Check that the buffer length matches the dimensions.
    pub fn validate(&self) -> PixreelResult<()> {
        let expected = Canvas {
            width: self.width,
            height: self.height,
        }
        .pixel_count()
            * 4;
        if self.pixels.len() != expected {
            return Err(PixreelError::validation(format!(
                "surface {}x{} expects {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a [`Canvas`].
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Raw BGRA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable raw BGRA8 bytes.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Consume into raw BGRA8 bytes.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: i64, y: i64) -> Option<Bgra8> {
        let i = self.index_of(x, y)?;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Overwrite the pixel at `(x, y)`; writes outside the surface are ignored.
    pub fn set_pixel(&mut self, x: i64, y: i64, px: Bgra8) {
        if let Some(i) = self.index_of(x, y) {
            self.pixels[i..i + 4].copy_from_slice(&px);
        }
    }

    /// Alpha-over `px` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: i64, y: i64, px: Bgra8) {
        if let Some(i) = self.index_of(x, y) {
            let dst = [
                self.pixels[i],
                self.pixels[i + 1],
                self.pixels[i + 2],
                self.pixels[i + 3],
            ];
            self.pixels[i..i + 4].copy_from_slice(&blend::over(dst, px));
        }
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Bgra8) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Alpha-over this surface onto `dst` with its top-left at `(x, y)`.
    ///
    /// `opacity` in `[0, 1]` scales source alpha.
    pub fn composite_to(&self, dst: &mut Surface, x: i64, y: i64, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        for sy in 0..i64::from(self.height) {
            let dy = y + sy;
            if dy < 0 || dy >= i64::from(dst.height) {
                continue;
            }
            for sx in 0..i64::from(self.width) {
                let dx = x + sx;
                if dx < 0 || dx >= i64::from(dst.width) {
                    continue;
                }
                if let Some(px) = self.pixel(sx, sy) {
                    dst.blend_pixel(dx, dy, blend::with_opacity(px, opacity));
                }
            }
        }
    }

    /// Copy of the `width`x`height` region whose top-left is `(x, y)`.
    ///
    /// The region must lie fully inside the surface.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> PixreelResult<Surface> {
        let fits_x = x.checked_add(width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(PixreelError::validation(format!(
                "crop {width}x{height}+{x}+{y} exceeds surface {}x{}",
                self.width, self.height
            )));
        }
        let mut out = Surface::new(width, height);
        let row = width as usize * 4;
        for r in 0..height as usize {
            let src = ((y as usize + r) * self.width as usize + x as usize) * 4;
            out.pixels[r * row..(r + 1) * row].copy_from_slice(&self.pixels[src..src + row]);
        }
        Ok(out)
    }

    /// Straight-alpha RGBA8 copy of the pixels (for PNG export).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = self.pixels.clone();
        for px in out.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        out
    }

    fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(((y as usize) * (self.width as usize) + (x as usize)) * 4)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
