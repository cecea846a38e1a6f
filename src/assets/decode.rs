use std::io::Cursor;

use anyhow::Context;

use crate::{foundation::error::PixreelResult, render::surface::Surface};

/// Decode an encoded image (PNG) into a straight-alpha BGRA surface.
pub fn decode_image(bytes: &[u8]) -> PixreelResult<Surface> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Surface::from_rgba8(width, height, rgba.into_raw())
}

/// Encode a surface as PNG bytes.
pub fn encode_png(surface: &Surface) -> PixreelResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(surface.width(), surface.height(), surface.to_rgba8())
        .context("surface buffer does not match its dimensions")?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
