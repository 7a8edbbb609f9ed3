//! Moving pixel grids in and out of PNG containers.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgba, RgbaImage};

use crate::bits::PackedGrid;
use crate::error::Result;

/// Lays the packed pixels out row-major. Cells past the payload stay at the
/// buffer's zero default.
pub fn render(grid: &PackedGrid) -> RgbaImage {
    let mut img: RgbaImage = ImageBuffer::new(grid.width(), grid.height());
    for (slot, pixel) in img.pixels_mut().zip(&grid.pixels) {
        *slot = *pixel;
    }
    img
}

/// Every cell of the image, row-major, converted to RGBA8 first.
pub fn pixels(img: &DynamicImage) -> Vec<Rgba<u8>> {
    img.to_rgba8().pixels().copied().collect()
}

pub fn to_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out_buf = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut out_buf), ImageOutputFormat::Png)?;
    Ok(out_buf)
}

pub fn load(path: &Path) -> Result<DynamicImage> {
    let img_data = fs::read(path)?;
    Ok(image::load_from_memory(&img_data)?)
}
