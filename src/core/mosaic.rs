//! Mosaic canvas
//!
//! Tiles are copied onto a white RGBA canvas at their grid offsets. Offsets
//! never overlap, so the arrival order of tiles does not matter.

use std::io::Cursor;

use image::{imageops, DynamicImage, Rgba, RgbaImage};
use log::warn;

use crate::core::error::{Error, Result};
use crate::core::grid::TileRequest;
use crate::core::projection::Extent;
use crate::core::source::ImageFormat;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct Mosaic {
    canvas: RgbaImage,
}

impl Mosaic {
    /// Opaque white canvas of `size`
    pub fn blank(size: Extent<u32>) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(size.width, size.height, BACKGROUND),
        }
    }

    pub fn size(&self) -> Extent<u32> {
        Extent::new(self.canvas.width(), self.canvas.height())
    }

    /// Decode `bytes` and copy the result to the tile's offset
    ///
    /// Anything the image has beyond the tile's rectangle is clipped.
    pub fn place(&mut self, tile: &TileRequest, bytes: &[u8]) -> Result<()> {
        let decoded = image::load_from_memory(bytes).map_err(|err| Error::TileFetchFailed {
            row: tile.row,
            column: tile.column,
            message: format!("undecodable image: {err}"),
        })?;

        if decoded.width() != tile.size.width || decoded.height() != tile.size.height {
            warn!(
                "Tile {},{} is {}x{}, expected {}",
                tile.row,
                tile.column,
                decoded.width(),
                decoded.height(),
                tile.size
            );
        }

        let mut pixels = decoded.to_rgba8();
        if pixels.width() > tile.size.width || pixels.height() > tile.size.height {
            pixels = imageops::crop_imm(
                &pixels,
                0,
                0,
                tile.size.width.min(pixels.width()),
                tile.size.height.min(pixels.height()),
            )
            .to_image();
        }

        imageops::replace(&mut self.canvas, &pixels, i64::from(tile.x), i64::from(tile.y));
        Ok(())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.canvas.get_pixel(x, y)
    }

    /// Encode the canvas in the container matching `format`
    pub fn encode(self, format: ImageFormat) -> Result<Vec<u8>> {
        let image = DynamicImage::ImageRgba8(self.canvas);
        let image = if format.has_alpha() {
            image
        } else {
            DynamicImage::ImageRgb8(image.to_rgb8())
        };

        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format.encoding())?;
        Ok(buffer.into_inner())
    }
}
