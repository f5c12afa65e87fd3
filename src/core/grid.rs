//! Tile grid planning
//!
//! Splits the mosaic into provider-sized requests, walking row by row from
//! the north-west corner. The last row and column take whatever is left, so
//! the emitted rectangles tile the image exactly.

use serde::Serialize;

use crate::core::projection::{Extent, GeoPoint, ProjectedPoint};
use crate::core::zoom::pixel_size;

/// Largest image the static map endpoint returns in one request
pub const MAX_TILE_SIZE: Extent<u32> = Extent::new(640, 640);

/// One cell of the grid: where it goes in the mosaic and what to ask for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRequest {
    /// Grid row, counted from the north
    pub row: u32,
    /// Grid column, counted from the west
    pub column: u32,
    /// Pixel offset of the tile's top-left corner in the mosaic
    pub x: u32,
    pub y: u32,
    pub center: GeoPoint,
    pub zoom: u8,
    pub size: Extent<u32>,
}

/// Lazy row-major sequence of [`TileRequest`]s covering an image
///
/// The sequence is finite; build a new grid to walk it again.
#[derive(Debug, Clone)]
pub struct TileGrid {
    north_west: ProjectedPoint,
    zoom: u8,
    image_size: Extent<u32>,
    max_tile: Extent<u32>,
    pixel: Extent<f64>,
    row: u32,
    column: u32,
    cursor_x: u32,
    cursor_y: u32,
}

impl TileGrid {
    /// Plan the grid for an image whose top-left pixel corner is `north_west`
    pub fn new(
        north_west: ProjectedPoint,
        zoom: u8,
        image_size: Extent<u32>,
        max_tile: Extent<u32>,
    ) -> Self {
        Self {
            north_west,
            zoom,
            image_size,
            max_tile: Extent::new(max_tile.width.max(1), max_tile.height.max(1)),
            pixel: pixel_size(zoom),
            row: 0,
            column: 0,
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    pub fn columns(&self) -> u32 {
        self.image_size.width.div_ceil(self.max_tile.width)
    }

    pub fn rows(&self) -> u32 {
        self.image_size.height.div_ceil(self.max_tile.height)
    }

    /// Total number of tiles in the grid, including ones already yielded
    pub fn tile_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    fn remaining(&self) -> usize {
        if self.image_size.width == 0 || self.cursor_y >= self.image_size.height {
            return 0;
        }
        let done = self.row as usize * self.columns() as usize + self.column as usize;
        self.tile_count() - done
    }
}

impl Iterator for TileGrid {
    type Item = TileRequest;

    fn next(&mut self) -> Option<TileRequest> {
        if self.image_size.width == 0 || self.cursor_y >= self.image_size.height {
            return None;
        }

        // Full tiles, except for the remainder at the south and east edges
        let height = self.max_tile.height.min(self.image_size.height - self.cursor_y);
        let width = self.max_tile.width.min(self.image_size.width - self.cursor_x);

        let center = ProjectedPoint::new(
            self.north_west.x + (f64::from(self.cursor_x) + f64::from(width) / 2.0) * self.pixel.width,
            self.north_west.y - (f64::from(self.cursor_y) + f64::from(height) / 2.0) * self.pixel.height,
        );

        let request = TileRequest {
            row: self.row,
            column: self.column,
            x: self.cursor_x,
            y: self.cursor_y,
            center: GeoPoint::from_projection(center),
            zoom: self.zoom,
            size: Extent::new(width, height),
        };

        self.cursor_x += width;
        self.column += 1;
        if self.cursor_x >= self.image_size.width {
            self.cursor_x = 0;
            self.column = 0;
            self.cursor_y += height;
            self.row += 1;
        }

        Some(request)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileGrid {}
