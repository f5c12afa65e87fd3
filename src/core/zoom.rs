//! Zoom level <-> pixel size conversions
//!
//! At zoom `z` the whole `2π` projection square is `256 · 2^z` pixels wide,
//! on both axes.

use std::f64::consts::PI;

use crate::core::projection::Extent;

/// Highest zoom level the static map provider serves
pub const MAX_ZOOM: u8 = 19;

/// Width of the zoom 0 world, in pixels
pub const TILE_UNIT: f64 = 256.0;

/// Sphere radius of the provider's Mercator (WGS 84 semi-major axis), in metres
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Size of one image pixel in projection units
pub fn pixel_size(zoom: u8) -> Extent<f64> {
    let quantum = 2.0 * PI / (2f64.powi(i32::from(zoom)) * TILE_UNIT);
    Extent::new(quantum, quantum)
}

/// Smallest zoom whose pixel is not larger than `target`, clamped to `[0, MAX_ZOOM]`
///
/// A region needing more detail than the provider has silently gets
/// `MAX_ZOOM`. Below that, `pixel_size(zoom) <= target` holds exactly.
pub fn zoom_for_pixel_size(target: f64) -> u8 {
    let estimate = (2.0 * PI / (target * TILE_UNIT)).log2().ceil();
    let mut zoom = if estimate.is_nan() {
        MAX_ZOOM
    } else {
        estimate.clamp(0.0, f64::from(MAX_ZOOM)) as u8
    };

    // The log can land one step off next to an exact power of two
    if zoom > 0 && pixel_size(zoom - 1).width <= target {
        zoom -= 1;
    } else if zoom < MAX_ZOOM && pixel_size(zoom).width > target {
        zoom += 1;
    }
    zoom
}

/// Clamp a requested zoom to what the provider serves
pub fn clamp_zoom(zoom: u32) -> u8 {
    zoom.min(u32::from(MAX_ZOOM)) as u8
}

/// Ground resolution in metres per pixel at latitude `lat` (radians)
pub fn meters_per_pixel(zoom: u8, lat: f64) -> f64 {
    pixel_size(zoom).width * EARTH_RADIUS * lat.cos()
}
