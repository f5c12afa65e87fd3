//! Region resolution
//!
//! The user describes the region with any workable subset of center,
//! corners, span, zoom and image size. [`RegionSpec::resolve`] derives the
//! rest in a fixed order: size, zoom, image size, center, corners. Each step
//! only looks at user input and at what earlier steps produced.

use std::f64::consts::PI;

use log::{debug, warn};
use serde::Serialize;

use crate::core::error::{Error, Quantity, Result};
use crate::core::grid::TileGrid;
use crate::core::projection::{Extent, GeoPoint, ProjectedPoint};
use crate::core::zoom::{clamp_zoom, pixel_size, zoom_for_pixel_size, MAX_ZOOM};

/// Slack allowed when checking corners against the `[-π, π]` longitude range
const WRAP_TOLERANCE: f64 = 1e-12;

/// Longest image side; JPEG and GIF store dimensions as 16-bit values
pub const MAX_IMAGE_DIMENSION: u32 = 65_535;

/// Largest canvas in pixels, 1 GiB as RGBA
pub const MAX_IMAGE_PIXELS: u64 = 1 << 28;

/// Region parameters exactly as supplied; every field is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSpec {
    pub center: Option<ProjectedPoint>,
    pub north_east: Option<ProjectedPoint>,
    pub south_west: Option<ProjectedPoint>,
    /// Span in projection units
    pub size: Option<Extent<f64>>,
    /// Requested zoom, clamped to `MAX_ZOOM` when resolved
    pub zoom: Option<u32>,
    /// Requested image width in pixels
    pub width: Option<u32>,
    /// Requested image height in pixels
    pub height: Option<u32>,
}

/// A fully resolved region, ready for tiling and calibration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub center: ProjectedPoint,
    pub size: Extent<f64>,
    pub zoom: u8,
    pub image_size: Extent<u32>,
    pub north_west: ProjectedPoint,
    pub south_east: ProjectedPoint,
}

/// Intermediate state threaded through the resolution steps
#[derive(Debug, Clone, Default)]
struct PartialRegion {
    size: Option<Extent<f64>>,
    zoom: Option<u8>,
    image_size: Option<Extent<u32>>,
    center: Option<ProjectedPoint>,
}

impl RegionSpec {
    /// Derive the full region from whatever was supplied
    pub fn resolve(&self) -> Result<Region> {
        let partial = PartialRegion::default();
        let partial = self.resolve_size(partial)?;
        let partial = self.resolve_zoom(partial)?;
        let partial = resolve_image_size(partial)?;
        let partial = self.resolve_center(partial)?;
        let region = resolve_corners(partial)?;

        debug!(
            "Resolved region: center {}, zoom {}, image {}",
            region.geo_center(),
            region.zoom,
            region.image_size
        );
        Ok(region)
    }

    fn requested_zoom(&self) -> Option<u8> {
        self.zoom.map(|zoom| {
            let clamped = clamp_zoom(zoom);
            if u32::from(clamped) != zoom {
                warn!("Zoom {zoom} is above the provider maximum, using {MAX_ZOOM}");
            }
            clamped
        })
    }

    /// Step 1: region size in projection units
    fn resolve_size(&self, partial: PartialRegion) -> Result<PartialRegion> {
        let size = if let Some(size) = self.size {
            size
        } else if let (Some(ne), Some(sw)) = (self.north_east, self.south_west) {
            Extent::from_delta(ne - sw)
        } else if let (Some(center), Some(corner)) = (self.center, self.north_east.or(self.south_west)) {
            Extent::from_delta(corner - center).scale(2.0)
        } else if let (Some(zoom), Some(width), Some(height)) =
            (self.zoom.map(clamp_zoom), self.width, self.height)
        {
            let pixel = pixel_size(zoom);
            Extent::new(pixel.width * f64::from(width), pixel.height * f64::from(height))
        } else {
            return Err(Error::InsufficientParameters(Quantity::Size));
        };

        Ok(PartialRegion {
            size: Some(size),
            ..partial
        })
    }

    /// Step 2: zoom, either requested or the coarsest one that keeps every axis detailed enough
    fn resolve_zoom(&self, partial: PartialRegion) -> Result<PartialRegion> {
        let size = partial
            .size
            .ok_or(Error::InsufficientParameters(Quantity::Size))?;

        let zoom = match self.requested_zoom() {
            Some(zoom) => zoom,
            None => {
                let (Some(width), Some(height)) = (self.width, self.height) else {
                    return Err(Error::InsufficientParameters(Quantity::Zoom));
                };
                if width == 0 || height == 0 {
                    return Err(Error::InvalidInput(format!(
                        "image size {width}x{height} must be at least 1x1"
                    )));
                }

                let pixel_x = size.width / f64::from(width);
                let pixel_y = size.height / f64::from(height);
                zoom_for_pixel_size(pixel_x.min(pixel_y))
            }
        };

        Ok(PartialRegion {
            zoom: Some(zoom),
            ..partial
        })
    }

    /// Step 4: region center
    fn resolve_center(&self, partial: PartialRegion) -> Result<PartialRegion> {
        let size = partial
            .size
            .ok_or(Error::InsufficientParameters(Quantity::Size))?;

        let center = if let Some(center) = self.center {
            center
        } else if let (Some(ne), Some(sw)) = (self.north_east, self.south_west) {
            (ne + sw) / 2.0
        } else if let Some(ne) = self.north_east {
            ne - size.half()
        } else if let Some(sw) = self.south_west {
            sw + size.half()
        } else {
            return Err(Error::InsufficientParameters(Quantity::Center));
        };

        Ok(PartialRegion {
            center: Some(center),
            ..partial
        })
    }
}

/// Step 3: image size in whole pixels
fn resolve_image_size(partial: PartialRegion) -> Result<PartialRegion> {
    let (Some(size), Some(zoom)) = (partial.size, partial.zoom) else {
        return Err(Error::InsufficientParameters(Quantity::Zoom));
    };

    let pixel = pixel_size(zoom);
    let to_pixels = |span: f64, quantum: f64| -> Result<u32> {
        let pixels = (span / quantum).round();
        if !pixels.is_finite() || pixels > f64::from(u32::MAX) {
            return Err(Error::DegenerateRegion(format!(
                "region is too large for zoom {zoom}"
            )));
        }
        Ok((pixels as u32).max(1))
    };

    let image_size = Extent::new(
        to_pixels(size.width, pixel.width)?,
        to_pixels(size.height, pixel.height)?,
    );

    let too_long = image_size.width.max(image_size.height) > MAX_IMAGE_DIMENSION;
    let too_many = u64::from(image_size.width) * u64::from(image_size.height) > MAX_IMAGE_PIXELS;
    if too_long || too_many {
        return Err(Error::DegenerateRegion(format!(
            "image would be {image_size} px at zoom {zoom}, the limit is \
             {MAX_IMAGE_DIMENSION} px per side and {MAX_IMAGE_PIXELS} px in total; \
             lower the zoom or shrink the region"
        )));
    }

    Ok(PartialRegion {
        image_size: Some(image_size),
        ..partial
    })
}

/// Step 5: corners, validated against degenerate or wrapping regions
fn resolve_corners(partial: PartialRegion) -> Result<Region> {
    let (Some(size), Some(zoom), Some(image_size), Some(center)) =
        (partial.size, partial.zoom, partial.image_size, partial.center)
    else {
        return Err(Error::InsufficientParameters(Quantity::Center));
    };

    if !(size.width > 0.0 && size.height > 0.0) {
        return Err(Error::DegenerateRegion(format!(
            "region size {}x{} has no area",
            size.width, size.height
        )));
    }

    // y grows to the north, so the north-west corner has the larger y
    let north_west = ProjectedPoint::new(center.x - size.width / 2.0, center.y + size.height / 2.0);
    let south_east = ProjectedPoint::new(center.x + size.width / 2.0, center.y - size.height / 2.0);

    if north_west.x < -PI - WRAP_TOLERANCE || south_east.x > PI + WRAP_TOLERANCE {
        return Err(Error::DegenerateRegion(
            "region crosses the antimeridian".to_string(),
        ));
    }

    Ok(Region {
        center,
        size,
        zoom,
        image_size,
        north_west,
        south_east,
    })
}

impl Region {
    pub fn geo_center(&self) -> GeoPoint {
        GeoPoint::from_projection(self.center)
    }

    pub fn geo_north_west(&self) -> GeoPoint {
        GeoPoint::from_projection(self.north_west)
    }

    pub fn geo_south_east(&self) -> GeoPoint {
        GeoPoint::from_projection(self.south_east)
    }

    /// Plan the tile requests covering this region's image
    pub fn tiles(&self, max_tile: Extent<u32>) -> TileGrid {
        TileGrid::new(self.north_west, self.zoom, self.image_size, max_tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::MAX_TILE_SIZE;
    use approx::assert_abs_diff_eq;

    fn point(lat: f64, lon: f64) -> ProjectedPoint {
        GeoPoint::from_degrees(lat, lon).unwrap().to_projection()
    }

    #[test]
    fn test_center_zoom_and_image_size() {
        let spec = RegionSpec {
            center: Some(point(55.928817, 37.758293)),
            zoom: Some(12),
            width: Some(1000),
            height: Some(1000),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();

        let pixel = pixel_size(12);
        assert_eq!(region.zoom, 12);
        assert_eq!(region.image_size, Extent::new(1000, 1000));
        assert_abs_diff_eq!(region.size.width, 1000.0 * pixel.width, epsilon = 1e-15);
        assert_abs_diff_eq!(region.north_west.x, region.center.x - 500.0 * pixel.width, epsilon = 1e-12);
        assert_abs_diff_eq!(region.north_west.y, region.center.y + 500.0 * pixel.height, epsilon = 1e-12);
        assert!(region.north_west.y > region.south_east.y);
        assert!(region.north_west.x < region.south_east.x);

        let tiles: Vec<_> = region.tiles(MAX_TILE_SIZE).collect();
        let placed: Vec<_> = tiles
            .iter()
            .map(|t| (t.x, t.y, t.size.width, t.size.height))
            .collect();
        assert_eq!(
            placed,
            vec![
                (0, 0, 640, 640),
                (640, 0, 360, 640),
                (0, 640, 640, 360),
                (640, 640, 360, 360),
            ]
        );
        assert!(tiles.iter().all(|t| t.zoom == 12));
    }

    #[test]
    fn test_nothing_supplied_fails_on_size() {
        let err = RegionSpec::default().resolve().unwrap_err();
        assert!(matches!(err, Error::InsufficientParameters(Quantity::Size)));
    }

    #[test]
    fn test_center_only_fails_on_size() {
        let spec = RegionSpec {
            center: Some(point(10.0, 10.0)),
            width: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            spec.resolve(),
            Err(Error::InsufficientParameters(Quantity::Size))
        ));
    }

    #[test]
    fn test_corners_without_image_size_fail_on_zoom() {
        let spec = RegionSpec {
            north_east: Some(point(56.0, 38.0)),
            south_west: Some(point(55.0, 37.0)),
            ..Default::default()
        };
        assert!(matches!(
            spec.resolve(),
            Err(Error::InsufficientParameters(Quantity::Zoom))
        ));
    }

    #[test]
    fn test_size_without_anchor_fails_on_center() {
        let spec = RegionSpec {
            size: Some(Extent::new(0.01, 0.01)),
            zoom: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            spec.resolve(),
            Err(Error::InsufficientParameters(Quantity::Center))
        ));
    }

    #[test]
    fn test_both_corners() {
        let ne = point(56.0, 38.0);
        let sw = point(55.0, 37.0);
        let spec = RegionSpec {
            north_east: Some(ne),
            south_west: Some(sw),
            width: Some(800),
            height: Some(600),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();

        assert_abs_diff_eq!(region.size.width, ne.x - sw.x, epsilon = 1e-15);
        assert_abs_diff_eq!(region.size.height, ne.y - sw.y, epsilon = 1e-15);
        assert_abs_diff_eq!(region.center.x, (ne.x + sw.x) / 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(region.north_west.x, sw.x, epsilon = 1e-12);
        assert_abs_diff_eq!(region.north_west.y, ne.y, epsilon = 1e-12);
        assert_abs_diff_eq!(region.south_east.x, ne.x, epsilon = 1e-12);
        assert_abs_diff_eq!(region.south_east.y, sw.y, epsilon = 1e-12);

        // The rendered image is at least as detailed as requested on both axes
        let pixel = pixel_size(region.zoom);
        assert!(pixel.width <= region.size.width / 800.0);
        assert!(pixel.height <= region.size.height / 600.0);
        assert!(region.image_size.width >= 800);
        assert!(region.image_size.height >= 600);
    }

    #[test]
    fn test_zoom_uses_the_more_detailed_axis() {
        // Tall narrow region: the vertical axis needs the finer pixel
        let spec = RegionSpec {
            center: Some(point(0.0, 0.0)),
            size: Some(Extent::new(0.01, 0.04)),
            width: Some(100),
            height: Some(1000),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();
        assert_eq!(region.zoom, zoom_for_pixel_size(0.04 / 1000.0));
    }

    #[test]
    fn test_center_and_north_east() {
        let center = point(50.0, 10.0);
        let ne = point(50.5, 10.5);
        let spec = RegionSpec {
            center: Some(center),
            north_east: Some(ne),
            zoom: Some(11),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();

        assert_abs_diff_eq!(region.size.width, 2.0 * (ne.x - center.x), epsilon = 1e-15);
        assert_abs_diff_eq!(region.south_east.x, ne.x, epsilon = 1e-12);
        assert_abs_diff_eq!(region.north_west.y, ne.y, epsilon = 1e-12);
        assert_eq!(region.center, center);
    }

    #[test]
    fn test_north_east_only_anchor() {
        let ne = point(50.0, 10.0);
        let size = Extent::new(0.02, 0.01);
        let spec = RegionSpec {
            north_east: Some(ne),
            size: Some(size),
            zoom: Some(9),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();
        assert_abs_diff_eq!(region.center.x, ne.x - 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(region.center.y, ne.y - 0.005, epsilon = 1e-15);
    }

    #[test]
    fn test_south_west_only_anchor() {
        let sw = point(-20.0, -40.0);
        let size = Extent::new(0.02, 0.01);
        let spec = RegionSpec {
            south_west: Some(sw),
            size: Some(size),
            zoom: Some(9),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();
        assert_abs_diff_eq!(region.center.x, sw.x + 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(region.center.y, sw.y + 0.005, epsilon = 1e-15);
        assert_abs_diff_eq!(region.south_east.y, sw.y, epsilon = 1e-12);
    }

    #[test]
    fn test_requested_zoom_is_clamped() {
        let spec = RegionSpec {
            center: Some(point(0.0, 0.0)),
            zoom: Some(30),
            width: Some(10),
            height: Some(10),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();
        assert_eq!(region.zoom, MAX_ZOOM);
        assert_eq!(region.image_size, Extent::new(10, 10));
    }

    #[test]
    fn test_tiny_region_gets_at_least_one_pixel() {
        let spec = RegionSpec {
            center: Some(point(0.0, 0.0)),
            size: Some(Extent::new(1e-9, 1e-9)),
            zoom: Some(0),
            ..Default::default()
        };
        let region = spec.resolve().unwrap();
        assert_eq!(region.image_size, Extent::new(1, 1));
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let spec = RegionSpec {
            north_east: Some(point(60.0, 30.0)),
            south_west: Some(point(50.0, 10.0)),
            zoom: Some(19),
            ..Default::default()
        };
        match spec.resolve() {
            Err(Error::DegenerateRegion(msg)) => assert!(msg.contains("zoom 19"), "message was: {msg}"),
            other => panic!("Expected DegenerateRegion, got {other:?}"),
        }

        // The same region at a modest zoom is fine
        let spec = RegionSpec {
            zoom: Some(10),
            ..spec
        };
        assert!(spec.resolve().is_ok());
    }

    #[test]
    fn test_image_side_limit() {
        let center = Some(point(0.0, 0.0));
        let pixel = pixel_size(15).width;

        let long_strip = RegionSpec {
            center,
            size: Some(Extent::new(f64::from(MAX_IMAGE_DIMENSION + 1) * pixel, 100.0 * pixel)),
            zoom: Some(15),
            ..Default::default()
        };
        assert!(matches!(long_strip.resolve(), Err(Error::DegenerateRegion(_))));

        let widest = RegionSpec {
            size: Some(Extent::new(f64::from(MAX_IMAGE_DIMENSION) * pixel, 100.0 * pixel)),
            ..long_strip
        };
        assert_eq!(widest.resolve().unwrap().image_size.width, MAX_IMAGE_DIMENSION);
    }

    #[test]
    fn test_antimeridian_is_rejected() {
        let spec = RegionSpec {
            center: Some(point(0.0, 179.9)),
            size: Some(Extent::new(0.1, 0.1)),
            zoom: Some(5),
            ..Default::default()
        };
        assert!(matches!(spec.resolve(), Err(Error::DegenerateRegion(_))));
    }

    #[test]
    fn test_zero_area_is_rejected() {
        let corner = point(10.0, 10.0);
        let spec = RegionSpec {
            north_east: Some(corner),
            south_west: Some(corner),
            zoom: Some(5),
            ..Default::default()
        };
        assert!(matches!(spec.resolve(), Err(Error::DegenerateRegion(_))));
    }
}
