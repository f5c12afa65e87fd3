//! # ozimap
//!
//! Builds calibrated raster maps for OziExplorer from a static map tile
//! provider.
//!
//! A region is described by any workable combination of center, corners,
//! span, zoom and image size. It is resolved against the provider's Mercator
//! pixel grid, split into provider-sized tiles, fetched, stitched into one
//! image and written next to an OziExplorer `.map` calibration file.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use ozimap::{BuildOptions, GeoPoint, MapConfig, RegionSpec, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let region = RegionSpec {
//!         center: Some(GeoPoint::from_degrees(55.928817, 37.758293)?.to_projection()),
//!         zoom: Some(12),
//!         width: Some(1000),
//!         height: Some(1000),
//!         ..Default::default()
//!     };
//!     let config = MapConfig::new("moscow.map", region, SourceConfig::default());
//!
//!     let summary = ozimap::build_map(&config, BuildOptions::default()).await?;
//!     println!("{} tiles at zoom {}", summary.tile_count, summary.region.zoom);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use log::info;
use serde::Serialize;

pub use crate::core::calibration::{CalibrationFields, DEFAULT_COPYRIGHT, DEFAULT_TEMPLATE};
pub use crate::core::config::{
    default_image_path, BuildOptions, MapConfig, OverwriteBehavior, ProgressCallback,
};
pub use crate::core::error::{Error, Quantity, Result};
pub use crate::core::grid::{TileGrid, TileRequest, MAX_TILE_SIZE};
pub use crate::core::projection::{Extent, GeoPoint, ProjectedPoint};
pub use crate::core::region::{Region, RegionSpec};
pub use crate::core::source::{parse_map_url, ImageFormat, MapType, MapUrlParams, SourceConfig};
pub use crate::core::zoom::MAX_ZOOM;

pub mod core;

use crate::core::calibration::{image_path_reference, load_template};
use crate::core::output::{check_overwrite_permission, write_outputs};
use crate::core::zoom::meters_per_pixel;
use crate::core::{Mosaic, TileDownloader};

/// Outcome of a successful [`build_map`]
#[derive(Debug, Clone)]
pub struct MapSummary {
    pub region: Region,
    pub tile_count: usize,
    /// Whether tiles were fetched or a blank image was written
    pub downloaded: bool,
    pub image_path: PathBuf,
    pub map_path: PathBuf,
}

/// Corner or center in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl From<GeoPoint> for LatLon {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.lat_deg(),
            lon: point.lon_deg(),
        }
    }
}

/// One tile of a [`MapPlan`] with the URL it would be fetched from
#[derive(Debug, Clone, Serialize)]
pub struct PlannedTile {
    pub row: u32,
    pub column: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// What [`build_map`] would do, without doing it
#[derive(Debug, Clone, Serialize)]
pub struct MapPlan {
    pub zoom: u8,
    pub image_width: u32,
    pub image_height: u32,
    pub center: LatLon,
    pub north_west: LatLon,
    pub south_east: LatLon,
    pub meters_per_pixel: f64,
    pub map_path: PathBuf,
    pub image_path: PathBuf,
    pub tiles: Vec<PlannedTile>,
}

/// Resolve the region and list the tile requests
///
/// Nothing is fetched or written.
pub fn plan(config: &MapConfig) -> Result<MapPlan> {
    let region = config.region.resolve()?;

    let tiles = region
        .tiles(MAX_TILE_SIZE)
        .map(|tile| PlannedTile {
            url: config.source.to_request_url(&tile),
            row: tile.row,
            column: tile.column,
            x: tile.x,
            y: tile.y,
            width: tile.size.width,
            height: tile.size.height,
        })
        .collect();

    Ok(MapPlan {
        zoom: region.zoom,
        image_width: region.image_size.width,
        image_height: region.image_size.height,
        center: region.geo_center().into(),
        north_west: region.geo_north_west().into(),
        south_east: region.geo_south_east().into(),
        meters_per_pixel: meters_per_pixel(region.zoom, region.geo_center().lat()),
        map_path: config.map_path.clone(),
        image_path: config.image_path.clone(),
        tiles,
    })
}

/// Build the mosaic image and its calibration file
///
/// All inputs are checked before the first request. Outputs are written only
/// once every tile has been fetched and placed, and both files are staged
/// before either replaces an existing one. A failed tile or write leaves no
/// new files behind.
///
/// # Examples
/// ```rust,no_run
/// use std::sync::Arc;
/// use ozimap::{BuildOptions, GeoPoint, MapConfig, OverwriteBehavior, RegionSpec, SourceConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let region = RegionSpec {
///     north_east: Some(GeoPoint::from_degrees(56.0, 38.0)?.to_projection()),
///     south_west: Some(GeoPoint::from_degrees(55.5, 37.0)?.to_projection()),
///     zoom: Some(10),
///     ..Default::default()
/// };
/// let config = MapConfig::new("area.map", region, SourceConfig::default());
/// let options = BuildOptions {
///     overwrite: OverwriteBehavior::Force,
///     progress: Some(Arc::new(|done, total| eprintln!("{done}/{total} tiles"))),
///     ..Default::default()
/// };
///
/// ozimap::build_map(&config, options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn build_map(config: &MapConfig, options: BuildOptions) -> Result<MapSummary> {
    if config.image_path == config.map_path {
        return Err(Error::InvalidInput(format!(
            "image and map file are both {}",
            config.map_path.display()
        )));
    }

    let region = config.region.resolve()?;
    info!(
        "Region: zoom {}, {} px, north-west {}, south-east {}",
        region.zoom,
        region.image_size,
        region.geo_north_west(),
        region.geo_south_east()
    );

    let template = load_template(config.template.as_deref())?;
    check_overwrite_permission(&config.image_path, options.overwrite)?;
    check_overwrite_permission(&config.map_path, options.overwrite)?;

    let tiles = region.tiles(MAX_TILE_SIZE);
    let tile_count = tiles.len();
    let mut mosaic = Mosaic::blank(region.image_size);

    if options.download {
        TileDownloader::new(&config.source)
            .fetch_all(
                tiles,
                options.max_connections,
                options.progress.as_ref(),
                |tile, bytes| mosaic.place(&tile, &bytes),
            )
            .await?;
    } else {
        info!("Download disabled, writing a blank {} image", region.image_size);
    }

    let encoded = mosaic.encode(config.source.format)?;
    let image_reference = image_path_reference(&config.map_path, &config.image_path);
    let calibration = CalibrationFields::for_region(&region, &image_reference, &config.copyright)
        .render(&template);

    write_outputs(&[
        (config.image_path.as_path(), encoded.as_slice()),
        (config.map_path.as_path(), calibration.as_bytes()),
    ])
    .await?;
    info!("Wrote {} and {}", config.image_path.display(), config.map_path.display());

    Ok(MapSummary {
        region,
        tile_count,
        downloaded: options.download,
        image_path: config.image_path.clone(),
        map_path: config.map_path.clone(),
    })
}
