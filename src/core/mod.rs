//! Core library modules for ozimap
//!
//! Geometry (projection, zoom, region, grid) is pure; the tile source,
//! downloader, mosaic and output modules do the I/O around it.

pub mod calibration;
pub mod config;
pub mod downloader;
pub mod error;
pub mod grid;
pub mod mosaic;
pub mod output;
pub mod projection;
pub mod region;
pub mod source;
pub mod zoom;

#[cfg(test)]
pub(crate) mod test_support;

pub use downloader::TileDownloader;
pub use mosaic::Mosaic;
