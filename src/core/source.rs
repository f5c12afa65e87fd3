//! Tile source configuration and request URLs
//!
//! Builds static map request URLs for each [`TileRequest`] and reads region
//! parameters back out of a provider map URL.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::error::{unknown_value, Error, Result};
use crate::core::grid::TileRequest;
use crate::core::projection::GeoPoint;

/// Image encodings offered by the static map endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    JpegBaseline,
    Png8,
    Png32,
    Gif,
}

impl ImageFormat {
    pub const NAMES: &'static [&'static str] = &["jpeg", "jpeg-baseline", "png8", "png32", "gif"];

    /// Name used on the command line and in the request URL
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::JpegBaseline => "jpeg-baseline",
            ImageFormat::Png8 => "png8",
            ImageFormat::Png32 => "png32",
            ImageFormat::Gif => "gif",
        }
    }

    /// File extension of the written mosaic
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg | ImageFormat::JpegBaseline => "jpg",
            ImageFormat::Png8 | ImageFormat::Png32 => "png",
            ImageFormat::Gif => "gif",
        }
    }

    /// Whether the mosaic keeps an alpha channel
    pub fn has_alpha(&self) -> bool {
        matches!(self, ImageFormat::Png32 | ImageFormat::Gif)
    }

    /// Encoder used for the mosaic
    pub fn encoding(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg | ImageFormat::JpegBaseline => image::ImageFormat::Jpeg,
            ImageFormat::Png8 | ImageFormat::Png32 => image::ImageFormat::Png,
            ImageFormat::Gif => image::ImageFormat::Gif,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" => Ok(ImageFormat::Jpeg),
            "jpeg-baseline" => Ok(ImageFormat::JpegBaseline),
            "png8" => Ok(ImageFormat::Png8),
            "png32" => Ok(ImageFormat::Png32),
            "gif" => Ok(ImageFormat::Gif),
            _ => Err(unknown_value("image format", s, Self::NAMES)),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map styles offered by the static map endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MapType {
    /// Standard road map
    #[default]
    Roadmap,
    /// Road map with larger features and fonts for small screens
    Mobile,
    Satellite,
    /// Physical relief with terrain and vegetation
    Terrain,
    /// Satellite imagery with a road overlay
    Hybrid,
    MapMakerRoadmap,
    MapMakerHybrid,
}

impl MapType {
    pub const NAMES: &'static [&'static str] = &[
        "roadmap",
        "mobile",
        "satellite",
        "terrain",
        "hybrid",
        "mapmaker-roadmap",
        "mapmaker-hybrid",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MapType::Roadmap => "roadmap",
            MapType::Mobile => "mobile",
            MapType::Satellite => "satellite",
            MapType::Terrain => "terrain",
            MapType::Hybrid => "hybrid",
            MapType::MapMakerRoadmap => "mapmaker-roadmap",
            MapType::MapMakerHybrid => "mapmaker-hybrid",
        }
    }
}

impl FromStr for MapType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Self::NAMES
            .iter()
            .position(|name| *name == lower)
            .map(|index| match index {
                0 => MapType::Roadmap,
                1 => MapType::Mobile,
                2 => MapType::Satellite,
                3 => MapType::Terrain,
                4 => MapType::Hybrid,
                5 => MapType::MapMakerRoadmap,
                _ => MapType::MapMakerHybrid,
            })
            .ok_or_else(|| unknown_value("map type", s, Self::NAMES))
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the tile source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    /// Static map endpoint
    pub base_url: String,

    /// Provider API key, sent as `key=`
    pub api_key: Option<String>,

    pub map_type: MapType,

    /// Two-letter label language, sent as `hl=`
    pub language: Option<String>,

    pub format: ImageFormat,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://maps.google.com/staticmap".to_string(),
            api_key: None,
            map_type: MapType::default(),
            language: None,
            format: ImageFormat::default(),
        }
    }
}

impl SourceConfig {
    /// URL fetching the image for one tile
    pub fn to_request_url(&self, tile: &TileRequest) -> String {
        let mut url = format!(
            "{}?center={:.6},{:.6}&key={}&format={}&maptype={}",
            self.base_url,
            tile.center.lat_deg(),
            tile.center.lon_deg(),
            self.api_key.as_deref().unwrap_or(""),
            self.format,
            self.map_type,
        );
        if let Some(language) = &self.language {
            url.push_str(&format!("&hl={language}"));
        }
        url.push_str(&format!("&zoom={}&size={}", tile.zoom, tile.size));
        url
    }
}

/// Region parameters found in a provider map URL
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapUrlParams {
    pub zoom: Option<u32>,
    pub center: Option<GeoPoint>,
    pub language: Option<String>,
}

/// Read `z=`/`zoom=`, `ll=` and `hl=` from the query string of a map URL
pub fn parse_map_url(url: &str) -> Result<MapUrlParams> {
    let query = url
        .split_once('?')
        .map(|(_, query)| query)
        .ok_or_else(|| Error::InvalidInput(format!("URL has no query string: {url}")))?;
    let query = query.split('#').next().unwrap_or(query);

    let mut params = MapUrlParams::default();
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = value.replace("%2C", ",").replace("%2c", ",");

        match key {
            "zoom" | "z" => {
                let zoom = value
                    .parse::<u32>()
                    .map_err(|_| Error::InvalidInput(format!("invalid zoom '{value}' in URL")))?;
                params.zoom = Some(zoom);
            }
            "ll" => params.center = Some(value.parse()?),
            "hl" if !value.is_empty() => params.language = Some(value),
            _ => {}
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::Extent;

    fn tile() -> TileRequest {
        TileRequest {
            row: 0,
            column: 1,
            x: 640,
            y: 0,
            center: GeoPoint::from_degrees(55.928817, 37.758293).unwrap(),
            zoom: 12,
            size: Extent::new(360, 640),
        }
    }

    #[test]
    fn test_request_url_defaults() {
        let config = SourceConfig::default();
        assert_eq!(
            config.to_request_url(&tile()),
            "http://maps.google.com/staticmap?center=55.928817,37.758293&key=&format=jpeg&maptype=roadmap&zoom=12&size=360x640"
        );
    }

    #[test]
    fn test_request_url_with_language_and_key() {
        let config = SourceConfig {
            base_url: "http://localhost:8080/static".to_string(),
            api_key: Some("secret".to_string()),
            map_type: MapType::Satellite,
            language: Some("ru".to_string()),
            format: ImageFormat::Png32,
        };
        assert_eq!(
            config.to_request_url(&tile()),
            "http://localhost:8080/static?center=55.928817,37.758293&key=secret&format=png32&maptype=satellite&hl=ru&zoom=12&size=360x640"
        );
    }

    #[test]
    fn test_image_format_parsing() {
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("PNG32".parse::<ImageFormat>().unwrap(), ImageFormat::Png32);
        assert_eq!(
            "jpeg-baseline".parse::<ImageFormat>().unwrap(),
            ImageFormat::JpegBaseline
        );

        let err = "jpg".parse::<ImageFormat>().unwrap_err();
        assert!(err.to_string().contains("Did you mean 'jpeg'?"));
    }

    #[test]
    fn test_image_format_extensions() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::JpegBaseline.extension(), "jpg");
        assert_eq!(ImageFormat::Png8.extension(), "png");
        assert_eq!(ImageFormat::Png32.extension(), "png");
        assert_eq!(ImageFormat::Gif.extension(), "gif");
    }

    #[test]
    fn test_map_type_parsing() {
        for name in MapType::NAMES {
            let map_type: MapType = name.parse().unwrap();
            assert_eq!(map_type.name(), *name);
        }
        let err = "sattelite".parse::<MapType>().unwrap_err();
        assert!(err.to_string().contains("Did you mean 'satellite'?"));
    }

    #[test]
    fn test_parse_map_url() {
        let params = parse_map_url(
            "http://maps.google.com/maps?f=q&hl=en&ie=UTF8&ll=55.940068,37.779236&spn=0.041533,0.110035&z=13",
        )
        .unwrap();

        assert_eq!(params.zoom, Some(13));
        assert_eq!(params.language.as_deref(), Some("en"));
        let center = params.center.unwrap();
        assert!((center.lat_deg() - 55.940068).abs() < 1e-9);
        assert!((center.lon_deg() - 37.779236).abs() < 1e-9);
    }

    #[test]
    fn test_parse_map_url_encoded_comma() {
        let params = parse_map_url("https://maps.example.com/?zoom=4&ll=37.0625%2C-95.677068").unwrap();
        assert_eq!(params.zoom, Some(4));
        assert!(params.center.is_some());
        assert_eq!(params.language, None);
    }

    #[test]
    fn test_parse_map_url_errors() {
        assert!(parse_map_url("http://maps.google.com/maps").is_err());
        assert!(parse_map_url("http://maps.google.com/maps?zoom=abc").is_err());
        assert!(matches!(
            parse_map_url("http://maps.google.com/maps?ll=95.0,10.0"),
            Err(Error::InvalidCoordinate(_))
        ));
    }
}
