//! Region and image arguments
//!
//! The command line accepts the region in several overlapping forms. They are
//! folded here into one [`RegionSpec`] that the library resolves.

use std::str::FromStr;

use clap::Args;
use ozimap::core::zoom::pixel_size;
use ozimap::{parse_map_url, Error, Extent, GeoPoint, ImageFormat, RegionSpec, Result};

/// `ZOOM,WIDTH,HEIGHT` from `--region-pixel-size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub zoom: u32,
    pub width: u32,
    pub height: u32,
}

impl FromStr for PixelSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [zoom, width, height] = parts.as_slice() else {
            return Err(Error::InvalidInput(format!("expected ZOOM,WIDTH,HEIGHT, got '{s}'")));
        };

        Ok(Self {
            zoom: parse_number("zoom", zoom)?,
            width: parse_number("width", width)?,
            height: parse_number("height", height)?,
        })
    }
}

/// `WIDTH,HEIGHT,URL` from `--region-from-url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRegion {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

impl FromStr for UrlRegion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // The URL itself may contain commas
        let mut parts = s.splitn(3, ',');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(width), Some(height), Some(url)) if !url.trim().is_empty() => Ok(Self {
                width: parse_number("width", width.trim())?,
                height: parse_number("height", height.trim())?,
                url: url.trim().to_string(),
            }),
            _ => Err(Error::InvalidInput(format!("expected WIDTH,HEIGHT,URL, got '{s}'"))),
        }
    }
}

fn parse_number(name: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid {name} '{value}'")))
}

/// Image parameters
#[derive(Args, Debug, Clone, Default)]
pub struct ImageArgs {
    /// Image width in pixels
    #[arg(short = 'w', long = "image-width", value_name = "WIDTH")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(short = 'h', long = "image-height", value_name = "HEIGHT")]
    pub height: Option<u32>,

    /// Render at this zoom instead of picking one for the image size
    #[arg(short = 'z', long = "image-zoom", value_name = "ZOOM")]
    pub zoom: Option<u32>,

    /// Image type: jpeg, jpeg-baseline, png8, png32 or gif
    #[arg(short = 't', long = "image-type", value_name = "TYPE", default_value = "jpeg")]
    pub format: ImageFormat,
}

/// Region parameters
#[derive(Args, Debug, Clone, Default)]
pub struct RegionArgs {
    /// Region center
    #[arg(short = 'c', long = "region-center", value_name = "LAT,LON", allow_hyphen_values = true)]
    pub center: Option<GeoPoint>,

    /// Region north-east corner
    #[arg(short = 'n', long = "region-ne", value_name = "LAT,LON", allow_hyphen_values = true)]
    pub north_east: Option<GeoPoint>,

    /// Region south-west corner
    #[arg(short = 's', long = "region-sw", value_name = "LAT,LON", allow_hyphen_values = true)]
    pub south_west: Option<GeoPoint>,

    /// Region span in degrees
    #[arg(short = 'p', long = "region-size", value_name = "LAT,LON")]
    pub size: Option<GeoPoint>,

    /// Region span as an image of WIDTH x HEIGHT pixels at ZOOM
    #[arg(short = 'x', long = "region-pixel-size", value_name = "ZOOM,WIDTH,HEIGHT")]
    pub pixel_size: Option<PixelSize>,

    /// Center, zoom and language from a map URL, span as WIDTH x HEIGHT pixels
    #[arg(
        short = 'u',
        long = "region-from-url",
        value_name = "WIDTH,HEIGHT,URL",
        conflicts_with_all = ["center", "size", "pixel_size"]
    )]
    pub from_url: Option<UrlRegion>,
}

/// Region ready for resolution, plus the label language a map URL carried
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInput {
    pub spec: RegionSpec,
    pub language: Option<String>,
}

impl RegionArgs {
    /// Fold region and image arguments into one [`RegionSpec`]
    ///
    /// Explicit `-z`, `-w` and `-h` win over values implied by `-x` or `-u`.
    pub fn to_input(&self, image: &ImageArgs) -> Result<RegionInput> {
        let mut spec = RegionSpec {
            center: self.center.map(|p| p.to_projection()),
            north_east: self.north_east.map(|p| p.to_projection()),
            south_west: self.south_west.map(|p| p.to_projection()),
            size: self.size.map(|p| Extent::from_delta(p.to_projection())),
            zoom: image.zoom,
            width: image.width,
            height: image.height,
        };
        let mut language = None;

        if let Some(pixels) = &self.pixel_size {
            apply_pixel_size(&mut spec, pixels);
        }

        if let Some(from_url) = &self.from_url {
            let params = parse_map_url(&from_url.url)?;
            let zoom = params.zoom.ok_or_else(|| {
                Error::InvalidInput(format!("no zoom in URL {}", from_url.url))
            })?;
            let center = params.center.ok_or_else(|| {
                Error::InvalidInput(format!("no ll= center in URL {}", from_url.url))
            })?;

            spec.center = Some(center.to_projection());
            apply_pixel_size(
                &mut spec,
                &PixelSize {
                    zoom,
                    width: from_url.width,
                    height: from_url.height,
                },
            );
            language = params.language;
        }

        Ok(RegionInput { spec, language })
    }
}

fn apply_pixel_size(spec: &mut RegionSpec, pixels: &PixelSize) {
    let zoom = ozimap::core::zoom::clamp_zoom(pixels.zoom);
    let pixel = pixel_size(zoom);

    spec.size = Some(Extent::new(
        f64::from(pixels.width) * pixel.width,
        f64::from(pixels.height) * pixel.height,
    ));
    spec.zoom.get_or_insert(pixels.zoom);
    spec.width.get_or_insert(pixels.width);
    spec.height.get_or_insert(pixels.height);
}
