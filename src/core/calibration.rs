//! OziExplorer calibration fields and template rendering
//!
//! The `.map` file is produced from a line-oriented template in which every
//! `%NAME%` placeholder is replaced by the matching calibration field.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::core::error::{Error, Result};
use crate::core::projection::{DegreeMinute, Extent, GeoPoint};
use crate::core::region::Region;
use crate::core::zoom::meters_per_pixel;

/// Built-in OziExplorer 2.2 map template
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/ozi22.map");

/// Copyright line used when none is given
pub const DEFAULT_COPYRIGHT: &str = "ozimap";

/// Flat name -> value mapping consumed by the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalibrationFields {
    fields: BTreeMap<&'static str, String>,
}

impl CalibrationFields {
    /// Fields for an image whose corners are `north_west` and `south_east`
    pub fn build(
        north_west: GeoPoint,
        south_east: GeoPoint,
        image_size: Extent<u32>,
        image_path: &str,
        copyright: &str,
    ) -> Self {
        let mut fields = BTreeMap::new();

        fields.insert("COPYRIGHT", copyright.to_string());
        fields.insert("IMAGE_PATH", image_path.to_string());
        fields.insert("IMAGE_WIDTH", image_size.width.to_string());
        fields.insert("IMAGE_HEIGHT", image_size.height.to_string());
        fields.insert("INIT_X", "0".to_string());
        fields.insert("INIT_Y", "0".to_string());
        fields.insert("SCALE", format_decimal(1.0, 6));

        insert_angle(&mut fields, ["NW_LAT", "NW_LAT_DEG", "NW_LAT_MIN", "NW_LAT_HEMI"], north_west.latitude_dm());
        insert_angle(&mut fields, ["NW_LON", "NW_LON_DEG", "NW_LON_MIN", "NW_LON_HEMI"], north_west.longitude_dm());
        insert_angle(&mut fields, ["SE_LAT", "SE_LAT_DEG", "SE_LAT_MIN", "SE_LAT_HEMI"], south_east.latitude_dm());
        insert_angle(&mut fields, ["SE_LON", "SE_LON_DEG", "SE_LON_MIN", "SE_LON_HEMI"], south_east.longitude_dm());

        Self { fields }
    }

    /// Fields for a resolved region, with the scale taken at its center
    pub fn for_region(region: &Region, image_path: &str, copyright: &str) -> Self {
        let scale = meters_per_pixel(region.zoom, region.geo_center().lat());

        Self::build(
            region.geo_north_west(),
            region.geo_south_east(),
            region.image_size,
            image_path,
            copyright,
        )
        .with_scale(scale)
    }

    /// Ground resolution written to `SCALE`, in metres per pixel
    pub fn with_scale(mut self, meters_per_pixel: f64) -> Self {
        self.fields.insert("SCALE", format_decimal(meters_per_pixel, 6));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }

    /// Substitute every `%NAME%` placeholder of `template`, line by line
    ///
    /// Unknown placeholders and lone `%` signs are copied unchanged.
    pub fn render(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len() + 256);
        for line in template.lines() {
            self.render_line(line, &mut output);
            output.push('\n');
        }
        output
    }

    fn render_line(&self, line: &str, output: &mut String) {
        let mut rest = line;
        while let Some(start) = rest.find('%') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            match after.find('%') {
                Some(end) => match self.fields.get(&after[..end]) {
                    Some(value) => {
                        output.push_str(value);
                        rest = &after[end + 1..];
                    }
                    None => {
                        // Keep the `%` and rescan from the next one
                        output.push('%');
                        rest = after;
                    }
                },
                None => {
                    output.push('%');
                    rest = after;
                }
            }
        }
        output.push_str(rest);
    }
}

fn insert_angle(
    fields: &mut BTreeMap<&'static str, String>,
    [decimal, degrees, minutes, hemisphere]: [&'static str; 4],
    angle: DegreeMinute,
) {
    fields.insert(decimal, format_decimal(angle.decimal, 8));
    fields.insert(degrees, angle.degrees.to_string());
    fields.insert(minutes, format_decimal(angle.minutes, 6));
    fields.insert(hemisphere, angle.hemisphere.letter().to_string());
}

/// Fixed-point formatting without trailing zeros, always keeping one decimal
///
/// `0.0` -> `"0.0"`, `55.5` -> `"55.5"`, `1.0/3.0` with 4 decimals -> `"0.3333"`.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let mut text = format!("{value:.decimals$}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').len();
        text.truncate(trimmed);
        if text.ends_with('.') {
            text.push('0');
        }
    }
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text.remove(0);
    }
    text
}

/// Load the calibration template, the built-in one when `path` is `None`
pub fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        None => Ok(DEFAULT_TEMPLATE.to_string()),
        Some(path) if !path.is_file() => Err(Error::TemplateFileMissing(path.to_path_buf())),
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// How the map file refers to its image: bare name when they share a directory
pub fn image_path_reference(map_path: &Path, image_path: &Path) -> String {
    let same_dir = match (map_path.parent(), image_path.parent()) {
        (Some(map_dir), Some(image_dir)) => map_dir == image_dir,
        _ => false,
    };

    match image_path.file_name() {
        Some(name) if same_dir => name.to_string_lossy().into_owned(),
        _ => image_path.display().to_string(),
    }
}
