//! Geographic <-> projection space conversions
//!
//! Projection space is the provider's normalized Mercator plane: `x` is the
//! longitude in radians and `y = atanh(sin(lat))`, so zoom level 0 covers the
//! `2π × 2π` square. `y` grows towards the north.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use serde::Serialize;

use crate::core::error::{Error, Result};

/// Degree values are rounded to this many steps per degree before being split
/// into degrees and minutes, hiding the noise of the radian round trip.
const DEGREE_STEPS: f64 = 1e9;

/// Minutes are kept to the precision the calibration file prints
const MINUTE_STEPS: f64 = 1e6;

/// A geographic location, stored in radians
///
/// Latitude is always inside `(-π/2, π/2)` for points built from user input;
/// longitude inside `[-π, π)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Build a point from degrees, rejecting poles and out-of-range values
    pub fn from_degrees(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(Error::InvalidCoordinate(format!(
                "{lat},{lon} is not a finite coordinate"
            )));
        }
        if lat <= -90.0 || lat >= 90.0 {
            return Err(Error::InvalidCoordinate(format!(
                "latitude {lat} must be strictly between -90 and 90"
            )));
        }
        if !(-180.0..180.0).contains(&lon) {
            return Err(Error::InvalidCoordinate(format!(
                "longitude {lon} must be in [-180, 180)"
            )));
        }

        Ok(Self {
            lat: lat.to_radians(),
            lon: lon.to_radians(),
        })
    }

    /// Latitude in radians
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in radians
    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat.to_degrees()
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon.to_degrees()
    }

    /// Forward projection
    pub fn to_projection(&self) -> ProjectedPoint {
        ProjectedPoint::new(self.lon, self.lat.sin().atanh())
    }

    /// Inverse projection, the exact left inverse of [`GeoPoint::to_projection`]
    pub fn from_projection(p: ProjectedPoint) -> Self {
        Self {
            lat: p.y.sinh().atan(),
            lon: p.x,
        }
    }

    /// Latitude split into degrees, minutes and `N`/`S`
    pub fn latitude_dm(&self) -> DegreeMinute {
        DegreeMinute::new(
            self.lat_deg(),
            Hemisphere::North,
            Hemisphere::South,
        )
    }

    /// Longitude split into degrees, minutes and `E`/`W`
    pub fn longitude_dm(&self) -> DegreeMinute {
        DegreeMinute::new(self.lon_deg(), Hemisphere::East, Hemisphere::West)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat_deg(), self.lon_deg())
    }
}

impl FromStr for GeoPoint {
    type Err = Error;

    /// Parses `"LAT,LON"` in signed decimal degrees
    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = parse_degree_pair(s)?;
        GeoPoint::from_degrees(lat, lon)
    }
}

/// Parse `"A,B"` into two finite decimal numbers
pub fn parse_degree_pair(s: &str) -> Result<(f64, f64)> {
    let mut parts = s.split(',').map(str::trim);

    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::InvalidCoordinate(format!(
            "'{s}' is not of the form LAT,LON"
        )));
    };

    let parse = |value: &str| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::InvalidCoordinate(format!("'{value}' is not a number")))
    };

    Ok((parse(a)?, parse(b)?))
}

/// A point in projection space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise absolute value
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }
}

impl Add for ProjectedPoint {
    type Output = ProjectedPoint;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for ProjectedPoint {
    type Output = ProjectedPoint;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for ProjectedPoint {
    type Output = ProjectedPoint;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for ProjectedPoint {
    type Output = ProjectedPoint;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// A width/height pair, in pixels (`Extent<u32>`) or projection units (`Extent<f64>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent<T> {
    pub width: T,
    pub height: T,
}

impl<T> Extent<T> {
    pub const fn new(width: T, height: T) -> Self {
        Self { width, height }
    }
}

impl Extent<f64> {
    /// Extent spanned by a projection-space difference vector
    pub fn from_delta(delta: ProjectedPoint) -> Self {
        let delta = delta.abs();
        Self::new(delta.x, delta.y)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Half of the extent as a projection-space vector
    pub fn half(self) -> ProjectedPoint {
        ProjectedPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Extent<u32> {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl<T: fmt::Display> fmt::Display for Extent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Hemisphere letter of a latitude or longitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn letter(&self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
            Hemisphere::East => "E",
            Hemisphere::West => "W",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// An angle in the degree/minute/hemisphere form used by calibration files
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DegreeMinute {
    /// Signed decimal degrees
    pub decimal: f64,
    /// Whole degrees of the magnitude, truncated
    pub degrees: u32,
    /// Remaining fraction of a degree, in minutes
    pub minutes: f64,
    pub hemisphere: Hemisphere,
}

impl DegreeMinute {
    fn new(decimal: f64, positive: Hemisphere, negative: Hemisphere) -> Self {
        let snapped = (decimal * DEGREE_STEPS).round() / DEGREE_STEPS;
        let magnitude = snapped.abs();
        let mut degrees = magnitude.trunc();
        let mut minutes = ((magnitude - degrees) * 60.0 * MINUTE_STEPS).round() / MINUTE_STEPS;

        // 59.9999999' rounds up to a whole degree
        if minutes >= 60.0 {
            degrees += 1.0;
            minutes = 0.0;
        }

        Self {
            decimal: snapped,
            degrees: degrees as u32,
            minutes,
            hemisphere: if snapped >= 0.0 { positive } else { negative },
        }
    }
}
