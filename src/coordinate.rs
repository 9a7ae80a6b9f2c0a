use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A latitude/longitude pair in decimal degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    #[serde(rename = "lng")]
    lon: f64,
}

impl Coordinate {
    /// Latitude must lie in [-90, 90] and longitude in [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Coordinate> {
        ensure_within(lat, -90.0, 90.0, "Latitude")?;
        ensure_within(lon, -180.0, 180.0, "Longitude")?;
        Ok(Coordinate { lat, lon })
    }

    pub fn new_unchecked(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    /// Parse from decimal (`37.5665`) or DMS (`37°33'59.4"N`) text.
    pub fn parse(lat: &str, lon: &str) -> Result<Coordinate> {
        let lat_f = match lat.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => latlon::parse_lat(lat.trim().replace(" deg", "°"))
                .map_err(|e| Error::InvalidCoordinate(format!("{lat}: {e:?}")))?,
        };
        let lon_f = match lon.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => latlon::parse_lng(lon.trim().replace(" deg", "°"))
                .map_err(|e| Error::InvalidCoordinate(format!("{lon}: {e:?}")))?,
        };
        Coordinate::new(lat_f, lon_f)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Re-check the range invariant, e.g. after deserializing untrusted input.
    pub fn validate(self) -> Result<Coordinate> {
        Coordinate::new(self.lat, self.lon)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Point<f64> {
        // geo points are (x, y) = (lon, lat)
        Point::new(c.lon, c.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

fn ensure_within(value: f64, min: f64, max: f64, label: &str) -> Result<f64> {
    // NaN fails both comparisons, so test the accepted range instead
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidCoordinate(format!(
            "{label} must be between {min} and {max} degrees, got {value}"
        )))
    }
}
