//! Weather lookup collaborator.
//!
//! Only a fixed stand-in is shipped; a real provider plugs in behind
//! [`WeatherService`].

use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Text reported by [`FixedWeather`] when none is configured.
pub const DETECTED_WEATHER: &str = "Breezy, 18°C (Detected)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::Config(format!("Latitude {} out of range", latitude)));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::Config(format!("Longitude {} out of range", longitude)));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Parses `LAT,LON`.
impl FromStr for Coordinates {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| Error::Config(format!("Invalid location '{}'. Expected LAT,LON", s)))?;

        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| Error::Config(format!("Invalid coordinate '{}'", v.trim())))
        };

        Self::new(parse(lat)?, parse(lon)?)
    }
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn fetch_weather(&self, coords: Coordinates) -> Result<String>;
}

/// Reports the same description for every location.
pub struct FixedWeather {
    description: String,
}

impl FixedWeather {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl Default for FixedWeather {
    fn default() -> Self {
        Self::new(DETECTED_WEATHER)
    }
}

#[async_trait]
impl WeatherService for FixedWeather {
    async fn fetch_weather(&self, coords: Coordinates) -> Result<String> {
        tracing::debug!("Reporting fixed weather for {}", coords);
        Ok(self.description.clone())
    }
}
