//! Geographic coordinates and distance calculations.
//!
//! The passive aggregator flushes observation buffers once the operator
//! has moved far enough from where a buffer was opened, so coordinate
//! distance is a first-class operation here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geographic coordinates (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

/// Errors produced by coordinate validation
#[derive(Debug, Error)]
pub enum GeoError {
    /// Latitude or longitude out of range
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

impl GeoCoordinate {
    /// Create a new geographic coordinate, validating ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "Latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "Longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another coordinate in meters (haversine).
    pub fn distance_m(&self, other: &GeoCoordinate) -> f64 {
        const EARTH_RADIUS_M: f64 = 6371000.0;

        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}
