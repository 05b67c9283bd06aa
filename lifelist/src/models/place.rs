//! Places and their representative coordinates

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Parse the API's `"lat,lng"` location string
    ///
    /// Returns `None` unless both parts are finite numbers.
    pub fn parse(location: &str) -> Option<Self> {
        let (lat, lng) = location.split_once(',')?;
        let latitude: f64 = lat.trim().parse().ok()?;
        let longitude: f64 = lng.trim().parse().ok()?;

        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }

        Some(Self { latitude, longitude })
    }

    pub fn as_pair(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A named region with a lookup id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: u64,
    pub display_name: String,
    /// `None` when the API location was missing or unparseable
    pub location: Option<Coordinates>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        let c = Coordinates::parse("42.7634,-78.7761").unwrap();
        assert_eq!(c.latitude, 42.7634);
        assert_eq!(c.longitude, -78.7761);

        let c = Coordinates::parse(" 1.5 , 2 ").unwrap();
        assert_eq!(c.as_pair(), (1.5, 2.0));
    }

    #[test]
    fn test_parse_location_rejects_garbage() {
        assert_eq!(Coordinates::parse(""), None);
        assert_eq!(Coordinates::parse("42.7"), None);
        assert_eq!(Coordinates::parse("north,west"), None);
        assert_eq!(Coordinates::parse("NaN,1"), None);
    }
}
