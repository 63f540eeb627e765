//! # GPS Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The most recent position/time reading decoded from the GPS receiver.
///
/// All fields are `None` until the first valid sentence has been received. The fields are only
/// ever replaced together, so a reader never sees the latitude of one fix paired with the
/// longitude of another.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in decimal degrees followed by the hemisphere, e.g. `"48.117300 N"`
    #[serde(rename = "lat")]
    pub latitude: Option<String>,

    /// Longitude in decimal degrees followed by the hemisphere, e.g. `"11.516667 E"`
    #[serde(rename = "lon")]
    pub longitude: Option<String>,

    /// UTC time of the fix, `HH:MM:SS[.ffffff]`
    #[serde(rename = "time")]
    pub timestamp: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GpsFix {
    /// True if no fix has been acquired yet.
    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none() && self.timestamp.is_none()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gps_fix_json() {
        let empty = serde_json::to_value(&GpsFix::default()).unwrap();
        assert_eq!(
            empty,
            serde_json::json!({"lat": null, "lon": null, "time": null})
        );

        let fix = GpsFix {
            latitude: Some("48.117300 N".into()),
            longitude: Some("11.516667 E".into()),
            timestamp: Some("12:35:19".into()),
        };
        assert!(!fix.is_empty());
        assert_eq!(
            serde_json::to_value(&fix).unwrap(),
            serde_json::json!({"lat": "48.117300 N", "lon": "11.516667 E", "time": "12:35:19"})
        );
    }
}
