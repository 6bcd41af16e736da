//! Geodetic point with altitude

use geo::Point;

/// A geodetic position: longitude/latitude in degrees plus altitude in meters
///
/// Points are never compared for exact equality; every comparison in the
/// engine goes through a distance threshold.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    /// x = longitude, y = latitude (degrees)
    position: Point<f64>,
    /// Altitude in meters above the reference sphere
    altitude: f64,
    /// Optional label (GeoJSON `title` of point features)
    name: Option<String>,
}

impl GeoPoint {
    /// Create a point at ground level
    #[inline]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self::with_altitude(longitude, latitude, 0.0)
    }

    /// Create a point with an explicit altitude in meters
    #[inline]
    pub fn with_altitude(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            position: Point::new(longitude, latitude),
            altitude,
            name: None,
        }
    }

    /// Attach a name to this point
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    /// Altitude in meters
    #[inline]
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The planar position as a `geo` point (x = lon, y = lat)
    #[inline]
    pub fn position(&self) -> Point<f64> {
        self.position
    }

    /// Same position with a different altitude
    pub(crate) fn at_altitude(&self, altitude: f64) -> Self {
        Self {
            altitude,
            ..self.clone()
        }
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(position: Point<f64>) -> Self {
        Self {
            position,
            altitude: 0.0,
            name: None,
        }
    }
}
