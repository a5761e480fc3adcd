//! Geographic bounding boxes and points.

use serde::{Deserialize, Serialize};

/// A point in latitude/longitude degrees.
///
/// Serialized with the `H`/`L` keys used by the campus dataset; `lat`/`lng`
/// are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(rename = "H", alias = "lat")]
    pub lat: f64,

    #[serde(rename = "L", alias = "lng")]
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned rectangle in latitude/longitude degrees.
///
/// A well-formed box has `north > south` and `east > west`; see
/// [`BoundingBox::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Check the box invariants, returning a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let finite = [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err("coordinates must be finite".to_string());
        }
        if self.north <= self.south {
            return Err(format!(
                "north ({}) must be greater than south ({})",
                self.north, self.south
            ));
        }
        if self.east <= self.west {
            return Err(format!(
                "east ({}) must be greater than west ({})",
                self.east, self.west
            ));
        }
        Ok(())
    }

    /// Latitude span in degrees.
    #[inline]
    pub fn d_lat(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    #[inline]
    pub fn d_lng(&self) -> f64 {
        self.east - self.west
    }

    /// Open-interval overlap test: boxes that only touch along an edge do
    /// not overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.north > other.south
            && self.south < other.north
    }

    /// Open-interval point containment, consistent with [`BoundingBox::overlaps`].
    pub fn contains(&self, point: &LatLng) -> bool {
        self.west < point.lng
            && self.east > point.lng
            && self.north > point.lat
            && self.south < point.lat
    }
}
