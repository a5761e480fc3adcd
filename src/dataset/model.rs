//! Building, floor and room records.
//!
//! Field names follow the campus map JSON: buildings are keyed by their SIS
//! code (`sis`), floors by `floor`, points use `H`/`L`. Building metadata
//! keys are capitalized in existing files, lowercase is accepted too.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::floor::{ImageSource, PreparedImage, PreparedResult};
use crate::geo::{BoundingBox, LatLng};

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

/// A campus building and its floors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Building {
    /// Stable short code identifying the building
    #[serde(rename = "sis", default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LatLng>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floors: Vec<Arc<Floor>>,

    #[serde(rename = "Address", alias = "address", default)]
    pub address: String,

    #[serde(rename = "Image", alias = "image", default)]
    pub image: String,

    #[serde(rename = "Description", alias = "description", default)]
    pub description: String,
}

impl Building {
    /// Public-facing summary without floors or description.
    pub fn meta(&self) -> Building {
        Building {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            floors: Vec::new(),
            address: self.address.clone(),
            image: self.image.clone(),
            description: String::new(),
        }
    }

    /// Find a floor by name.
    pub fn floor(&self, name: &str) -> Option<&Arc<Floor>> {
        self.floors.iter().find(|f| f.name == name)
    }

    /// Whether the building's position or any of its floors overlaps `bounds`.
    pub fn overlaps(&self, bounds: &BoundingBox) -> bool {
        if self.position.is_some_and(|p| bounds.contains(&p)) {
            return true;
        }
        self.floors.iter().any(|f| bounds.overlaps(&f.coords))
    }
}

/// One floor of a building with its geo-referenced plan image.
#[derive(Debug, Serialize, Deserialize)]
pub struct Floor {
    #[serde(rename = "floor")]
    pub name: String,

    pub coords: BoundingBox,

    /// Asset reference of the plan image, relative to the static root
    #[serde(default)]
    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<Room>,

    /// Degrees to rotate the plan so that north points up
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,

    #[serde(skip)]
    prepared: PreparedImage,
}

impl Floor {
    pub fn new(name: impl Into<String>, coords: BoundingBox, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coords,
            image: image.into(),
            rooms: Vec::new(),
            rotation: 0.0,
            prepared: PreparedImage::new(),
        }
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    /// The north-aligned plan image, loaded and rotated on first use.
    pub async fn prepared_image<S>(&self, source: &S) -> PreparedResult
    where
        S: ImageSource + ?Sized,
    {
        self.prepared
            .get_or_prepare(source, &self.image, self.rotation)
            .await
    }

    /// Whether preparation has completed (successfully or not).
    pub async fn is_prepared(&self) -> bool {
        self.prepared.is_ready().await
    }

    /// Forget the prepared image or recorded failure.
    pub async fn reset_prepared(&self) {
        self.prepared.reset().await;
    }

    /// Prepare the image and report only the failure, if any.
    pub async fn warm<S>(&self, source: &S) -> Result<(), AssetError>
    where
        S: ImageSource + ?Sized,
    {
        self.prepared_image(source).await.map(|_| ())
    }
}

/// Something that can be looked up by id: a building summary or a room.
///
/// Serializes as the inner record.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Item {
    Building(Building),
    Room(Room),
}

/// A room on a floor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: String,

    /// Code of the owning building, filled in on load
    #[serde(rename = "sis", default, skip_serializing_if = "String::is_empty")]
    pub building_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LatLng>,

    /// Position relative to the floor image, used when editing plans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_position: Option<LatLng>,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Name of the owning floor, filled in on load
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub floor: String,
}
