//! Spatial queries over the building dataset.
//!
//! The campus has on the order of a hundred buildings, so the dataset answers
//! these queries with a linear scan. Consumers only see [`SpatialIndex`] and
//! can be handed a tree-backed index instead.

use std::sync::Arc;

use crate::geo::BoundingBox;

use super::model::Building;
use super::store::{Dataset, FloorRef};

/// Overlap queries used to decide which floors appear in a tile.
pub trait SpatialIndex: Send + Sync {
    /// Buildings whose position lies in `bounds` or which have a floor
    /// overlapping it, in a stable order.
    fn overlapping_buildings(&self, bounds: &BoundingBox) -> Vec<Arc<Building>>;

    /// Floors named `floor_name` whose extent overlaps `bounds`.
    fn overlapping_floors(&self, bounds: &BoundingBox, floor_name: &str) -> Vec<FloorRef> {
        let mut floors = Vec::new();
        for building in self.overlapping_buildings(bounds) {
            for floor in &building.floors {
                if floor.name == floor_name && bounds.overlaps(&floor.coords) {
                    floors.push(FloorRef {
                        building: Arc::clone(&building),
                        floor: Arc::clone(floor),
                    });
                }
            }
        }
        floors
    }
}

impl SpatialIndex for Dataset {
    fn overlapping_buildings(&self, bounds: &BoundingBox) -> Vec<Arc<Building>> {
        self.buildings()
            .iter()
            .filter(|b| b.overlaps(bounds))
            .cloned()
            .collect()
    }
}
