//! In-memory building dataset with JSON persistence.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DatasetError;

use super::model::{Building, Floor, Item};

/// All buildings known to the server, sorted by building id.
///
/// The order is the order in which overlapping floors are composited, so
/// sorting at construction keeps rendered tiles deterministic.
#[derive(Debug, Default)]
pub struct Dataset {
    buildings: Vec<Arc<Building>>,

    /// Building summaries by code, rooms by `"{code} {room id}"`
    items: HashMap<String, Item>,
}

/// A floor together with the building that owns it.
#[derive(Debug, Clone)]
pub struct FloorRef {
    pub building: Arc<Building>,
    pub floor: Arc<Floor>,
}

impl Dataset {
    /// Build a dataset, validating floor geometry and floor names.
    ///
    /// Rooms get their owning building id and floor name filled in.
    pub fn new(mut buildings: Vec<Building>) -> Result<Self, DatasetError> {
        for building in &mut buildings {
            let mut names = HashSet::new();
            for floor in &mut building.floors {
                if !names.insert(floor.name.clone()) {
                    return Err(DatasetError::DuplicateFloor {
                        building: building.id.clone(),
                        floor: floor.name.clone(),
                    });
                }

                floor
                    .coords
                    .validate()
                    .map_err(|reason| DatasetError::InvalidGeometry {
                        building: building.id.clone(),
                        floor: floor.name.clone(),
                        reason,
                    })?;

                if let Some(floor) = Arc::get_mut(floor) {
                    let floor_name = floor.name.clone();
                    for room in &mut floor.rooms {
                        room.floor = floor_name.clone();
                        room.building_id = building.id.clone();
                    }
                }
            }
        }

        buildings.sort_by(|a, b| a.id.cmp(&b.id));

        let mut items = HashMap::new();
        for building in &buildings {
            items.insert(building.id.clone(), Item::Building(building.meta()));
            for room in building.floors.iter().flat_map(|f| f.rooms.iter()) {
                items.insert(
                    format!("{} {}", building.id, room.id),
                    Item::Room(room.clone()),
                );
            }
        }

        Ok(Self {
            buildings: buildings.into_iter().map(Arc::new).collect(),
            items,
        })
    }

    /// Parse a dataset from its JSON representation (an array of buildings).
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let buildings: Vec<Building> = serde_json::from_str(json)?;
        Self::new(buildings)
    }

    /// Load the dataset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let dataset = Self::from_json(&json)?;

        info!(
            path = %path.display(),
            buildings = dataset.buildings.len(),
            floors = dataset.floor_count(),
            "Loaded map data"
        );
        Ok(dataset)
    }

    /// Serialize the dataset as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DatasetError> {
        Ok(serde_json::to_string_pretty(&self.buildings)?)
    }

    /// Persist the dataset, replacing the file atomically.
    ///
    /// The JSON is written to a sibling temporary file which is then renamed
    /// over `path`, so readers never observe a partially written file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;

        debug!(path = %path.display(), "Saved map data");
        Ok(())
    }

    /// All buildings in id order.
    pub fn buildings(&self) -> &[Arc<Building>] {
        &self.buildings
    }

    /// Look up a building by id.
    pub fn building(&self, id: &str) -> Option<&Arc<Building>> {
        self.buildings
            .binary_search_by(|b| b.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.buildings[idx])
    }

    /// Look up a building summary or a room by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Look up a floor by building id and floor name.
    pub fn floor(&self, building_id: &str, floor_name: &str) -> Option<FloorRef> {
        let building = self.building(building_id)?;
        let floor = building.floor(floor_name)?;
        Some(FloorRef {
            building: Arc::clone(building),
            floor: Arc::clone(floor),
        })
    }

    /// Iterate over every floor in composition order.
    pub fn floors(&self) -> impl Iterator<Item = FloorRef> + '_ {
        self.buildings.iter().flat_map(|building| {
            building.floors.iter().map(move |floor| FloorRef {
                building: Arc::clone(building),
                floor: Arc::clone(floor),
            })
        })
    }

    /// Total number of floors.
    pub fn floor_count(&self) -> usize {
        self.buildings.iter().map(|b| b.floors.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}
