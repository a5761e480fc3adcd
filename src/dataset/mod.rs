//! Building dataset and spatial queries.
//!
//! The dataset is loaded once at startup from the campus map JSON and shared
//! read-only. Floor entities carry their own prepared-image gate, so the same
//! `Arc<Floor>` handed out by [`SpatialIndex`] queries is the unit of
//! memoization for image preparation.

mod model;
mod spatial;
mod store;

pub use model::{Building, Floor, Item, Room};
pub use spatial::SpatialIndex;
pub use store::{Dataset, FloorRef};
