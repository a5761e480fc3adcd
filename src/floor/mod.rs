//! Floor image preparation.
//!
//! Floor plans are stored as raster assets that are usually drawn aligned to
//! the building rather than to true north. Before a floor can be cut into
//! tiles its image is loaded once, decoded and rotated so north points up.
//!
//! - [`ImageSource`]: where the encoded bytes come from
//! - [`FsImageSource`]: assets under a local static directory
//! - [`PreparedImage`]: the per-floor one-time gate holding the result

mod prepare;
mod source;

pub use prepare::{
    prepare_image, rotate_about_center, rotated_dimensions, PreparedImage, PreparedResult,
};
pub use source::{FsImageSource, ImageSource};
