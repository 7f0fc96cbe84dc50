pub mod bounding_box;
pub mod coordinate;
pub mod measure;

pub use bounding_box::BoundingBox;
pub use coordinate::Coordinate;
