//! Regions and distance utilities.

pub mod queries;
pub mod region;

pub use queries::haversine_distance;
pub use region::CoordinateRegion;
