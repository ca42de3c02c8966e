//! Networking abstractions.

pub mod traits;

pub use traits::{RegionQueryService, RegionStops, ServiceProvider};
