//! # oba-transit
//!
//! Transit domain data for the OneBusAway map: stops, geohash cells and the
//! contracts of the remote services that supply them.
//!
//! ## Features
//!
//! - **Geohash cells**: encode/decode, bounds, neighbours and viewport coverage
//! - **Stop models**: the domain objects returned by stops-for-location queries
//! - **Pluggable networking**: implement [`RegionQueryService`] to fetch stops
//!
//! ## Example
//!
//! ```
//! use oba_transit::prelude::*;
//! use geo::Point;
//!
//! let geohash = Geohash::encode(Point::new(-122.3321, 47.6062), 6).unwrap();
//! assert_eq!(geohash.precision(), 6);
//! assert!(geohash.region().contains(Point::new(-122.3321, 47.6062)));
//!
//! let parsed: Geohash = geohash.as_str().parse().unwrap();
//! assert_eq!(parsed, geohash);
//! ```

pub mod geohash;
pub mod identifiers;
pub mod models;
pub mod network;
pub mod spatial;

// Geometry types used throughout the public API
pub use geo;

// Re-exports for convenience
pub mod prelude {
    pub use crate::geohash::{CompassPoint, Geohash, GeohashError, Neighbors};
    pub use crate::identifiers::*;
    pub use crate::models::types::*;
    pub use crate::network::traits::*;
    pub use crate::spatial::CoordinateRegion;
}

pub use prelude::*;
