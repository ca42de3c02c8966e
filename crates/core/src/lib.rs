//! Client-side map data for OneBusAway.
//!
//! [`map::stop_cache`] keeps the stops around the visible map, fetched per
//! geohash cell and discarded once the cells scroll out of view.

pub mod logging;
pub mod map;

// Re-export transit from the transit crate
pub use oba_transit as transit;
