//! Pluggable networking traits.
//!
//! The app's REST client implements these; the map caches only ever see the
//! traits.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::models::types::{Result, Stop};
use crate::spatial::CoordinateRegion;

/// Decoded body of a stops-for-location response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionStops {
    pub stops: Vec<Stop>,
    /// Set by the server when it truncated `stops` to its per-request limit
    pub limit_exceeded: Option<bool>,
    pub out_of_range: Option<bool>,
}

impl RegionStops {
    pub fn new(stops: Vec<Stop>) -> Self {
        Self {
            stops,
            ..Self::default()
        }
    }

    pub fn is_limit_exceeded(&self) -> bool {
        self.limit_exceeded.unwrap_or(false)
    }
}

/// Query stops inside a coordinate region
///
/// Transport and decoding failures must be returned as errors, never as an
/// empty `RegionStops`.
pub trait RegionQueryService: Send + Sync {
    fn stops_in_region<'a>(
        &'a self,
        region: CoordinateRegion,
    ) -> Pin<Box<dyn Future<Output = Result<RegionStops>> + Send + 'a>>;
}

/// Hands out the current region query service, if one is configured
pub trait ServiceProvider: Send + Sync {
    /// `None` while the app has no region selected or is tearing down.
    fn region_query_service(&self) -> Option<Arc<dyn RegionQueryService>>;
}
