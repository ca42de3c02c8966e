//! Cached fetch results.

use std::sync::Arc;
use std::time::Duration;

use oba_transit::{Geohash, Stop};
use tokio::time::Instant;

/// Stops fetched for one geohash cell.
///
/// Immutable: a refresh replaces the whole entry. Copies handed out through
/// cache differences are snapshots and may already be stale.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    id: Arc<str>,
    stops: Arc<[Stop]>,
    created_at: Instant,
}

impl Entry {
    pub fn new(geohash: &Geohash, stops: Vec<Stop>) -> Self {
        Self {
            id: geohash.as_str().into(),
            stops: stops.into(),
            created_at: Instant::now(),
        }
    }

    /// The geohash string this entry was fetched for.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Expired once its age reaches `ttl`.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.age(now) >= ttl
    }
}
