//! In-flight load coalescing.
//!
//! When several callers miss on the same geohash at once, the first becomes
//! the leader and performs the fetch; the rest subscribe to its result.
//!
//! ```text
//! load_stops(c23nb) ─┐
//!                    │                               region
//! load_stops(c23nb) ─┼──► InFlightLoads ──► leader ──► query ──► upsert
//!                    │         │                                   │
//! load_stops(c23nb) ─┘         ▼                                   │
//!                        followers await ◄──── broadcast result ◄──┘
//! ```
//!
//! A leader that is dropped before completing closes its channel; followers
//! see the closed channel and start their own load.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use oba_transit::Geohash;
use tokio::sync::broadcast;
use tracing::debug;

use super::error::Result;

pub(crate) type LoadResult = Result<()>;

#[derive(Default)]
pub(crate) struct InFlightLoads {
    in_flight: DashMap<Geohash, broadcast::Sender<LoadResult>>,
}

pub(crate) enum Registration<'a> {
    Leader(InFlightGuard<'a>),
    Follower(broadcast::Receiver<LoadResult>),
}

impl InFlightLoads {
    pub(crate) fn register(&self, geohash: &Geohash) -> Registration<'_> {
        match self.in_flight.entry(geohash.clone()) {
            Entry::Occupied(entry) => {
                debug!(%geohash, "joining in-flight load");
                Registration::Follower(entry.get().subscribe())
            }
            Entry::Vacant(entry) => {
                // Only one result is ever sent per channel
                let (sender, _) = broadcast::channel(1);
                entry.insert(sender.clone());
                Registration::Leader(InFlightGuard {
                    loads: self,
                    geohash: geohash.clone(),
                    sender,
                })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    fn release(&self, geohash: &Geohash, sender: &broadcast::Sender<LoadResult>) {
        self.in_flight
            .remove_if(geohash, |_, registered| registered.same_channel(sender));
    }
}

/// Held by the leader for the duration of its fetch.
pub(crate) struct InFlightGuard<'a> {
    loads: &'a InFlightLoads,
    geohash: Geohash,
    sender: broadcast::Sender<LoadResult>,
}

impl InFlightGuard<'_> {
    pub(crate) fn complete(self, result: &LoadResult) {
        self.loads.release(&self.geohash, &self.sender);

        let waiters = self.sender.receiver_count();
        if waiters > 0 {
            debug!(geohash = %self.geohash, waiters, "sharing load result");
            let _ = self.sender.send(result.clone());
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.loads.release(&self.geohash, &self.sender);
    }
}
