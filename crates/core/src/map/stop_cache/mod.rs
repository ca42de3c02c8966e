//! Geohash-partitioned stop cache in front of the stops-for-location API.
//!
//! The map controller marks the cells covering the viewport as active, then
//! calls [`StopCache::load_stops`] for each cell it wants. A load returns
//! immediately on a fresh hit, and otherwise fetches the cell's region from
//! the [`RegionQueryService`](oba_transit::RegionQueryService) and upserts the
//! result. Fetches run concurrently on the caller's task; only the final
//! cache mutation is serialized through the actor task.
//!
//! Entries age out lazily: expiry is checked on each load, never by a timer.
//! Nothing is evicted until [`StopCache::discard_contents_if_possible`] is
//! called, which drops every cell outside the active set.
//!
//! ```no_run
//! # use std::collections::HashSet;
//! # use std::sync::Arc;
//! # use oba_core::map::stop_cache::StopCache;
//! # use oba_core::transit::{Geohash, ServiceProvider};
//! # async fn example(provider: Arc<dyn ServiceProvider>, viewport: Vec<Geohash>) {
//! let cache = StopCache::new(Arc::downgrade(&provider));
//!
//! cache.set_active_geohashes(viewport.iter().cloned().collect()).await;
//! for geohash in &viewport {
//!     if let Err(error) = cache.load_stops(geohash).await {
//!         tracing::warn!(%geohash, %error, "failed to load stops");
//!     }
//! }
//!
//! let stops = cache.stops().await;
//! # }
//! ```

mod actor;
mod coalesce;
pub mod config;
mod delegate;
mod entry;
mod error;


use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use oba_transit::{Geohash, ServiceProvider, Stop};
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

use crate::map::geohash_cache::{GeohashCacheDifference, assert_geohash_precision};

use self::actor::{CacheActor, Command, run_notifier};
use self::coalesce::{InFlightLoads, Registration};

pub use config::StopCacheConfig;
pub use delegate::StopCacheDelegate;
pub use entry::Entry;
pub use error::{Result, StopCacheError};

pub type StopCacheDifference = GeohashCacheDifference<Geohash, Entry>;

const COMMAND_BUFFER: usize = 64;
const ACTOR_STOPPED: &str = "stop cache actor stopped while a handle was alive";

/// How a successful [`StopCache::load_stops`] was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fresh entry was already cached; no request was made.
    Fresh,
    /// This call fetched the cell and stored the result.
    Fetched,
    /// Another in-flight call for the same cell fetched it.
    Coalesced,
}

pub(crate) struct Shared {
    commands: mpsc::Sender<Command>,
    provider: RwLock<Weak<dyn ServiceProvider>>,
    in_flight: InFlightLoads,
    config: StopCacheConfig,
}

/// Cheaply cloneable handle to a stop cache.
///
/// The provider and delegate are held weakly; when either is gone, loads fail
/// with [`StopCacheError::ServiceUnavailable`] and notifications are skipped.
///
/// Must be created inside a tokio runtime. The background tasks stop once
/// every handle is dropped.
#[derive(Clone)]
pub struct StopCache {
    shared: Arc<Shared>,
}

impl StopCache {
    pub const DEFAULT_GEOHASH_PRECISION: usize = config::DEFAULT_GEOHASH_PRECISION;
    pub const DEFAULT_EXPIRATION: Duration =
        Duration::from_secs(config::DEFAULT_EXPIRATION_MINUTES * 60);

    pub fn new(provider: Weak<dyn ServiceProvider>) -> Self {
        Self::with_config(provider, StopCacheConfig::default())
    }

    pub fn with_config(provider: Weak<dyn ServiceProvider>, config: StopCacheConfig) -> Self {
        let (commands, command_receiver) = mpsc::channel(COMMAND_BUFFER);
        let (notifications, notification_receiver) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            commands,
            provider: RwLock::new(provider),
            in_flight: InFlightLoads::default(),
            config,
        });

        let actor = CacheActor::new(command_receiver, notifications, shared.config.precision);
        tokio::spawn(actor.run());
        tokio::spawn(run_notifier(notification_receiver, Arc::downgrade(&shared)));

        Self { shared }
    }

    pub fn config(&self) -> &StopCacheConfig {
        &self.shared.config
    }

    pub async fn set_service_provider(&self, provider: Weak<dyn ServiceProvider>) {
        *self.shared.provider.write().await = provider;
    }

    pub async fn set_delegate(&self, delegate: Weak<dyn StopCacheDelegate>) {
        self.request(|reply| Command::SetDelegate {
            delegate: Some(delegate),
            reply,
        })
        .await
    }

    pub async fn clear_delegate(&self) {
        self.request(|reply| Command::SetDelegate {
            delegate: None,
            reply,
        })
        .await
    }

    /// Make sure a fresh entry for `geohash` is cached.
    ///
    /// Fresh hits return without touching the network. Stale hits and misses
    /// fetch the cell's region and upsert the result, notifying the delegate.
    /// A failed load leaves the cache exactly as it was; retrying is up to
    /// the caller.
    #[instrument(level = "trace", skip_all, fields(geohash = %geohash))]
    pub async fn load_stops(&self, geohash: &Geohash) -> Result<LoadOutcome> {
        let ttl = self.shared.config.expiration();

        loop {
            match self.entry(geohash).await {
                Some(entry) if !entry.is_expired(ttl, Instant::now()) => {
                    trace!("cache still fresh");
                    return Ok(LoadOutcome::Fresh);
                }
                Some(_) => trace!("cache stale"),
                None => trace!("cache miss"),
            }

            if !self.shared.config.coalesce_in_flight {
                return self.fetch(geohash).await.map(|()| LoadOutcome::Fetched);
            }

            match self.shared.in_flight.register(geohash) {
                Registration::Leader(guard) => {
                    let result = self.fetch(geohash).await;
                    guard.complete(&result);
                    return result.map(|()| LoadOutcome::Fetched);
                }
                Registration::Follower(mut receiver) => match receiver.recv().await {
                    Ok(result) => return result.map(|()| LoadOutcome::Coalesced),
                    Err(_) => debug!("in-flight load was abandoned, retrying"),
                },
            }
        }
    }

    async fn fetch(&self, geohash: &Geohash) -> Result<()> {
        let provider = self.shared.provider.read().await.upgrade();
        let service = provider
            .and_then(|provider| provider.region_query_service())
            .ok_or(StopCacheError::ServiceUnavailable)?;

        let response = service.stops_in_region(geohash.region()).await?;

        if response.is_limit_exceeded() {
            let returned = response.stops.len();
            warn!(returned, "server result limit exceeded, not caching");
            return Err(StopCacheError::LimitExceeded {
                geohash: geohash.clone(),
                returned,
            });
        }

        let entry = Entry::new(geohash, response.stops);
        debug!(stops = entry.stops().len(), "caching fetched stops");

        self.request(|reply| Command::Upsert {
            geohash: geohash.clone(),
            entry,
            reply,
        })
        .await;

        Ok(())
    }

    /// Drop every cell outside the active set and report what was removed.
    pub async fn discard_contents_if_possible(&self) -> StopCacheDifference {
        self.request(|reply| Command::Discard { reply }).await
    }

    /// Replace the set of cells protected from discarding.
    ///
    /// # Panics
    ///
    /// In debug builds, if any geohash is not at the configured precision.
    /// Release builds do not check.
    pub async fn set_active_geohashes(&self, geohashes: HashSet<Geohash>) {
        // Fail in the caller's task; the actor's cache repeats this check
        assert_geohash_precision(&geohashes, self.shared.config.precision);

        self.request(|reply| Command::SetActiveGeohashes { geohashes, reply })
            .await
    }

    /// Every cached stop, flattened across cells. Rebuilt on each call.
    pub async fn stops(&self) -> Vec<Stop> {
        self.request(|reply| Command::Stops { reply }).await
    }

    pub async fn geohashes(&self) -> HashSet<Geohash> {
        self.request(|reply| Command::Geohashes { reply }).await
    }

    pub async fn entry(&self, geohash: &Geohash) -> Option<Entry> {
        self.request(|reply| Command::Entry {
            geohash: geohash.clone(),
            reply,
        })
        .await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> T {
        let (reply, response) = oneshot::channel();

        self.shared
            .commands
            .send(command(reply))
            .await
            .expect(ACTOR_STOPPED);

        response.await.expect(ACTOR_STOPPED)
    }
}

impl fmt::Debug for StopCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopCache")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
