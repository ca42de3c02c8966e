//! The task that owns the cache.
//!
//! Every read and write of the underlying [`GeohashCache`] goes through
//! [`CacheActor::handle`], which never suspends, so commands apply one at a
//! time and no mutation is ever observed half-done. Delegate callbacks run on
//! a separate notifier task so a slow delegate cannot stall the cache.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use oba_transit::{Geohash, Stop};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::{Entry, Shared, StopCache, StopCacheDelegate, StopCacheDifference};
use crate::map::geohash_cache::GeohashCache;

pub(crate) enum Command {
    Entry {
        geohash: Geohash,
        reply: oneshot::Sender<Option<Entry>>,
    },
    Upsert {
        geohash: Geohash,
        entry: Entry,
        reply: oneshot::Sender<()>,
    },
    Discard {
        reply: oneshot::Sender<StopCacheDifference>,
    },
    SetActiveGeohashes {
        geohashes: HashSet<Geohash>,
        reply: oneshot::Sender<()>,
    },
    SetDelegate {
        delegate: Option<Weak<dyn StopCacheDelegate>>,
        reply: oneshot::Sender<()>,
    },
    Stops {
        reply: oneshot::Sender<Vec<Stop>>,
    },
    Geohashes {
        reply: oneshot::Sender<HashSet<Geohash>>,
    },
}

pub(crate) struct Notification {
    delegate: Arc<dyn StopCacheDelegate>,
    difference: StopCacheDifference,
}

pub(crate) struct CacheActor {
    commands: mpsc::Receiver<Command>,
    cache: GeohashCache<Entry>,
    delegate: Option<Weak<dyn StopCacheDelegate>>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl CacheActor {
    pub(crate) fn new(
        commands: mpsc::Receiver<Command>,
        notifications: mpsc::UnboundedSender<Notification>,
        precision: usize,
    ) -> Self {
        Self {
            commands,
            cache: GeohashCache::with_expected_precision(precision),
            delegate: None,
            notifications,
        }
    }

    /// Runs until every [`StopCache`] handle has been dropped.
    pub(crate) async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        debug!(entries = self.cache.len(), "stop cache dropped");
    }

    fn handle(&mut self, command: Command) {
        // Replies fail only when the caller was cancelled; nothing to do then.
        match command {
            Command::Entry { geohash, reply } => {
                let _ = reply.send(self.cache.get(&geohash).cloned());
            }
            Command::Upsert {
                geohash,
                entry,
                reply,
            } => {
                let difference = self.cache.upsert(geohash, entry);
                self.notify(difference);
                let _ = reply.send(());
            }
            Command::Discard { reply } => {
                trace!(size = self.cache.len(), "discarding content");
                let difference = self.cache.discard_content_if_possible();
                trace!(size = self.cache.len(), "finished discarding content");

                self.notify(difference.clone());
                let _ = reply.send(difference);
            }
            Command::SetActiveGeohashes { geohashes, reply } => {
                trace!(?geohashes, "new active geohashes");
                self.cache.set_active_geohashes(geohashes);
                let _ = reply.send(());
            }
            Command::SetDelegate { delegate, reply } => {
                self.delegate = delegate;
                let _ = reply.send(());
            }
            Command::Stops { reply } => {
                let stops = self
                    .cache
                    .elements()
                    .flat_map(|entry| entry.stops().iter().cloned())
                    .collect();
                let _ = reply.send(stops);
            }
            Command::Geohashes { reply } => {
                let _ = reply.send(self.cache.geohashes().cloned().collect());
            }
        }
    }

    fn notify(&self, difference: StopCacheDifference) {
        if difference.is_empty() {
            return;
        }

        let Some(delegate) = self.delegate.as_ref().and_then(Weak::upgrade) else {
            return;
        };

        // The notifier outlives the actor, so this only fails during shutdown
        let _ = self.notifications.send(Notification {
            delegate,
            difference,
        });
    }
}

/// Delivers differences to delegates in the order the actor produced them.
pub(crate) async fn run_notifier(
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    shared: Weak<Shared>,
) {
    while let Some(Notification {
        delegate,
        difference,
    }) = notifications.recv().await
    {
        let Some(shared) = shared.upgrade() else {
            break;
        };

        let cache = StopCache { shared };
        delegate.cache_did_update(&cache, difference).await;
    }
}
