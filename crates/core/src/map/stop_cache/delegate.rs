use futures_util::future::BoxFuture;

use super::{StopCache, StopCacheDifference};

/// Receives every non-empty difference produced by a [`StopCache`].
///
/// Called from a dedicated notifier task, one difference at a time, in the
/// order the cache produced them. The callback may freely call back into the
/// cache.
pub trait StopCacheDelegate: Send + Sync {
    fn cache_did_update<'a>(
        &'a self,
        cache: &'a StopCache,
        difference: StopCacheDifference,
    ) -> BoxFuture<'a, ()>;
}
