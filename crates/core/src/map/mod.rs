pub mod geohash_cache;
pub mod stop_cache;

pub use geohash_cache::{Change, GeohashCache, GeohashCacheDifference};
pub use stop_cache::{LoadOutcome, StopCache, StopCacheDelegate, StopCacheError};
