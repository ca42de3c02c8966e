use oba_transit::{Geohash, TransitError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StopCacheError {
    #[error("No API service available")]
    ServiceUnavailable,

    /// Raised by the region query service; passed through untouched.
    #[error(transparent)]
    Service(#[from] TransitError),

    /// The server truncated its response. Nothing was cached; retry with
    /// `geohash.children()` to query smaller cells.
    #[error("Result limit exceeded for geohash {geohash} ({returned} stops returned)")]
    LimitExceeded { geohash: Geohash, returned: usize },
}

pub type Result<T> = std::result::Result<T, StopCacheError>;
