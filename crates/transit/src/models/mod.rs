//! Transit data models and errors.

pub mod types;

// Re-exports for convenience
pub use types::{
    Result, Stop, StopDirection, StopLocationType, TransitError, WheelchairBoarding,
};
