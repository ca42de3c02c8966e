//! Core data types and enums for transit data.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Compass heading of vehicles serving a stop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StopDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
    Unknown,
}

impl StopDirection {
    /// Parse the API's direction field (`"N"`, `"se"`, ...). Case-insensitive.
    pub fn from_abbreviation(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "n" => Self::N,
            "ne" => Self::NE,
            "e" => Self::E,
            "se" => Self::SE,
            "s" => Self::S,
            "sw" => Self::SW,
            "w" => Self::W,
            "nw" => Self::NW,
            _ => Self::Unknown,
        }
    }
}

/// GTFS `location_type`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StopLocationType {
    Stop = 0,
    Station = 1,
    StationEntrance = 2,
    Unknown = u8::MAX,
}

impl StopLocationType {
    pub fn from_gtfs(value: i64) -> Self {
        match value {
            0 => Self::Stop,
            1 => Self::Station,
            2 => Self::StationEntrance,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WheelchairBoarding {
    Accessible,
    NotAccessible,
    #[default]
    Unknown,
}

impl WheelchairBoarding {
    pub fn from_api(value: &str) -> Self {
        match value {
            "accessible" => Self::Accessible,
            "notAccessible" => Self::NotAccessible,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A boarding location returned by a stops-for-location query
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub id: StopIdentifier,
    /// Passenger-facing stop code, printed on signage
    pub code: Arc<str>,
    pub name: Arc<str>,
    pub location: Point,
    pub direction: StopDirection,
    pub location_type: StopLocationType,
    pub route_ids: Vec<RouteIdentifier>,
    pub wheelchair_boarding: WheelchairBoarding,
}

impl Stop {
    /// A plain boarding location with no route or accessibility data.
    pub fn new(id: impl Into<StopIdentifier>, name: impl AsRef<str>, location: Point) -> Self {
        let id = id.into();
        Self {
            code: id.as_str().into(),
            id,
            name: name.as_ref().into(),
            location,
            direction: StopDirection::Unknown,
            location_type: StopLocationType::Stop,
            route_ids: Vec::new(),
            wheelchair_boarding: WheelchairBoarding::Unknown,
        }
    }

    pub fn serves_route(&self, route_id: &RouteIdentifier) -> bool {
        self.route_ids.contains(route_id)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
