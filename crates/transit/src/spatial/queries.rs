//! Spatial query utilities for distance calculations.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::{HaversineDistance, Point};

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from Seattle to Portland is approximately 234 km
        let seattle = Point::new(-122.3321, 47.6062);
        let portland = Point::new(-122.6765, 45.5231);

        let dist = haversine_distance(seattle, portland);
        assert!((dist - 234_000.0).abs() < 10_000.0); // Within 10km
    }
}
