//! Coordinate regions sent with stops-for-location queries.

use geo::{coord, Point, Rect};

use super::queries::haversine_distance;

/// A centre point plus latitude/longitude spans, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateRegion {
    pub center: Point,
    pub lat_span: f64,
    pub lon_span: f64,
}

impl CoordinateRegion {
    pub fn new(center: Point, lat_span: f64, lon_span: f64) -> Self {
        Self {
            center,
            lat_span,
            lon_span,
        }
    }

    pub fn to_rect(&self) -> Rect {
        let half_lon = self.lon_span / 2.0;
        let half_lat = self.lat_span / 2.0;

        Rect::new(
            coord! { x: self.center.x() - half_lon, y: self.center.y() - half_lat },
            coord! { x: self.center.x() + half_lon, y: self.center.y() + half_lat },
        )
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: Point) -> bool {
        let rect = self.to_rect();
        (rect.min().x..=rect.max().x).contains(&point.x())
            && (rect.min().y..=rect.max().y).contains(&point.y())
    }

    /// Approximate (width, height) in meters, measured through the centre.
    pub fn dimensions_m(&self) -> (f64, f64) {
        let rect = self.to_rect();
        let (x, y) = (self.center.x(), self.center.y());

        let width = haversine_distance(Point::new(rect.min().x, y), Point::new(rect.max().x, y));
        let height = haversine_distance(Point::new(x, rect.min().y), Point::new(x, rect.max().y));

        (width, height)
    }
}

impl From<Rect> for CoordinateRegion {
    fn from(rect: Rect) -> Self {
        Self {
            center: rect.center().into(),
            lat_span: rect.height(),
            lon_span: rect.width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geohash::Geohash;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_conversion() {
        let rect = Rect::new(coord! { x: -122.4, y: 47.5 }, coord! { x: -122.2, y: 47.7 });
        let region = CoordinateRegion::from(rect);

        assert_relative_eq!(region.center.x(), -122.3, epsilon = 1e-9);
        assert_relative_eq!(region.center.y(), 47.6, epsilon = 1e-9);
        assert_relative_eq!(region.lat_span, 0.2, epsilon = 1e-9);
        assert_relative_eq!(region.to_rect().min().x, -122.4, epsilon = 1e-9);
        assert!(region.contains(Point::new(-122.4, 47.7)));
        assert!(!region.contains(Point::new(-122.5, 47.6)));
    }

    #[test]
    fn test_precision_six_cell_dimensions() {
        // Precision 6 cells are roughly 1.22km x 0.61km at the equator
        let cell = Geohash::encode(Point::new(0.001, 0.001), 6).unwrap();
        let (width, height) = cell.region().dimensions_m();

        assert!((width - 1_223.0).abs() < 25.0, "width was {width}");
        assert!((height - 611.0).abs() < 25.0, "height was {height}");
    }
}
