//! Geohash cells used to partition the map into cacheable regions.
//!
//! A geohash is a rectangular cell expressed as a base32 string; every extra
//! character subdivides the parent cell into 32 children. Approximate cell
//! dimensions by precision:
//!
//! ```text
//! Precision   Cell width      Cell height
//!         1   ≤ 5,000km   x   5,000km
//!         2   ≤ 1,250km   x   625km
//!         3   ≤ 156km     x   156km
//!         4   ≤ 39.1km    x   19.5km
//!         5   ≤ 4.89km    x   4.89km
//!         6   ≤ 1.22km    x   0.61km
//!         7   ≤ 153m      x   153m
//!         8   ≤ 38.2m     x   19.1m
//!         9   ≤ 4.77m     x   4.77m
//!        10   ≤ 1.19m     x   0.596m
//!        11   ≤ 149mm     x   149mm
//!        12   ≤ 37.2mm    x   18.6mm
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use geo::{coord, Point, Rect};

use crate::spatial::CoordinateRegion;

/// Geohash alphabet (decimal to base32 mapping, 0 => '0', 31 => 'z').
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest geohash supported, roughly 37mm x 19mm cells.
pub const MAX_PRECISION: usize = 12;

/// Upper bound on the number of cells [`Geohash::covering`] will produce.
pub const MAX_COVERING_CELLS: usize = 1024;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeohashError {
    #[error("geohash is empty")]
    Empty,

    #[error("geohash {0:?} is longer than 12 characters")]
    TooLong(String),

    #[error("invalid character {character:?} in geohash {hash:?}")]
    InvalidCharacter { hash: String, character: char },

    #[error("precision {0} is outside 1..=12")]
    InvalidPrecision(usize),

    #[error("coordinate (lon {lon}, lat {lat}) is out of range")]
    InvalidCoordinate { lon: f64, lat: f64 },

    #[error("covering would need {count} cells (limit {limit})")]
    TooManyCells { count: usize, limit: usize },
}

/// Cardinal directions for neighbour lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompassPoint {
    North,
    South,
    East,
    West,
}

/// An immutable geohash cell.
///
/// Equality, ordering and hashing only consider the hash string, so two
/// values decoded from the same string are interchangeable as map keys.
#[derive(Clone, Debug)]
pub struct Geohash {
    hash: Arc<str>,
    bounds: Rect,
}

impl Geohash {
    /// Decode an existing geohash string.
    pub fn new(hash: impl AsRef<str>) -> Result<Self, GeohashError> {
        let hash = hash.as_ref();
        let bounds = decode_bounds(hash)?;

        Ok(Self {
            hash: hash.into(),
            bounds,
        })
    }

    /// Encode a lon/lat point at the requested precision.
    pub fn encode(point: Point, precision: usize) -> Result<Self, GeohashError> {
        if !(1..=MAX_PRECISION).contains(&precision) {
            return Err(GeohashError::InvalidPrecision(precision));
        }

        let (lon, lat) = (point.x(), point.y());
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(GeohashError::InvalidCoordinate { lon, lat });
        }

        let mut lon_range = (-180.0, 180.0);
        let mut lat_range = (-90.0, 90.0);
        let mut hash = String::with_capacity(precision);
        let mut even = true;

        while hash.len() < precision {
            let mut index = 0;
            for _ in 0..5 {
                let (range, value) = if even {
                    (&mut lon_range, lon)
                } else {
                    (&mut lat_range, lat)
                };

                let mid = (range.0 + range.1) / 2.0;
                index <<= 1;
                if value >= mid {
                    index |= 1;
                    range.0 = mid;
                } else {
                    range.1 = mid;
                }

                even = !even;
            }
            hash.push(BASE32[index] as char);
        }

        Ok(Self {
            hash: hash.into(),
            bounds: Rect::new(
                coord! { x: lon_range.0, y: lat_range.0 },
                coord! { x: lon_range.1, y: lat_range.1 },
            ),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Number of characters in the hash.
    pub fn precision(&self) -> usize {
        self.hash.len()
    }

    /// Cell bounds; `min` is the south-west corner, `max` the north-east.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn center(&self) -> Point {
        self.bounds.center().into()
    }

    /// Latitude and longitude deltas (degrees) of the cell.
    pub fn size(&self) -> (f64, f64) {
        (self.bounds.height(), self.bounds.width())
    }

    /// The region to send with a stops-for-location query for this cell.
    pub fn region(&self) -> CoordinateRegion {
        CoordinateRegion::from(self.bounds)
    }

    /// The adjacent cell at the same precision.
    ///
    /// Longitude wraps at the antimeridian. Returns `None` past the poles.
    pub fn neighbor(&self, direction: CompassPoint) -> Option<Geohash> {
        let center = self.center();
        let (lat_delta, lon_delta) = self.size();

        let (mut lon, lat) = match direction {
            CompassPoint::North => (center.x(), center.y() + lat_delta),
            CompassPoint::South => (center.x(), center.y() - lat_delta),
            CompassPoint::East => (center.x() + lon_delta, center.y()),
            CompassPoint::West => (center.x() - lon_delta, center.y()),
        };

        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }

        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }

        Geohash::encode(Point::new(lon, lat), self.precision()).ok()
    }

    /// All eight surrounding cells, or `None` if the cell touches a pole.
    pub fn neighbors(&self) -> Option<Neighbors> {
        let north = self.neighbor(CompassPoint::North)?;
        let south = self.neighbor(CompassPoint::South)?;

        Some(Neighbors {
            origin: self.clone(),
            northeast: north.neighbor(CompassPoint::East)?,
            northwest: north.neighbor(CompassPoint::West)?,
            southeast: south.neighbor(CompassPoint::East)?,
            southwest: south.neighbor(CompassPoint::West)?,
            east: self.neighbor(CompassPoint::East)?,
            west: self.neighbor(CompassPoint::West)?,
            north,
            south,
        })
    }

    /// The 32 cells one precision level finer. Empty at [`MAX_PRECISION`].
    ///
    /// Used to split a cell whose stop query came back truncated.
    pub fn children(&self) -> Vec<Geohash> {
        if self.precision() >= MAX_PRECISION {
            return Vec::new();
        }

        BASE32
            .iter()
            .filter_map(|&c| {
                let mut hash = String::with_capacity(self.precision() + 1);
                hash.push_str(&self.hash);
                hash.push(c as char);
                Geohash::new(hash).ok()
            })
            .collect()
    }

    /// Cells at `precision` that together cover `rect` (typically the visible map).
    ///
    /// Viewports crossing the antimeridian must be split by the caller.
    pub fn covering(rect: Rect, precision: usize) -> Result<Vec<Geohash>, GeohashError> {
        let south_west = Geohash::encode(Point::new(rect.min().x, rect.min().y), precision)?;
        let (lat_delta, lon_delta) = south_west.size();

        let columns = ((rect.max().x - south_west.bounds.min().x) / lon_delta).ceil().max(1.0);
        let rows = ((rect.max().y - south_west.bounds.min().y) / lat_delta).ceil().max(1.0);
        let count = (columns * rows) as usize;
        if count > MAX_COVERING_CELLS {
            return Err(GeohashError::TooManyCells {
                count,
                limit: MAX_COVERING_CELLS,
            });
        }

        let start = south_west.center();
        let mut seen = HashSet::with_capacity(count);
        let mut cells = Vec::with_capacity(count);

        let mut lat = start.y();
        loop {
            let mut lon = start.x();
            loop {
                let cell = Geohash::encode(Point::new(lon, lat), precision)?;
                if seen.insert(cell.clone()) {
                    cells.push(cell);
                }

                lon += lon_delta;
                if lon - lon_delta / 2.0 >= rect.max().x || lon > 180.0 {
                    break;
                }
            }

            lat += lat_delta;
            if lat - lat_delta / 2.0 >= rect.max().y || lat > 90.0 {
                break;
            }
        }

        Ok(cells)
    }
}

fn decode_bounds(hash: &str) -> Result<Rect, GeohashError> {
    if hash.is_empty() {
        return Err(GeohashError::Empty);
    }
    if hash.len() > MAX_PRECISION {
        return Err(GeohashError::TooLong(hash.to_owned()));
    }

    let mut lon_range = (-180.0, 180.0);
    let mut lat_range = (-90.0, 90.0);
    let mut even = true;

    for character in hash.chars() {
        let bits = BASE32
            .iter()
            .position(|&c| c as char == character)
            .ok_or_else(|| GeohashError::InvalidCharacter {
                hash: hash.to_owned(),
                character,
            })?;

        for shift in (0..5).rev() {
            let range = if even { &mut lon_range } else { &mut lat_range };
            let mid = (range.0 + range.1) / 2.0;
            if (bits >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Ok(Rect::new(
        coord! { x: lon_range.0, y: lat_range.0 },
        coord! { x: lon_range.1, y: lat_range.1 },
    ))
}

impl PartialEq for Geohash {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.hash, &other.hash) || self.hash == other.hash
    }
}

impl Eq for Geohash {}

impl Hash for Geohash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for Geohash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Geohash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl fmt::Display for Geohash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl AsRef<str> for Geohash {
    fn as_ref(&self) -> &str {
        &self.hash
    }
}

impl FromStr for Geohash {
    type Err = GeohashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Geohash {
    type Error = GeohashError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for Geohash {
    type Error = GeohashError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

/// The eight cells surrounding an origin cell.
#[derive(Clone, Debug)]
pub struct Neighbors {
    pub origin: Geohash,
    pub north: Geohash,
    pub northeast: Geohash,
    pub east: Geohash,
    pub southeast: Geohash,
    pub south: Geohash,
    pub southwest: Geohash,
    pub west: Geohash,
    pub northwest: Geohash,
}

impl Neighbors {
    /// Clockwise, starting with north.
    pub fn all(&self) -> [&Geohash; 8] {
        [
            &self.north,
            &self.northeast,
            &self.east,
            &self.southeast,
            &self.south,
            &self.southwest,
            &self.west,
            &self.northwest,
        ]
    }
}
