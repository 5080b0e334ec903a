use geo::{coord, Intersects, Rect};
use serde::{Serialize, Serializer};

/// Axis-aligned geographic box in `(west, south, east, north)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    /// Placeholder extent of a collection without items. It is the identity of [`Bbox::union`].
    pub const EMPTY: Bbox = Bbox {
        west: f64::INFINITY,
        south: f64::INFINITY,
        east: f64::NEG_INFINITY,
        north: f64::NEG_INFINITY,
    };

    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Reads a STAC `bbox` array. Three-dimensional boxes
    /// `[w, s, zmin, e, n, zmax]` are reduced to their horizontal part.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [west, south, east, north] => Some(Self::new(west, south, east, north)),
            [west, south, _, east, north, _] => Some(Self::new(west, south, east, north)),
            _ => None,
        }
    }

    /// True when the box covers nothing, e.g. [`Bbox::EMPTY`] or a box with NaN edges.
    pub fn is_empty(&self) -> bool {
        !(self.west <= self.east && self.south <= self.north)
    }

    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    pub fn contains(&self, other: &Bbox) -> bool {
        self.west <= other.west
            && self.south <= other.south
            && self.east >= other.east
            && self.north >= other.north
    }

    /// Direct interval-overlap test on both axes. Empty boxes never overlap.
    pub fn overlaps(&self, other: &Bbox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    fn to_rect(self) -> Option<Rect<f64>> {
        // Rect::new normalizes its corners, so empty boxes must be rejected first
        if self.is_empty() {
            return None;
        }

        Some(Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        ))
    }
}

impl Serialize for Bbox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // serde_json writes non-finite numbers as null
        self.to_array().serialize(serializer)
    }
}

impl From<[f64; 4]> for Bbox {
    fn from(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// Intersection of two boxes, or `None` when they share no point.
///
/// Boxes that only touch produce a zero-area box on the shared edge or corner.
pub fn bbox_intersection(bbox1: &Bbox, bbox2: &Bbox) -> Option<Bbox> {
    let rect1 = bbox1.to_rect()?;
    let rect2 = bbox2.to_rect()?;

    if !rect1.intersects(&rect2) {
        return None;
    }

    let (min1, max1) = (rect1.min(), rect1.max());
    let (min2, max2) = (rect2.min(), rect2.max());

    Some(Bbox::new(
        min1.x.max(min2.x),
        min1.y.max(min2.y),
        max1.x.min(max2.x),
        max1.y.min(max2.y),
    ))
}
