//! Derived draw primitives
//!
//! Plain geometry handed to the rendering layer: rectangles, polygons and
//! point markers, each tagged with the footprint id they came from.

use serde::{Deserialize, Serialize};

use crate::point::ImagePt;

/// An axis-aligned rectangle given by two opposite corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectObj {
    pub pt1: ImagePt,
    pub pt2: ImagePt,
    pub id: String,
}

/// A closed polygon.  Always carries at least 3 vertices; degenerate
/// traces are padded by repeating the first point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonObj {
    pub pts: Vec<ImagePt>,
    pub id: String,
}

/// A single point marker (a footprint peak).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointObj {
    pub pt: ImagePt,
    pub id: String,
}
