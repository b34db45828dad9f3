//! Footprint geometry engine for the astronomical visualization platform
//!
//! Given per-object pixel spans (contiguous x-runs per row) describing a
//! detected source region, this crate reconstructs the region's boundary
//! polygons, interior holes, peak markers and bounding rectangles via a
//! boundary-tracing algorithm over a rasterized local grid.  Everything is
//! synchronous pure computation; no pixels are ever rendered here.

pub mod connected;
pub mod footprint;
pub mod point;
pub mod segments;
pub mod shapes;
pub mod trace;

use thiserror::Error;

// Re-exports
pub use connected::{Cached, ConnectedObj, Containment, DrawKind};
pub use footprint::{FootData, FootprintData, ImageLineFootprint};
pub use point::{ImagePt, PixelSys};
pub use segments::{one_segments, zero_segments, Bbox, Segment, SegmentRows, Span};
pub use shapes::{PointObj, PolygonObj, RectObj};

/// Errors that can occur when building footprint geometry
#[derive(Error, Debug)]
pub enum FootprintError {
    #[error("invalid footprint data: {0}")]
    InvalidData(#[from] serde_json::Error),
}
