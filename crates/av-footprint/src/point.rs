//! Pixel coordinate systems and image points
//!
//! Upstream footprint data declares which pixel convention its coordinates
//! use; the same construction function is applied uniformly to every point
//! this crate derives.  Converting between conventions is projection math
//! and lives outside this crate.

use serde::{Deserialize, Serialize};

/// Pixel coordinate convention of a footprint data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelSys {
    #[default]
    Pixel,
    ZeroBased,
    FitsPixel,
}

impl PixelSys {
    /// Parse the `pixelsys` string of the upstream data.  Unknown values
    /// fall back to [`PixelSys::Pixel`].
    pub fn parse(s: &str) -> PixelSys {
        match s.to_ascii_lowercase().as_str() {
            "zerobased" => PixelSys::ZeroBased,
            "fitspixel" => PixelSys::FitsPixel,
            _ => PixelSys::Pixel,
        }
    }

    /// Construct a point tagged with this coordinate system.
    pub fn make_pt(&self, x: f64, y: f64) -> ImagePt {
        ImagePt { x, y, sys: *self }
    }
}

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePt {
    pub x: f64,
    pub y: f64,
    pub sys: PixelSys,
}
