//! Footprint input data
//!
//! The upstream region service delivers one JSON document per overlay:
//! a `feet` map of footprint id → corners/spans/peaks, plus the pixel
//! coordinate convention every derived point must be constructed in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::connected::ConnectedObj;
use crate::point::PixelSys;
use crate::segments::Span;
use crate::shapes::{PointObj, PolygonObj, RectObj};
use crate::FootprintError;

/// Raw data of a single footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootData {
    /// Bounding box corners.
    pub corners: [[f64; 2]; 4],
    /// Foreground pixel runs, `[y, x_min, x_max]` per row.
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Peak positions.
    #[serde(default)]
    pub peaks: Vec<[f64; 2]>,
}

/// The upstream footprint document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FootprintData {
    #[serde(default)]
    pub feet: IndexMap<String, FootData>,
    #[serde(default)]
    pub pixelsys: String,
}

/// All connected regions of one footprint overlay.
#[derive(Debug, Clone, Default)]
pub struct ImageLineFootprint {
    pub pixel_sys: PixelSys,
    pub total_feet: usize,
    pub connected_objs: Vec<ConnectedObj>,
}

impl ImageLineFootprint {
    /// Build one [`ConnectedObj`] per footprint id.  Feet without spans
    /// become valid empty footprints.
    pub fn new(data: &FootprintData) -> Self {
        let pixel_sys = PixelSys::parse(&data.pixelsys);
        let connected_objs = data
            .feet
            .iter()
            .map(|(id, foot)| {
                ConnectedObj::new(&foot.corners, foot.spans.clone(), foot.peaks.clone(), id, pixel_sys)
            })
            .collect();
        ImageLineFootprint {
            pixel_sys,
            total_feet: data.feet.len(),
            connected_objs,
        }
    }

    /// Parse the upstream JSON document and build the footprint set.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, FootprintError> {
        let data: FootprintData = serde_json::from_value(value.clone())?;
        Ok(Self::new(&data))
    }

    /// Boundary polygons of every footprint, in input order.
    pub fn polygon_objs(&mut self) -> Vec<PolygonObj> {
        self.connected_objs
            .iter_mut()
            .flat_map(|c| c.polygon_objs().to_vec())
            .collect()
    }

    /// Covered or hole rectangles of every footprint.
    pub fn rect_objs(&mut self, covered: bool) -> Vec<RectObj> {
        self.connected_objs
            .iter_mut()
            .flat_map(|c| c.rect_objs(covered).to_vec())
            .collect()
    }

    /// Peak markers of every footprint.
    pub fn point_objs(&mut self) -> Vec<PointObj> {
        self.connected_objs
            .iter_mut()
            .flat_map(|c| c.point_objs_on_peaks().to_vec())
            .collect()
    }

    /// The footprint whose bounding box contains the point, nearest
    /// bounding-box center first.  Inherits the bounding-box
    /// approximation of [`ConnectedObj::contain_point`].
    pub fn find_footprint(&self, x: f64, y: f64) -> Option<&ConnectedObj> {
        self.connected_objs
            .iter()
            .filter_map(|c| c.contain_point(x, y).dist.map(|d| (c, d)))
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
            .map(|(c, _)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "pixelsys": "zerobased",
            "feet": {
                "123": {
                    "corners": [[0, 0], [2, 0], [2, 1], [0, 1]],
                    "spans": [[0, 0, 2], [1, 0, 2]],
                    "peaks": [[1, 0]]
                },
                "124": {
                    "corners": [[10, 10], [11, 10], [11, 11], [10, 11]],
                    "spans": [[10, 10, 11], [11, 10, 11]]
                }
            }
        })
    }

    #[test]
    fn test_from_json() {
        let fp = ImageLineFootprint::from_json(&sample_json()).unwrap();
        assert_eq!(fp.pixel_sys, PixelSys::ZeroBased);
        assert_eq!(fp.total_feet, 2);
        assert_eq!(fp.connected_objs.len(), 2);
        assert_eq!(fp.connected_objs[0].id, "123");
    }

    #[test]
    fn test_derived_points_use_declared_pixel_system() {
        let mut fp = ImageLineFootprint::from_json(&sample_json()).unwrap();
        let polys = fp.polygon_objs();
        assert_eq!(polys.len(), 2);
        assert!(polys.iter().all(|p| p.pts.iter().all(|pt| pt.sys == PixelSys::ZeroBased)));
        let points = fp.point_objs();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "123");
    }

    #[test]
    fn test_missing_fields_default() {
        let fp = ImageLineFootprint::from_json(&json!({})).unwrap();
        assert_eq!(fp.total_feet, 0);
        assert_eq!(fp.pixel_sys, PixelSys::Pixel);
    }

    #[test]
    fn test_malformed_data_is_an_error() {
        let bad = json!({"feet": {"1": {"corners": [[0, 0]]}}});
        assert!(matches!(
            ImageLineFootprint::from_json(&bad),
            Err(FootprintError::InvalidData(_))
        ));
    }

    #[test]
    fn test_find_footprint_nearest_center() {
        let fp = ImageLineFootprint::from_json(&sample_json()).unwrap();
        let hit = fp.find_footprint(1.0, 0.5);
        assert_eq!(hit.map(|c| c.id.as_str()), Some("123"));
        assert!(fp.find_footprint(100.0, 100.0).is_none());
    }
}
