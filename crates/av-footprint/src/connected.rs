//! Connected footprint regions
//!
//! One [`ConnectedObj`] per footprint id: bounding box, center, lazily
//! derived foreground/hole segments and memoized draw primitives.  Each
//! derived-primitive kind is an explicit Uncomputed → Computed cell with
//! an `invalidate` operation; nothing recomputes behind the caller's back.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::point::PixelSys;
use crate::segments::{
    one_segments as make_one_segments, zero_segments as make_zero_segments, Bbox, Segment,
    SegmentRows, Span,
};
use crate::shapes::{PointObj, PolygonObj, RectObj};
use crate::trace::trace_polygons;

/// The four derived-primitive families a footprint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    OneRects,
    ZeroRects,
    Polygons,
    Points,
}

/// A lazily computed derived value: `Uncomputed` until first use, then
/// `Computed` until explicitly invalidated.
#[derive(Debug, Clone, Default)]
pub struct Cached<T>(Option<T>);

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn get_or_compute(&mut self, f: impl FnOnce() -> T) -> &T {
        self.0.get_or_insert_with(f)
    }

    pub fn is_computed(&self) -> bool {
        self.0.is_some()
    }

    pub fn invalidate(&mut self) {
        self.0 = None;
    }
}

/// Result of a bounding-box hit test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Containment {
    pub inside: bool,
    /// Distance to the bounding box center, when inside.
    pub dist: Option<f64>,
}

/// One connected footprint region.
#[derive(Debug, Clone, Default)]
pub struct ConnectedObj {
    pub id: String,
    pub bbox: Bbox,
    pub center_pt: (f64, f64),
    pub pixel_sys: PixelSys,
    spans: Vec<Span>,
    peaks: Vec<[f64; 2]>,
    one_segments: Cached<SegmentRows>,
    zero_segments: Cached<SegmentRows>,
    one_rects: Cached<Vec<RectObj>>,
    zero_rects: Cached<Vec<RectObj>>,
    polygons: Cached<Vec<PolygonObj>>,
    points: Cached<Vec<PointObj>>,
}

impl ConnectedObj {
    /// Build from the upstream corner/span/peak data.  A footprint with
    /// zero spans is a valid, empty footprint.
    pub fn new(corners: &[[f64; 2]; 4], spans: Vec<Span>, peaks: Vec<[f64; 2]>, id: &str, pixel_sys: PixelSys) -> Self {
        Self::with_bounds(Bbox::from_corners(corners), spans, peaks, id, pixel_sys)
    }

    fn with_bounds(bbox: Bbox, spans: Vec<Span>, peaks: Vec<[f64; 2]>, id: &str, pixel_sys: PixelSys) -> Self {
        ConnectedObj {
            id: id.to_string(),
            bbox,
            center_pt: bbox.center(),
            pixel_sys,
            spans,
            peaks,
            ..Default::default()
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn peaks(&self) -> &[[f64; 2]] {
        &self.peaks
    }

    /// Foreground runs per row, computed on first use.
    pub fn one_segments(&mut self) -> &SegmentRows {
        let Self { spans, bbox, one_segments, .. } = self;
        one_segments.get_or_compute(|| make_one_segments(spans, *bbox))
    }

    /// Interior holes per row, computed on first use.
    pub fn zero_segments(&mut self) -> &SegmentRows {
        let Self { spans, bbox, one_segments, zero_segments, .. } = self;
        let one = one_segments.get_or_compute(|| make_one_segments(spans, *bbox));
        zero_segments.get_or_compute(|| make_zero_segments(one, *bbox))
    }

    /// One rectangle per run per row, for either the covered (foreground)
    /// or hole segments, each inflated by half a pixel on every edge so
    /// adjacent rectangles tile without gaps.
    pub fn rect_objs(&mut self, covered: bool) -> &[RectObj] {
        if covered {
            self.one_segments();
        } else {
            self.zero_segments();
        }
        let Self { id, pixel_sys, one_segments, zero_segments, one_rects, zero_rects, .. } = self;
        let (source, cache) = if covered {
            (&*one_segments, one_rects)
        } else {
            (&*zero_segments, zero_rects)
        };
        cache.get_or_compute(|| {
            source
                .get()
                .map(|segs| make_rects(segs, id, *pixel_sys))
                .unwrap_or_default()
        })
    }

    /// Boundary polygons of every connected blob in this footprint.
    pub fn polygon_objs(&mut self) -> &[PolygonObj] {
        self.zero_segments();
        let Self { id, bbox, pixel_sys, one_segments, zero_segments, polygons, .. } = self;
        polygons.get_or_compute(|| match (one_segments.get(), zero_segments.get()) {
            (Some(one), Some(zero)) => trace_polygons(one, zero, *bbox, id, *pixel_sys),
            _ => Vec::new(),
        })
    }

    /// One point marker per peak.
    pub fn point_objs_on_peaks(&mut self) -> &[PointObj] {
        let Self { id, peaks, pixel_sys, points, .. } = self;
        points.get_or_compute(|| {
            peaks
                .iter()
                .map(|p| PointObj {
                    pt: pixel_sys.make_pt(p[0], p[1]),
                    id: id.clone(),
                })
                .collect()
        })
    }

    /// Drop one memoized primitive family; it will be recomputed on the
    /// next request.
    pub fn invalidate(&mut self, kind: DrawKind) {
        match kind {
            DrawKind::OneRects => self.one_rects.invalidate(),
            DrawKind::ZeroRects => self.zero_rects.invalidate(),
            DrawKind::Polygons => self.polygons.invalidate(),
            DrawKind::Points => self.points.invalidate(),
        }
    }

    pub fn is_computed(&self, kind: DrawKind) -> bool {
        match kind {
            DrawKind::OneRects => self.one_rects.is_computed(),
            DrawKind::ZeroRects => self.zero_rects.is_computed(),
            DrawKind::Polygons => self.polygons.is_computed(),
            DrawKind::Points => self.points.is_computed(),
        }
    }

    /// Drop everything derived, segments included.
    pub fn reset(&mut self) {
        self.one_segments.invalidate();
        self.zero_segments.invalidate();
        self.one_rects.invalidate();
        self.zero_rects.invalidate();
        self.polygons.invalidate();
        self.points.invalidate();
    }

    /// Bounding-box hit test.  `dist` is the Euclidean distance to the
    /// bounding box center, not to the actual boundary; nearest-footprint
    /// picking with strongly non-convex shapes inherits that
    /// approximation.
    pub fn contain_point(&self, x: f64, y: f64) -> Containment {
        let Bbox { x1, y1, x2, y2 } = self.bbox;
        let inside =
            x >= x1 as f64 && x <= x2 as f64 && y >= y1 as f64 && y <= y2 as f64;
        let dist = inside.then(|| {
            let (cx, cy) = self.center_pt;
            ((cx - x).powi(2) + (cy - y).powi(2)).sqrt()
        });
        Containment { inside, dist }
    }

    /// Split at fully-empty interior rows into independent sub-footprints,
    /// one per maximal run of non-empty rows, each re-bounded tight and
    /// re-centered.  Avoids tracing artifacts across vertically disjoint
    /// regions sharing one id.  The re-bounded remainder comes first.
    pub fn split_on_empty_line(mut self) -> Vec<ConnectedObj> {
        let bbox = self.bbox;
        let one = self.one_segments().clone();

        let mut rest_spans = std::mem::take(&mut self.spans);
        let mut rest_peaks = std::mem::take(&mut self.peaks);
        let mut pieces: Vec<ConnectedObj> = Vec::new();
        let mut first_y = bbox.y1;

        for y in (bbox.y1 + 1)..bbox.y2 {
            if !one.row(y).is_empty() {
                continue;
            }
            if y > first_y {
                let (taken, kept): (Vec<Span>, Vec<Span>) =
                    rest_spans.iter().copied().partition(|s| s.y >= first_y && s.y < y);
                if !taken.is_empty() {
                    let (peaks_in, peaks_out): (Vec<[f64; 2]>, Vec<[f64; 2]>) = rest_peaks
                        .iter()
                        .copied()
                        .partition(|p| p[1] >= first_y as f64 && p[1] < y as f64);
                    pieces.push(Self::with_bounds(
                        tight_bbox(&taken),
                        taken,
                        peaks_in,
                        &self.id,
                        self.pixel_sys,
                    ));
                    rest_spans = kept;
                    rest_peaks = peaks_out;
                }
            }
            first_y = y + 1;
        }

        if pieces.is_empty() {
            self.spans = rest_spans;
            self.peaks = rest_peaks;
            return vec![self];
        }
        debug!(id = %self.id, pieces = pieces.len() + 1, "footprint split on empty rows");

        let mut result = Vec::with_capacity(pieces.len() + 1);
        if !rest_spans.is_empty() {
            result.push(Self::with_bounds(
                tight_bbox(&rest_spans),
                rest_spans,
                rest_peaks,
                &self.id,
                self.pixel_sys,
            ));
        }
        result.extend(pieces);
        result
    }
}

fn make_rects(segs: &SegmentRows, id: &str, sys: PixelSys) -> Vec<RectObj> {
    let mut rects = Vec::with_capacity(segs.segment_count());
    for (idx, row) in segs.rows.iter().enumerate() {
        let y = segs.y1 + idx as i64;
        for Segment { x1, x2 } in row {
            rects.push(RectObj {
                pt1: sys.make_pt(*x1 as f64 - 0.5, y as f64 - 0.5),
                pt2: sys.make_pt(*x2 as f64 + 0.5, y as f64 + 0.5),
                id: id.to_string(),
            });
        }
    }
    rects
}

fn tight_bbox(spans: &[Span]) -> Bbox {
    let mut it = spans.iter();
    let Some(first) = it.next() else {
        return Bbox::default();
    };
    let mut bbox = Bbox {
        x1: first.x1,
        y1: first.y,
        x2: first.x2,
        y2: first.y,
    };
    for s in it {
        bbox.x1 = bbox.x1.min(s.x1);
        bbox.x2 = bbox.x2.max(s.x2);
        bbox.y1 = bbox.y1.min(s.y);
        bbox.y2 = bbox.y2.max(s.y);
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_corners() -> [[f64; 2]; 4] {
        [[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0]]
    }

    fn ring() -> ConnectedObj {
        let spans: Vec<Span> = [
            [0, 0, 4],
            [1, 0, 0],
            [1, 4, 4],
            [2, 0, 0],
            [2, 4, 4],
            [3, 0, 4],
        ]
        .into_iter()
        .map(Span::from)
        .collect();
        ConnectedObj::new(&square_corners(), spans, vec![[2.0, 1.5]], "r1", PixelSys::Pixel)
    }

    #[test]
    fn test_bbox_and_center_from_corners() {
        let obj = ring();
        assert_eq!(obj.bbox, Bbox { x1: 0, y1: 0, x2: 4, y2: 3 });
        assert_eq!(obj.center_pt, (2.0, 1.5));
    }

    #[test]
    fn test_rects_inflated_half_pixel() {
        let mut obj = ring();
        let rects = obj.rect_objs(true).to_vec();
        assert_eq!(rects.len(), 6);
        let top = &rects[0];
        assert_eq!((top.pt1.x, top.pt1.y), (-0.5, -0.5));
        assert_eq!((top.pt2.x, top.pt2.y), (4.5, 0.5));

        let holes = obj.rect_objs(false);
        assert_eq!(holes.len(), 2); // one per interior row
        assert_eq!((holes[0].pt1.x, holes[0].pt2.x), (0.5, 3.5));
    }

    #[test]
    fn test_peak_markers_carry_id() {
        let mut obj = ring();
        let points = obj.point_objs_on_peaks();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "r1");
        assert_eq!((points[0].pt.x, points[0].pt.y), (2.0, 1.5));
    }

    #[test]
    fn test_cache_state_machine() {
        let mut obj = ring();
        assert!(!obj.is_computed(DrawKind::Polygons));
        obj.polygon_objs();
        assert!(obj.is_computed(DrawKind::Polygons));
        obj.invalidate(DrawKind::Polygons);
        assert!(!obj.is_computed(DrawKind::Polygons));
        assert_eq!(obj.polygon_objs().len(), 1); // recomputed on demand
    }

    #[test]
    fn test_empty_footprint_is_valid() {
        let mut obj = ConnectedObj::new(&square_corners(), Vec::new(), Vec::new(), "e", PixelSys::Pixel);
        assert!(obj.polygon_objs().is_empty());
        assert!(obj.rect_objs(true).is_empty());
        assert!(obj.rect_objs(false).is_empty());
        assert!(obj.point_objs_on_peaks().is_empty());
    }

    #[test]
    fn test_contain_point_is_bbox_distance() {
        let obj = ring();
        let hit = obj.contain_point(1.0, 1.5);
        assert!(hit.inside);
        assert_eq!(hit.dist, Some(1.0)); // distance to bbox center (2, 1.5)
        let miss = obj.contain_point(9.0, 9.0);
        assert!(!miss.inside);
        assert_eq!(miss.dist, None);
    }

    #[test]
    fn test_split_on_empty_line() {
        // two 1-row blobs separated by two empty rows
        let corners = [[0.0, 0.0], [5.0, 0.0], [5.0, 3.0], [0.0, 3.0]];
        let spans = vec![
            Span { y: 0, x1: 0, x2: 2 },
            Span { y: 3, x1: 3, x2: 5 },
        ];
        let peaks = vec![[1.0, 0.0], [4.0, 3.0]];
        let obj = ConnectedObj::new(&corners, spans, peaks, "s", PixelSys::Pixel);
        let parts = obj.split_on_empty_line();

        assert_eq!(parts.len(), 2);
        // remainder (the last run) first, split-off pieces after
        assert_eq!(parts[0].bbox, Bbox { x1: 3, y1: 3, x2: 5, y2: 3 });
        assert_eq!(parts[1].bbox, Bbox { x1: 0, y1: 0, x2: 2, y2: 0 });
        assert_eq!(parts[0].center_pt, (4.0, 3.0));
        assert_eq!(parts[0].peaks(), [[4.0, 3.0]]);
        assert_eq!(parts[1].peaks(), [[1.0, 0.0]]);
    }

    #[test]
    fn test_split_without_empty_rows_is_identity() {
        let obj = ring();
        let parts = obj.split_on_empty_line();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].bbox, Bbox { x1: 0, y1: 0, x2: 4, y2: 3 });
        assert_eq!(parts[0].spans().len(), 6);
    }
}
