//! Foreground and hole segments
//!
//! A footprint arrives as spans: contiguous foreground x-runs per row.
//! `one_segments` lays them out per row of the bounding box;
//! `zero_segments` derives the interior holes.  A gap only counts as a
//! hole when it is fully enclosed by foreground; any gap touching the
//! bounding box edge, or connected to the outside through neighboring
//! rows, is pruned by a bidirectional row sweep.

use serde::{Deserialize, Serialize};

/// One contiguous horizontal run of foreground pixels at a given row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 3]", into = "[i64; 3]")]
pub struct Span {
    pub y: i64,
    pub x1: i64,
    pub x2: i64,
}

impl From<[i64; 3]> for Span {
    fn from([y, x1, x2]: [i64; 3]) -> Self {
        Span { y, x1, x2 }
    }
}

impl From<Span> for [i64; 3] {
    fn from(s: Span) -> Self {
        [s.y, s.x1, s.x2]
    }
}

/// Inclusive pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bbox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Bbox {
    /// Bounding box of the first and third corner, in either winding.
    pub fn from_corners(corners: &[[f64; 2]; 4]) -> Bbox {
        let (c0, c2) = (corners[0], corners[2]);
        Bbox {
            x1: c0[0].min(c2[0]) as i64,
            y1: c0[1].min(c2[1]) as i64,
            x2: c0[0].max(c2[0]) as i64,
            y2: c0[1].max(c2[1]) as i64,
        }
    }

    pub fn corners(&self) -> [[f64; 2]; 4] {
        let (x1, y1, x2, y2) = (self.x1 as f64, self.y1 as f64, self.x2 as f64, self.y2 as f64);
        [[x1, y1], [x2, y1], [x2, y2], [x1, y2]]
    }

    pub fn width(&self) -> usize {
        (self.x2 - self.x1 + 1).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (self.y2 - self.y1 + 1).max(0) as usize
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }
}

/// An inclusive x-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: i64,
    pub x2: i64,
}

impl Segment {
    fn overlaps(&self, other: &Segment) -> bool {
        self.x2 >= other.x1 && self.x1 <= other.x2
    }
}

/// Per-row segment lists covering the rows `y1..=y2` of a bounding box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentRows {
    pub y1: i64,
    pub rows: Vec<Vec<Segment>>,
}

impl SegmentRows {
    fn empty(bbox: Bbox) -> Self {
        SegmentRows {
            y1: bbox.y1,
            rows: vec![Vec::new(); bbox.height()],
        }
    }

    /// Segments of the given absolute row; empty outside the box.
    pub fn row(&self, y: i64) -> &[Segment] {
        let idx = y - self.y1;
        if idx < 0 {
            return &[];
        }
        self.rows.get(idx as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when `(x, y)` falls inside one of the segments.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.row(y).iter().any(|s| x >= s.x1 && x <= s.x2)
    }

    /// Total number of segments across all rows.
    pub fn segment_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Lay the foreground spans out per row, ordered by x within each row.
pub fn one_segments(spans: &[Span], bbox: Bbox) -> SegmentRows {
    let mut one = SegmentRows::empty(bbox);
    for span in spans {
        let idx = span.y - bbox.y1;
        if idx < 0 {
            continue;
        }
        if let Some(row) = one.rows.get_mut(idx as usize) {
            row.push(Segment {
                x1: span.x1,
                x2: span.x2,
            });
        }
    }
    for row in one.rows.iter_mut() {
        row.sort_by_key(|s| s.x1);
    }
    one
}

#[derive(Debug, Clone, Copy)]
struct ZeroCandidate {
    seg: Segment,
    removed: bool,
}

/// Derive the interior holes from the foreground segments.
///
/// Candidates are the gaps before the first run, between runs and after
/// the last run of each covered row.  A candidate is tainted (and
/// discarded) when it touches the bounding box edge, when it lies on the
/// top/bottom border row, or when it x-overlaps a tainted candidate or a
/// fully-empty row among its vertical neighbors.  Taint propagates
/// transitively through a top-down then bottom-up sweep; a single pass
/// under-prunes holes that reach the border only through a chain of rows.
pub fn zero_segments(one: &SegmentRows, bbox: Bbox) -> SegmentRows {
    let height = bbox.height();
    let mut cands: Vec<Vec<ZeroCandidate>> = vec![Vec::new(); height];

    for (idx, row) in one.rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let y = bbox.y1 + idx as i64;
        let on_border_row = y == bbox.y1 || y == bbox.y2;
        let out = &mut cands[idx];

        let first = row[0];
        if bbox.x1 < first.x1 {
            out.push(ZeroCandidate {
                seg: Segment { x1: bbox.x1, x2: first.x1 - 1 },
                removed: true, // touches the left edge
            });
        }
        for pair in row.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.x2 < b.x1 - 1 {
                out.push(ZeroCandidate {
                    seg: Segment { x1: a.x2 + 1, x2: b.x1 - 1 },
                    removed: on_border_row,
                });
            }
        }
        let last = row[row.len() - 1];
        if bbox.x2 > last.x2 {
            out.push(ZeroCandidate {
                seg: Segment { x1: last.x2 + 1, x2: bbox.x2 },
                removed: true, // touches the right edge
            });
        }
    }

    // propagate taint from a neighboring row onto one candidate
    let check_from_other_row = |cands: &mut Vec<Vec<ZeroCandidate>>, idx: usize, check_idx: usize| {
        let other_empty = one.rows.get(check_idx).map_or(true, |r| r.is_empty());
        let other: Vec<ZeroCandidate> = cands[check_idx].clone();
        let mut tainted: Vec<usize> = Vec::new();
        for (n, cand) in cands[idx].iter().enumerate() {
            if cand.removed {
                continue;
            }
            if other_empty {
                tainted.push(n);
                continue;
            }
            for oc in &other {
                if !oc.removed {
                    continue;
                }
                if cand.seg.x2 < oc.seg.x1 {
                    break;
                }
                if cand.seg.overlaps(&oc.seg) {
                    tainted.push(n);
                    break;
                }
            }
        }
        for n in tainted {
            cands[idx][n].removed = true;
        }
    };

    let check_row = |cands: &mut Vec<Vec<ZeroCandidate>>, idx: usize| {
        if idx > 0 {
            check_from_other_row(cands, idx, idx - 1);
        }
        if idx + 1 < height {
            check_from_other_row(cands, idx, idx + 1);
        }
    };

    for idx in 0..height {
        check_row(&mut cands, idx);
    }
    for idx in (0..height).rev() {
        check_row(&mut cands, idx);
    }

    SegmentRows {
        y1: bbox.y1,
        rows: cands
            .into_iter()
            .map(|row| row.into_iter().filter(|c| !c.removed).map(|c| c.seg).collect())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(raw: &[[i64; 3]]) -> Vec<Span> {
        raw.iter().copied().map(Span::from).collect()
    }

    fn bbox(x1: i64, y1: i64, x2: i64, y2: i64) -> Bbox {
        Bbox { x1, y1, x2, y2 }
    }

    #[test]
    fn test_one_segments_orders_runs() {
        let one = one_segments(
            &spans(&[[0, 4, 6], [0, 0, 2], [1, 0, 6]]),
            bbox(0, 0, 6, 1),
        );
        assert_eq!(one.row(0), [Segment { x1: 0, x2: 2 }, Segment { x1: 4, x2: 6 }]);
        assert_eq!(one.row(1).len(), 1);
        assert!(one.contains(5, 0));
        assert!(!one.contains(3, 0));
    }

    #[test]
    fn test_hollow_square_keeps_interior_holes() {
        // #####
        // #...#
        // #...#
        // #####
        let one = one_segments(
            &spans(&[
                [0, 0, 4],
                [1, 0, 0],
                [1, 4, 4],
                [2, 0, 0],
                [2, 4, 4],
                [3, 0, 4],
            ]),
            bbox(0, 0, 4, 3),
        );
        let zero = zero_segments(&one, bbox(0, 0, 4, 3));
        assert!(zero.row(0).is_empty());
        assert_eq!(zero.row(1), [Segment { x1: 1, x2: 3 }]);
        assert_eq!(zero.row(2), [Segment { x1: 1, x2: 3 }]);
        assert!(zero.row(3).is_empty());
    }

    #[test]
    fn test_border_row_gap_is_pruned() {
        // #.###
        // #####
        let one = one_segments(
            &spans(&[[0, 0, 0], [0, 2, 4], [1, 0, 4]]),
            bbox(0, 0, 4, 1),
        );
        let zero = zero_segments(&one, bbox(0, 0, 4, 1));
        assert_eq!(zero.segment_count(), 0);
    }

    #[test]
    fn test_edge_touching_gap_is_pruned() {
        // ..###
        // #####
        // ###..
        let one = one_segments(
            &spans(&[[0, 2, 4], [1, 0, 4], [2, 0, 2]]),
            bbox(0, 0, 4, 2),
        );
        let zero = zero_segments(&one, bbox(0, 0, 4, 2));
        assert_eq!(zero.segment_count(), 0);
    }

    #[test]
    fn test_taint_needs_bottom_up_pass() {
        // a tube open at the bottom: the y1 gap only reaches the border
        // through y2 and y3, which the top-down pass taints after y1 was
        // already visited
        // ####
        // #..#
        // #..#
        // #..#   <- bottom border row, gap tainted there
        let bx = bbox(0, 0, 3, 3);
        let one = one_segments(
            &spans(&[
                [0, 0, 3],
                [1, 0, 0],
                [1, 3, 3],
                [2, 0, 0],
                [2, 3, 3],
                [3, 0, 0],
                [3, 3, 3],
            ]),
            bx,
        );
        let zero = zero_segments(&one, bx);
        assert_eq!(zero.segment_count(), 0);
    }

    #[test]
    fn test_gap_next_to_empty_row_is_pruned() {
        // #.#
        // ...
        // ###
        let bx = bbox(0, 0, 2, 2);
        let one = one_segments(&spans(&[[0, 0, 0], [0, 2, 2], [2, 0, 2]]), bx);
        let zero = zero_segments(&one, bx);
        assert_eq!(zero.segment_count(), 0);
    }

    #[test]
    fn test_no_spans_yields_no_segments() {
        let bx = bbox(0, 0, 3, 3);
        let one = one_segments(&[], bx);
        assert_eq!(one.segment_count(), 0);
        assert_eq!(zero_segments(&one, bx).segment_count(), 0);
    }
}
