//! Boundary tracing
//!
//! Rasterizes a footprint's local bounding box into a 0/1 matrix (holes
//! count as 1, since they are still inside the boundary) and walks each
//! connected blob's outer contour with an 8-direction Moore-neighbor
//! search.  One footprint may contain several disjoint blobs; each yields
//! its own polygon, all tagged with the footprint id.

use crate::point::PixelSys;
use crate::segments::{Bbox, SegmentRows};
use crate::shapes::PolygonObj;

// directions: 0 E, 1 NE, 2 N, 3 NW, 4 W, 5 SW, 6 S, 7 SE
const LOC: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

// candidate next directions, keyed by the direction just arrived from,
// enumerated counterclockwise starting two steps back
const NEXT_DIRECTION: [&[usize]; 8] = [
    &[3, 4, 5, 6, 7, 0],
    &[3, 4, 5, 6, 7, 0, 1],
    &[5, 6, 7, 0, 1, 2],
    &[5, 6, 7, 0, 1, 2, 3],
    &[7, 0, 1, 2, 3, 4],
    &[7, 0, 1, 2, 3, 4, 5],
    &[1, 2, 3, 4, 5, 6],
    &[1, 2, 3, 4, 5, 6, 7],
];

const WEST: usize = 4;
const TRACED: u8 = 2;
const START: u8 = 3;

/// Trace the outer contour of every connected blob formed by the
/// foreground and hole segments.  Degenerate traces are padded to three
/// vertices.
pub fn trace_polygons(
    one: &SegmentRows,
    zero: &SegmentRows,
    bbox: Bbox,
    id: &str,
    sys: PixelSys,
) -> Vec<PolygonObj> {
    let (w, h) = (bbox.width(), bbox.height());
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut m = vec![vec![0u8; w]; h];
    for i in 0..h {
        let y = bbox.y1 + i as i64;
        for segs in [one.row(y), zero.row(y)] {
            for seg in segs {
                for x in seg.x1..=seg.x2 {
                    let xi = x - bbox.x1;
                    if (0..w as i64).contains(&xi) {
                        m[i][xi as usize] = 1;
                    }
                }
            }
        }
    }

    let mut polygons = Vec::new();
    for scan_y in 0..h {
        let mut in_line = false;
        for scan_x in 0..w {
            let cell = m[scan_y][scan_x];
            if cell == 1 && !in_line {
                let pts = collect_poly_pts(&mut m, w, h, scan_x, scan_y);
                let pts = pts
                    .into_iter()
                    .map(|(x, y)| sys.make_pt((x as i64 + bbox.x1) as f64, (y as i64 + bbox.y1) as f64))
                    .collect();
                polygons.push(PolygonObj {
                    pts,
                    id: id.to_string(),
                });
                in_line = true;
            } else if cell >= TRACED && !in_line {
                in_line = true;
            } else if cell == 0
                && in_line
                && !zero.contains(scan_x as i64 + bbox.x1, scan_y as i64 + bbox.y1)
            {
                in_line = false;
            }
        }
    }
    polygons
}

/// Walk one blob's boundary counterclockwise, marking visited cells,
/// until arriving back at the start cell.
fn collect_poly_pts(m: &mut [Vec<u8>], w: usize, h: usize, start_x: usize, start_y: usize) -> Vec<(usize, usize)> {
    let (mut crt_x, mut crt_y) = (start_x, start_y);
    let mut from_direction = WEST;

    m[start_y][start_x] = START;
    let mut pts = vec![(start_x, start_y)];

    loop {
        let mut found: Option<(usize, usize)> = None;
        for &next in NEXT_DIRECTION[from_direction] {
            let nx = crt_x as i64 + LOC[next].0;
            if nx < 0 || nx >= w as i64 {
                continue;
            }
            let ny = crt_y as i64 + LOC[next].1;
            if ny < 0 || ny >= h as i64 {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if m[ny][nx] == START {
                break; // back at the start: contour closed
            } else if m[ny][nx] >= 1 {
                m[ny][nx] = TRACED;
                found = Some((nx, ny));
                from_direction = (next + 4) % 8;
                break;
            }
        }
        match found {
            Some((nx, ny)) => {
                crt_x = nx;
                crt_y = ny;
                pts.push((nx, ny));
            }
            None => break,
        }
    }

    while pts.len() < 3 {
        pts.push(pts[0]);
    }
    pts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::{one_segments, zero_segments, Span};

    fn full_rows(bbox: Bbox) -> SegmentRows {
        let spans: Vec<Span> = (bbox.y1..=bbox.y2).map(|y| Span { y, x1: bbox.x1, x2: bbox.x2 }).collect();
        one_segments(&spans, bbox)
    }

    #[test]
    fn test_filled_rectangle_traces_one_closed_polygon() {
        let bbox = Bbox { x1: 2, y1: 3, x2: 6, y2: 6 };
        let one = full_rows(bbox);
        let zero = zero_segments(&one, bbox);
        let polys = trace_polygons(&one, &zero, bbox, "f1", PixelSys::Pixel);

        assert_eq!(polys.len(), 1);
        let pts = &polys[0].pts;
        assert!(pts.len() >= 3);
        // the contour stays on the bounding box boundary and covers it
        let xs: Vec<f64> = pts.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = pts.iter().map(|p| p.y).collect();
        assert_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 2.0);
        assert_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 6.0);
        assert_eq!(ys.iter().cloned().fold(f64::INFINITY, f64::min), 3.0);
        assert_eq!(ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 6.0);
        for p in pts {
            let on_x_edge = p.x == 2.0 || p.x == 6.0;
            let on_y_edge = p.y == 3.0 || p.y == 6.0;
            assert!(on_x_edge || on_y_edge, "vertex off the boundary: {p:?}");
        }
        // perimeter of a 5x4 box is 14 boundary pixels
        assert_eq!(pts.len(), 14);
    }

    #[test]
    fn test_disjoint_blobs_yield_multiple_polygons() {
        // ##.##
        let bbox = Bbox { x1: 0, y1: 0, x2: 4, y2: 0 };
        let one = one_segments(&[Span { y: 0, x1: 0, x2: 1 }, Span { y: 0, x1: 3, x2: 4 }], bbox);
        let zero = zero_segments(&one, bbox);
        let polys = trace_polygons(&one, &zero, bbox, "f2", PixelSys::Pixel);
        assert_eq!(polys.len(), 2);
        assert!(polys.iter().all(|p| p.id == "f2"));
    }

    #[test]
    fn test_single_pixel_pads_to_three_vertices() {
        let bbox = Bbox { x1: 0, y1: 0, x2: 0, y2: 0 };
        let one = one_segments(&[Span { y: 0, x1: 0, x2: 0 }], bbox);
        let zero = zero_segments(&one, bbox);
        let polys = trace_polygons(&one, &zero, bbox, "p", PixelSys::Pixel);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].pts.len(), 3);
        assert!(polys[0].pts.iter().all(|p| (p.x, p.y) == (0.0, 0.0)));
    }

    #[test]
    fn test_hole_pixels_are_part_of_the_blob() {
        // hollow 5x4 square: the hole is inside the contour, so a single
        // outer polygon comes back, not one per ring side
        let bbox = Bbox { x1: 0, y1: 0, x2: 4, y2: 3 };
        let spans: Vec<Span> = vec![
            Span { y: 0, x1: 0, x2: 4 },
            Span { y: 1, x1: 0, x2: 0 },
            Span { y: 1, x1: 4, x2: 4 },
            Span { y: 2, x1: 0, x2: 0 },
            Span { y: 2, x1: 4, x2: 4 },
            Span { y: 3, x1: 0, x2: 4 },
        ];
        let one = one_segments(&spans, bbox);
        let zero = zero_segments(&one, bbox);
        let polys = trace_polygons(&one, &zero, bbox, "ring", PixelSys::Pixel);
        assert_eq!(polys.len(), 1);
    }

    #[test]
    fn test_empty_input_traces_nothing() {
        let bbox = Bbox { x1: 0, y1: 0, x2: 3, y2: 3 };
        let one = one_segments(&[], bbox);
        let zero = zero_segments(&one, bbox);
        assert!(trace_polygons(&one, &zero, bbox, "e", PixelSys::Pixel).is_empty());
    }
}
