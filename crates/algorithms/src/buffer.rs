//! Buffer operations
//!
//! Positive buffers around points, lines and polygons. Points become
//! circles approximated with a configurable segment count; lines and
//! polygon rings are covered by vertex circles plus edge quads, unioned
//! with the source geometry. Negative (shrinking) buffers are not
//! supported; the exclusion pipeline only ever grows geometry.

use crate::union::union_all;
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use std::f64::consts::PI;

/// Parameters for buffer operations
#[derive(Debug, Clone, Copy)]
pub struct BufferParams {
    /// Buffer distance in map units (must be >= 0)
    pub distance: f64,
    /// Number of segments to approximate circles (default: 16)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 16,
        }
    }
}

/// Circular buffer polygon around a point
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    circle(point.x(), point.y(), params.distance.abs(), params.segments)
}

/// Buffer a line string: vertex circles plus a quad per segment
pub fn buffer_line_string(line: &LineString<f64>, params: &BufferParams) -> MultiPolygon<f64> {
    union_all(ring_cover(&line.0, params))
}

/// Buffer a polygon outward by covering all its rings and unioning
/// with the original footprint
pub fn buffer_polygon(polygon: &Polygon<f64>, params: &BufferParams) -> MultiPolygon<f64> {
    let mut parts = vec![MultiPolygon(vec![polygon.clone()])];
    parts.extend(ring_cover(&polygon.exterior().0, params));
    for interior in polygon.interiors() {
        parts.extend(ring_cover(&interior.0, params));
    }
    union_all(parts)
}

/// Buffer any supported geometry; unsupported kinds yield an empty
/// result
pub fn buffer_geometry(geometry: &Geometry<f64>, params: &BufferParams) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Point(p) => MultiPolygon(vec![buffer_point(p, params)]),
        Geometry::Line(l) => {
            buffer_line_string(&LineString::from(vec![l.start, l.end]), params)
        }
        Geometry::LineString(ls) => buffer_line_string(ls, params),
        Geometry::Polygon(p) => buffer_polygon(p, params),
        Geometry::MultiPoint(mp) => union_all(
            mp.iter()
                .map(|p| MultiPolygon(vec![buffer_point(p, params)]))
                .collect(),
        ),
        Geometry::MultiLineString(mls) => {
            union_all(mls.iter().map(|ls| buffer_line_string(ls, params)).collect())
        }
        Geometry::MultiPolygon(mp) => {
            union_all(mp.iter().map(|p| buffer_polygon(p, params)).collect())
        }
        _ => MultiPolygon(vec![]),
    }
}

fn circle(cx: f64, cy: f64, r: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((cx + r * angle.cos(), cy + r * angle.sin()));
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

/// Vertex circles and edge quads covering a coordinate chain
fn ring_cover(coords: &[Coord<f64>], params: &BufferParams) -> Vec<MultiPolygon<f64>> {
    let r = params.distance.abs();
    if r == 0.0 || coords.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::with_capacity(coords.len() * 2);
    for c in coords {
        parts.push(MultiPolygon(vec![circle(c.x, c.y, r, params.segments)]));
    }
    for pair in coords.windows(2) {
        if let Some(quad) = segment_quad(pair[0], pair[1], r) {
            parts.push(MultiPolygon(vec![quad]));
        }
    }
    parts
}

/// Rectangle of width 2r along a segment; `None` for degenerate
/// (zero-length) segments, which the vertex circles already cover
fn segment_quad(a: Coord<f64>, b: Coord<f64>, r: f64) -> Option<Polygon<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return None;
    }

    let nx = -dy / len * r;
    let ny = dx / len * r;

    Some(Polygon::new(
        LineString::from(vec![
            (a.x + nx, a.y + ny),
            (b.x + nx, b.y + ny),
            (b.x - nx, b.y - ny),
            (a.x - nx, a.y - ny),
            (a.x + nx, a.y + ny),
        ]),
        vec![],
    ))
}
