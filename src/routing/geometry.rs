use crate::model::{Point, Rect};

/// Threshold for calling a segment horizontal or vertical.
pub const AXIS_EPS: f32 = 1e-3;
/// Minimum shared extent for two lanes to count as overlapping.
const OVERLAP_EPS: f32 = 1e-3;

pub type Segment = (Point, Point);

pub fn is_horizontal(a: Point, b: Point) -> bool {
    (a.y - b.y).abs() < AXIS_EPS
}

pub fn is_vertical(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < AXIS_EPS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// `None` for zero-length and diagonal segments.
pub fn axis_of(segment: Segment) -> Option<Axis> {
    let (a, b) = segment;
    match (is_horizontal(a, b), is_vertical(a, b)) {
        (true, false) => Some(Axis::Horizontal),
        (false, true) => Some(Axis::Vertical),
        _ => None,
    }
}

fn span(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

fn overlap_1d(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.1.min(b.1) - a.0.max(b.0)
}

/// Same lane occupied: both horizontal (or both vertical), within `tolerance`
/// of the same line, with overlapping extents. Perpendicular pairs never match.
pub fn segments_collinear_overlap(s1: Segment, s2: Segment, tolerance: f32) -> bool {
    let (a1, a2) = s1;
    let (b1, b2) = s2;
    if is_horizontal(a1, a2) && is_horizontal(b1, b2) {
        if (a1.y - b1.y).abs() > tolerance {
            return false;
        }
        return overlap_1d(span(a1.x, a2.x), span(b1.x, b2.x)) > OVERLAP_EPS;
    }
    if is_vertical(a1, a2) && is_vertical(b1, b2) {
        if (a1.x - b1.x).abs() > tolerance {
            return false;
        }
        return overlap_1d(span(a1.y, a2.y), span(b1.y, b2.y)) > OVERLAP_EPS;
    }
    false
}

/// One horizontal and one vertical segment crossing strictly inside both.
pub fn segments_cross(s1: Segment, s2: Segment) -> bool {
    let (h, v) = match (axis_of(s1), axis_of(s2)) {
        (Some(Axis::Horizontal), Some(Axis::Vertical)) => (s1, s2),
        (Some(Axis::Vertical), Some(Axis::Horizontal)) => (s2, s1),
        _ => return false,
    };
    let (hx0, hx1) = span(h.0.x, h.1.x);
    let (vy0, vy1) = span(v.0.y, v.1.y);
    let x = v.0.x;
    let y = h.0.y;
    x > hx0 + OVERLAP_EPS && x < hx1 - OVERLAP_EPS && y > vy0 + OVERLAP_EPS && y < vy1 - OVERLAP_EPS
}

/// Tests an axis-aligned segment against `rect` grown by `margin`.
/// Touching the grown boundary does not count; diagonal segments never hit.
pub fn segment_intersects_rect(segment: Segment, rect: &Rect, margin: f32) -> bool {
    if rect.is_degenerate() {
        return false;
    }
    let r = rect.expand(margin);
    let (a, b) = segment;
    let (x0, x1) = span(a.x, b.x);
    let (y0, y1) = span(a.y, b.y);
    if is_horizontal(a, b) {
        return a.y > r.y && a.y < r.bottom() && x1 > r.x && x0 < r.right();
    }
    if is_vertical(a, b) {
        return a.x > r.x && a.x < r.right() && y1 > r.y && y0 < r.bottom();
    }
    false
}

pub fn segment_bbox(segment: Segment, pad: f32) -> Rect {
    let (x0, x1) = span(segment.0.x, segment.1.x);
    let (y0, y1) = span(segment.0.y, segment.1.y);
    Rect::new(x0 - pad, y0 - pad, x1 - x0 + pad * 2.0, y1 - y0 + pad * 2.0)
}

pub fn segments(points: &[Point]) -> impl Iterator<Item = Segment> + '_ {
    points.windows(2).map(|w| (w[0], w[1]))
}

pub fn path_length(points: &[Point]) -> f32 {
    segments(points).map(|(a, b)| a.manhattan(b)).sum()
}

/// Interior vertices where the path changes axis.
pub fn path_bends(points: &[Point]) -> usize {
    if points.len() < 3 {
        return 0;
    }
    let mut bends = 0usize;
    for w in points.windows(3) {
        let (p0, p1, p2) = (w[0], w[1], w[2]);
        if p0.approx_eq(p1, AXIS_EPS) || p1.approx_eq(p2, AXIS_EPS) {
            continue;
        }
        let incoming_h = is_horizontal(p0, p1);
        let outgoing_h = is_horizontal(p1, p2);
        if incoming_h != outgoing_h {
            bends += 1;
        }
    }
    bends
}

pub fn is_orthogonal(points: &[Point], eps: f32) -> bool {
    segments(points).all(|(a, b)| (a.x - b.x).abs() < eps || (a.y - b.y).abs() < eps)
}

/// Normalizes a raw candidate anchored at `p1` and `p2`.
///
/// Near-duplicate points are merged and straight continuations dropped. When
/// the result falls below two points while the endpoints differ, the missing
/// endpoint is re-appended once; anything still degenerate or diagonal is
/// rejected.
pub fn clean_path(raw: &[Point], p1: Point, p2: Point, eps: f32) -> Option<Vec<Point>> {
    if raw.is_empty() {
        return None;
    }
    let mut out: Vec<Point> = Vec::with_capacity(raw.len());
    for &point in raw {
        if let Some(&last) = out.last()
            && last.approx_eq(point, eps)
        {
            continue;
        }
        out.push(point);
    }

    if let Some(first) = out.first_mut() {
        *first = p1;
    }
    if out.len() >= 2 {
        let last = out.len() - 1;
        if out[last].approx_eq(p2, eps) {
            out[last] = p2;
        }
    }

    if out.len() < 2 && !p1.approx_eq(p2, eps) {
        out.push(p2);
    }
    if out.len() < 2 || !out[out.len() - 1].approx_eq(p2, eps) {
        return None;
    }

    let mut compact: Vec<Point> = Vec::with_capacity(out.len());
    for (idx, &point) in out.iter().enumerate() {
        if idx > 0 && idx + 1 < out.len() {
            let prev = compact[compact.len() - 1];
            let next = out[idx + 1];
            let straight = ((point.x - prev.x).abs() < eps && (next.x - point.x).abs() < eps)
                || ((point.y - prev.y).abs() < eps && (next.y - point.y).abs() < eps);
            if straight {
                continue;
            }
        }
        compact.push(point);
    }

    if compact.len() < 2 || !is_orthogonal(&compact, eps) {
        return None;
    }
    Some(compact)
}
