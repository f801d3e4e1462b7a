use crate::model::{EndpointContext, ExitSide, Point};

use super::cost::Candidate;
use super::geometry::clean_path;

/// Orders candidates best first: cost, then fewer bends, then generation order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        a.cost
            .total_cmp(&b.cost)
            .then(a.bends.cmp(&b.bends))
            .then(a.order.cmp(&b.order))
    });
}

/// Used when no candidate survives; `[p1, p1]` for a self-loop.
pub fn fallback_path(p1: Point, p2: Point) -> Vec<Point> {
    vec![p1, p2]
}

fn aligned(a: Point, b: Point, eps: f32) -> bool {
    (a.x - b.x).abs() < eps || (a.y - b.y).abs() < eps
}

/// Moves the first point `offset` out of its face, keeping every segment
/// axis-aligned.
fn nudge_front(mut path: Vec<Point>, side: ExitSide, offset: f32, eps: f32) -> Vec<Point> {
    let first = path[0];
    let next = path[1];
    let moved = side.step(first, offset);
    let parallel = if side.is_horizontal() {
        (next.y - first.y).abs() < eps
    } else {
        (next.x - first.x).abs() < eps
    };
    if parallel {
        path[0] = moved;
    } else if path.len() > 2 {
        // the segment after `next` runs along the outward axis, so shifting
        // `next` with the first point keeps it straight
        path[0] = moved;
        path[1] = side.step(next, offset);
    } else {
        let elbow = if side.is_horizontal() {
            Point::new(moved.x, next.y)
        } else {
            Point::new(next.x, moved.y)
        };
        path = vec![moved, elbow, next];
    }
    path
}

/// Applies the visual plug offset to whichever ends still sit exactly on
/// their raw exit point. Ends without a side are left alone.
pub fn apply_endpoint_offsets(
    path: Vec<Point>,
    start: &EndpointContext,
    end: &EndpointContext,
    offset: f32,
    eps: f32,
) -> Vec<Point> {
    if offset <= 0.0 || path.len() < 2 || start.point.approx_eq(end.point, eps) {
        return path;
    }
    let original = path.clone();
    let mut path = path;
    if let Some(side) = start.side
        && path[0] == start.point
    {
        path = nudge_front(path, side, offset, eps);
    }
    if let Some(side) = end.side
        && path.last() == Some(&end.point)
    {
        path.reverse();
        path = nudge_front(path, side, offset, eps);
        path.reverse();
    }
    let (first, last) = (path[0], path[path.len() - 1]);
    clean_path(&path, first, last, eps).unwrap_or(original)
}

/// Moves the ends of a hand-edited path onto new anchors, keeping every
/// interior vertex. Elbows are inserted where an anchor left its lane.
pub fn reanchor_path(path: &[Point], new_start: Point, new_end: Point, eps: f32) -> Vec<Point> {
    if path.len() < 3 {
        let out = if aligned(new_start, new_end, eps) {
            vec![new_start, new_end]
        } else {
            vec![new_start, Point::new(new_end.x, new_start.y), new_end]
        };
        return clean_path(&out, new_start, new_end, eps).unwrap_or(out);
    }

    let n = path.len();
    let mut out = Vec::with_capacity(n + 2);
    out.push(new_start);

    let second = path[1];
    if !aligned(new_start, second, eps) {
        let first_horizontal = (path[0].y - second.y).abs() < eps;
        out.push(if first_horizontal {
            Point::new(new_start.x, second.y)
        } else {
            Point::new(second.x, new_start.y)
        });
    }
    out.extend_from_slice(&path[1..n - 1]);

    let before_last = path[n - 2];
    if !aligned(before_last, new_end, eps) {
        let last_horizontal = (before_last.y - path[n - 1].y).abs() < eps;
        out.push(if last_horizontal {
            Point::new(new_end.x, before_last.y)
        } else {
            Point::new(before_last.x, new_end.y)
        });
    }
    out.push(new_end);

    clean_path(&out, new_start, new_end, eps).unwrap_or(out)
}
