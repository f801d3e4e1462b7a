use serde::Serialize;

use crate::config::RouterConfig;
use crate::model::{CanvasBounds, ObstacleKind, Point};

use super::geometry::{
    Axis, axis_of, path_bends, path_length, segment_bbox, segment_intersects_rect,
    segments, segments_collinear_overlap, segments_cross,
};
use super::index::RouteIndex;

/// One scored path considered during a single route call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub path: Vec<Point>,
    pub strategy: &'static str,
    /// Position in generation order; the final tie-break.
    pub order: usize,
    pub length: f32,
    pub bends: usize,
    pub hard_collides: bool,
    pub too_close: bool,
    pub crossings: usize,
    pub intersects_fibers: bool,
    pub intersects_cables: bool,
    pub intersects_splitters: bool,
    pub uses_central_channel: bool,
    pub cost: f32,
}

#[derive(Debug, Default, Clone, Copy)]
struct ConnectionHits {
    hard_collides: bool,
    too_close: bool,
    crossings: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct ObstacleHits {
    fibers: bool,
    cables: bool,
    splitters: bool,
}

fn connection_hits(
    path: &[Point],
    index: &RouteIndex<'_>,
    config: &RouterConfig,
) -> ConnectionHits {
    let hard_tol = config.tolerances.hard_collision;
    let near_tol = config.tolerances.proximity();
    let mut hits = ConnectionHits::default();
    for segment in segments(path) {
        let area = segment_bbox(segment, near_tol.max(hard_tol));
        for other in index.segments_near(&area) {
            if segments_collinear_overlap(segment, other, hard_tol) {
                hits.hard_collides = true;
            } else if segments_collinear_overlap(segment, other, near_tol) {
                hits.too_close = true;
            }
            if segments_cross(segment, other) {
                hits.crossings += 1;
            }
        }
    }
    // proximity only matters for paths that are not already colliding
    if hits.hard_collides {
        hits.too_close = false;
    }
    hits
}

fn obstacle_hits(path: &[Point], index: &RouteIndex<'_>, margin: f32) -> ObstacleHits {
    let mut hits = ObstacleHits::default();
    for segment in segments(path) {
        let area = segment_bbox(segment, margin.max(0.0));
        for obstacle in index.obstacles_near(&area) {
            if !segment_intersects_rect(segment, &obstacle.rect, margin) {
                continue;
            }
            match obstacle.kind {
                ObstacleKind::Fiber => hits.fibers = true,
                ObstacleKind::Cable => hits.cables = true,
                ObstacleKind::Splitter => hits.splitters = true,
            }
        }
    }
    hits
}

pub fn uses_central_channel(path: &[Point], canvas: &CanvasBounds, tolerance: f32) -> bool {
    let center = canvas.center();
    segments(path).any(|segment| match axis_of(segment) {
        Some(Axis::Vertical) => (segment.0.x - center.x).abs() <= tolerance,
        Some(Axis::Horizontal) => (segment.0.y - center.y).abs() <= tolerance,
        None => false,
    })
}

/// Scores a cleaned candidate path.
pub fn evaluate(
    path: Vec<Point>,
    strategy: &'static str,
    order: usize,
    index: &RouteIndex<'_>,
    canvas: &CanvasBounds,
    config: &RouterConfig,
) -> Candidate {
    let length = path_length(&path);
    let bends = path_bends(&path);
    let conn = connection_hits(&path, index, config);
    let obs = obstacle_hits(&path, index, config.tolerances.obstacle_margin);
    let central = uses_central_channel(&path, canvas, config.tolerances.central_channel);

    let w = &config.weights;
    let flag = |set: bool, weight: f32| if set { weight } else { 0.0 };
    let cost = length + bends as f32 * w.bend + conn.crossings as f32 * w.crossing
        + flag(conn.too_close, w.proximity)
        + flag(conn.hard_collides, w.hard_collision)
        + flag(obs.fibers, w.fiber)
        + flag(obs.cables, w.cable)
        + flag(obs.splitters, w.splitter)
        - flag(central, w.central_channel_reward);

    Candidate {
        path,
        strategy,
        order,
        length,
        bends,
        hard_collides: conn.hard_collides,
        too_close: conn.too_close,
        crossings: conn.crossings,
        intersects_fibers: obs.fibers,
        intersects_cables: obs.cables,
        intersects_splitters: obs.splitters,
        uses_central_channel: central,
        cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, EndpointContext, ObstacleKind, Obstacles, Rect};
    use crate::routing::RouteContext;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn conn(id: &str, path: Vec<Point>) -> Connection {
        Connection {
            id: id.to_string(),
            endpoint1_id: format!("{id}-a"),
            endpoint2_id: format!("{id}-b"),
            path,
            manual: false,
        }
    }

    fn score(
        path: Vec<Point>,
        existing: &[Connection],
        obstacles: &Obstacles,
        exclude: Option<&str>,
    ) -> Candidate {
        let start = EndpointContext::new("s", "cable-s", path[0]);
        let end = EndpointContext::new("e", "cable-e", path[path.len() - 1]);
        let canvas = CanvasBounds::new(1000.0, 800.0);
        let ctx = RouteContext {
            start: &start,
            end: &end,
            existing,
            obstacles,
            canvas,
            exclude_connection_id: exclude,
        };
        let config = RouterConfig::default();
        let index = RouteIndex::build(&ctx, config.index_cell);
        evaluate(path, "test", 0, &index, &canvas, &config)
    }

    #[test]
    fn free_path_costs_its_length_plus_bends() {
        let path = vec![p(10.0, 10.0), p(10.0, 110.0), p(60.0, 110.0)];
        let c = score(path, &[], &Obstacles::new(), None);
        let w = RouterConfig::default().weights;
        assert_eq!(c.length, 150.0);
        assert_eq!(c.bends, 1);
        assert!(!c.hard_collides && !c.too_close);
        assert_eq!(c.cost, 150.0 + w.bend);
    }

    #[test]
    fn overlap_is_hard_and_near_lane_is_proximity() {
        let existing = vec![conn("a", vec![p(100.0, 200.0), p(300.0, 200.0)])];
        let none = Obstacles::new();
        let hard = score(vec![p(120.0, 201.0), p(280.0, 201.0)], &existing, &none, None);
        assert!(hard.hard_collides);
        assert!(!hard.too_close);

        let near = score(vec![p(120.0, 207.0), p(280.0, 207.0)], &existing, &none, None);
        assert!(!near.hard_collides);
        assert!(near.too_close);

        let far = score(vec![p(120.0, 240.0), p(280.0, 240.0)], &existing, &none, None);
        assert!(!far.too_close);
    }

    #[test]
    fn excluded_connection_is_ignored() {
        let existing = vec![conn("self", vec![p(100.0, 200.0), p(300.0, 200.0)])];
        let path = vec![p(100.0, 200.0), p(300.0, 200.0)];
        let c = score(path, &existing, &Obstacles::new(), Some("self"));
        assert!(!c.hard_collides);
    }

    #[test]
    fn crossings_are_counted() {
        let existing = vec![
            conn("a", vec![p(150.0, 0.0), p(150.0, 400.0)]),
            conn("b", vec![p(250.0, 0.0), p(250.0, 400.0)]),
        ];
        let c = score(vec![p(100.0, 300.0), p(400.0, 300.0)], &existing, &Obstacles::new(), None);
        assert_eq!(c.crossings, 2);
    }

    #[test]
    fn obstacles_flag_by_kind_and_skip_owners() {
        let mut obstacles = Obstacles::new();
        obstacles.push("cable-s", ObstacleKind::Cable, Rect::new(0.0, 0.0, 20.0, 400.0));
        obstacles.push("f9", ObstacleKind::Fiber, Rect::new(150.0, 95.0, 30.0, 8.0));
        obstacles.push("sp1", ObstacleKind::Splitter, Rect::new(400.0, 0.0, 40.0, 40.0));
        obstacles.push("flat", ObstacleKind::Cable, Rect::new(100.0, 90.0, 300.0, 0.0));
        let c = score(vec![p(10.0, 100.0), p(300.0, 100.0)], &[], &obstacles, None);
        assert!(c.intersects_fibers);
        assert!(!c.intersects_cables);
        assert!(!c.intersects_splitters);
        let w = RouterConfig::default().weights;
        assert_eq!(c.cost, 290.0 + w.fiber);
    }

    #[test]
    fn central_lane_earns_reward() {
        let canvas = CanvasBounds::new(1000.0, 800.0);
        assert!(uses_central_channel(&[p(498.0, 0.0), p(498.0, 100.0)], &canvas, 5.0));
        assert!(uses_central_channel(&[p(0.0, 404.0), p(50.0, 404.0)], &canvas, 5.0));
        assert!(!uses_central_channel(&[p(0.0, 300.0), p(990.0, 300.0)], &canvas, 5.0));
    }

    /// Deterministic pseudo-random source so the comparison is reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        /// Multiples of 10 so lanes overlap and cross often.
        fn coord(&mut self, steps: u64) -> f32 {
            (self.next() % steps) as f32 * 10.0
        }
    }

    fn random_path(rng: &mut Lcg, points: usize) -> Vec<Point> {
        let mut path = vec![p(rng.coord(100), rng.coord(80))];
        for i in 1..points {
            let last = path[i - 1];
            let next = if i % 2 == 1 {
                p(rng.coord(100), last.y)
            } else {
                p(last.x, rng.coord(80))
            };
            path.push(next);
        }
        path
    }

    /// Unindexed reference: every candidate segment against every other segment
    /// and every obstacle.
    fn full_scan(path: &[Point], existing: &[Connection], obstacles: &Obstacles) -> Candidate {
        let config = RouterConfig::default();
        let hard_tol = config.tolerances.hard_collision;
        let near_tol = config.tolerances.proximity();
        let margin = config.tolerances.obstacle_margin;
        let mut out = score(path.to_vec(), &[], &Obstacles::new(), None);
        out.hard_collides = false;
        out.too_close = false;
        out.crossings = 0;
        for segment in segments(path) {
            for other in existing.iter().flat_map(|c| segments(&c.path)) {
                if segments_collinear_overlap(segment, other, hard_tol) {
                    out.hard_collides = true;
                } else if segments_collinear_overlap(segment, other, near_tol) {
                    out.too_close = true;
                }
                if segments_cross(segment, other) {
                    out.crossings += 1;
                }
            }
            for obstacle in &obstacles.items {
                if obstacle.rect.is_degenerate()
                    || !segment_intersects_rect(segment, &obstacle.rect, margin)
                {
                    continue;
                }
                match obstacle.kind {
                    ObstacleKind::Fiber => out.intersects_fibers = true,
                    ObstacleKind::Cable => out.intersects_cables = true,
                    ObstacleKind::Splitter => out.intersects_splitters = true,
                }
            }
        }
        if out.hard_collides {
            out.too_close = false;
        }
        out
    }

    #[test]
    fn indexed_scoring_matches_full_scan() {
        let mut rng = Lcg(0x5eed);
        let kinds = [ObstacleKind::Fiber, ObstacleKind::Cable, ObstacleKind::Splitter];
        for case in 0..300 {
            let existing: Vec<Connection> = (0..6)
                .map(|i| conn(&format!("c{i}"), random_path(&mut rng, 4)))
                .collect();
            let mut obstacles = Obstacles::new();
            for i in 0..8 {
                let rect = Rect::new(rng.coord(100), rng.coord(80), rng.coord(9), rng.coord(9));
                obstacles.push(format!("o{i}"), kinds[i % kinds.len()], rect);
            }
            let path = random_path(&mut rng, 5);

            let indexed = score(path.clone(), &existing, &obstacles, None);
            let reference = full_scan(&path, &existing, &obstacles);
            assert_eq!(indexed.hard_collides, reference.hard_collides, "case {case}");
            assert_eq!(indexed.too_close, reference.too_close, "case {case}");
            assert_eq!(indexed.crossings, reference.crossings, "case {case}");
            assert_eq!(indexed.intersects_fibers, reference.intersects_fibers, "case {case}");
            assert_eq!(indexed.intersects_cables, reference.intersects_cables, "case {case}");
            assert_eq!(indexed.intersects_splitters, reference.intersects_splitters, "case {case}");
        }
    }
}
