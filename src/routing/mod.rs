pub mod cost;
pub mod geometry;
pub mod index;
pub mod select;
pub mod strategies;

use once_cell::sync::Lazy;

use crate::config::RouterConfig;
use crate::log::{debug, warn};
use crate::model::{CanvasBounds, Connection, EndpointContext, Obstacles, Point};
use crate::schedule::CancelToken;

pub use cost::Candidate;
pub use geometry::Segment;
use index::RouteIndex;
pub use strategies::{Strategy, StrategyInput, default_strategies};

static DEFAULT_ROUTER: Lazy<Router> = Lazy::new(Router::default);

/// Immutable snapshot of everything one route call depends on.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub start: &'a EndpointContext,
    pub end: &'a EndpointContext,
    pub existing: &'a [Connection],
    pub obstacles: &'a Obstacles,
    pub canvas: CanvasBounds,
    /// The connection being recomputed; its old path is not an obstacle.
    pub exclude_connection_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct RouteOutcome {
    /// Selected path with the visual endpoint offset applied.
    pub path: Vec<Point>,
    /// Winning candidate as scored, before the offset. `None` on fallback.
    pub chosen: Option<Candidate>,
    /// Every scored candidate, best first.
    pub candidates: Vec<Candidate>,
}

pub struct Router {
    config: RouterConfig,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("strategies", &names)
            .finish()
    }
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self::with_strategies(config, default_strategies())
    }

    pub fn with_strategies(config: RouterConfig, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { config, strategies }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Cleaned and scored candidates in generation order.
    pub fn candidates(&self, ctx: &RouteContext<'_>) -> Vec<Candidate> {
        self.score_all(ctx, None).unwrap_or_default()
    }

    fn score_all(
        &self,
        ctx: &RouteContext<'_>,
        cancel: Option<&CancelToken>,
    ) -> Option<Vec<Candidate>> {
        let eps = self.config.tolerances.epsilon;
        let p1 = ctx.start.point;
        let p2 = ctx.end.point;
        let input = StrategyInput {
            start: ctx.start,
            end: ctx.end,
            canvas: ctx.canvas,
            config: &self.config.strategies,
            epsilon: eps,
        };
        let index = RouteIndex::build(ctx, self.config.index_cell);

        let mut out = Vec::new();
        let mut order = 0usize;
        for strategy in &self.strategies {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                debug!(strategy = strategy.name(), "route request superseded");
                return None;
            }
            for raw in strategy.generate(p1, p2, &input) {
                let Some(path) = geometry::clean_path(&raw, p1, p2, eps) else {
                    continue;
                };
                out.push(cost::evaluate(
                    path,
                    strategy.name(),
                    order,
                    &index,
                    &ctx.canvas,
                    &self.config,
                ));
                order += 1;
            }
        }
        debug!(
            candidates = out.len(),
            segments = index.segment_count(),
            obstacles = index.obstacle_count(),
            "scored route candidates"
        );
        Some(out)
    }

    fn finish(&self, ctx: &RouteContext<'_>, mut candidates: Vec<Candidate>) -> RouteOutcome {
        let eps = self.config.tolerances.epsilon;
        select::rank(&mut candidates);
        let Some(best) = candidates.first().cloned() else {
            warn!(
                start = ctx.start.id.as_str(),
                end = ctx.end.id.as_str(),
                "no route candidate survived; using direct fallback"
            );
            return RouteOutcome {
                path: select::fallback_path(ctx.start.point, ctx.end.point),
                chosen: None,
                candidates,
            };
        };
        let path = select::apply_endpoint_offsets(
            best.path.clone(),
            ctx.start,
            ctx.end,
            self.config.visual_offset,
            eps,
        );
        RouteOutcome {
            path,
            chosen: Some(best),
            candidates,
        }
    }

    fn is_self_loop(&self, ctx: &RouteContext<'_>) -> bool {
        ctx.start
            .point
            .approx_eq(ctx.end.point, self.config.tolerances.epsilon)
    }

    pub fn route(&self, ctx: &RouteContext<'_>) -> RouteOutcome {
        if self.is_self_loop(ctx) {
            return RouteOutcome {
                path: select::fallback_path(ctx.start.point, ctx.start.point),
                chosen: None,
                candidates: Vec::new(),
            };
        }
        let candidates = self.candidates(ctx);
        self.finish(ctx, candidates)
    }

    /// Like [`Router::route`], but gives up with `None` once `cancel` reports
    /// that a newer request replaced this one.
    pub fn route_cancellable(
        &self,
        ctx: &RouteContext<'_>,
        cancel: &CancelToken,
    ) -> Option<RouteOutcome> {
        if cancel.is_cancelled() {
            return None;
        }
        if self.is_self_loop(ctx) {
            return Some(self.route(ctx));
        }
        let candidates = self.score_all(ctx, Some(cancel))?;
        if cancel.is_cancelled() {
            return None;
        }
        Some(self.finish(ctx, candidates))
    }
}

/// Routes one connection with the given weights.
pub fn route_connection(ctx: &RouteContext<'_>, config: &RouterConfig) -> Vec<Point> {
    if *config == RouterConfig::default() {
        return DEFAULT_ROUTER.route(ctx).path;
    }
    Router::new(config.clone()).route(ctx).path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExitSide, ObstacleKind, Rect};
    use crate::schedule::RouteScheduler;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn ctx<'a>(
        start: &'a EndpointContext,
        end: &'a EndpointContext,
        existing: &'a [Connection],
        obstacles: &'a Obstacles,
    ) -> RouteContext<'a> {
        RouteContext {
            start,
            end,
            existing,
            obstacles,
            canvas: CanvasBounds::new(1000.0, 800.0),
            exclude_connection_id: None,
        }
    }

    #[test]
    fn winner_is_cheapest_candidate() {
        let start = EndpointContext::new("a", "c1", p(60.0, 120.0)).with_side(ExitSide::Right);
        let end = EndpointContext::new("b", "c2", p(900.0, 610.0)).with_side(ExitSide::Left);
        let obstacles = Obstacles::new();
        let router = Router::default();
        let outcome = router.route(&ctx(&start, &end, &[], &obstacles));
        let chosen = outcome.chosen.expect("candidate");
        assert!(outcome.candidates.iter().all(|c| chosen.cost <= c.cost));
        assert_eq!(outcome.path[0], p(68.0, 120.0));
        assert_eq!(outcome.path[outcome.path.len() - 1], p(892.0, 610.0));
    }

    #[test]
    fn body_in_the_way_is_avoided() {
        let start = EndpointContext::new("a", "c1", p(100.0, 300.0));
        let end = EndpointContext::new("b", "c2", p(700.0, 300.0));
        let mut obstacles = Obstacles::new();
        obstacles.push("sp", ObstacleKind::Splitter, Rect::new(350.0, 250.0, 100.0, 100.0));
        let outcome = Router::default().route(&ctx(&start, &end, &[], &obstacles));
        let chosen = outcome.chosen.expect("candidate");
        assert!(!chosen.intersects_splitters);
        assert!(chosen.bends >= 2);
    }

    #[test]
    fn self_loop_returns_doubled_point() {
        let start = EndpointContext::new("a", "c1", p(10.0, 10.0));
        let end = EndpointContext::new("b", "c1", p(10.0, 10.0));
        let obstacles = Obstacles::new();
        let outcome = Router::default().route(&ctx(&start, &end, &[], &obstacles));
        assert_eq!(outcome.path, vec![p(10.0, 10.0), p(10.0, 10.0)]);
        assert!(outcome.chosen.is_none());
    }

    #[test]
    fn empty_strategy_list_falls_back_to_direct() {
        let start = EndpointContext::new("a", "c1", p(10.0, 10.0));
        let end = EndpointContext::new("b", "c2", p(90.0, 70.0));
        let obstacles = Obstacles::new();
        let router = Router::with_strategies(RouterConfig::default(), Vec::new());
        let outcome = router.route(&ctx(&start, &end, &[], &obstacles));
        assert_eq!(outcome.path, vec![p(10.0, 10.0), p(90.0, 70.0)]);
    }

    #[test]
    fn stale_request_is_dropped() {
        let start = EndpointContext::new("a", "c1", p(10.0, 10.0));
        let end = EndpointContext::new("b", "c2", p(90.0, 70.0));
        let obstacles = Obstacles::new();
        let scheduler = RouteScheduler::new();
        let stale = scheduler.begin();
        let fresh = scheduler.begin();
        let router = Router::default();
        let c = ctx(&start, &end, &[], &obstacles);
        assert!(router.route_cancellable(&c, &stale).is_none());
        let outcome = router.route_cancellable(&c, &fresh).expect("fresh request routes");
        assert_eq!(outcome.path, router.route(&c).path);
    }

    #[test]
    fn custom_config_is_honoured() {
        let start = EndpointContext::new("a", "c1", p(100.0, 300.0)).with_side(ExitSide::Right);
        let end = EndpointContext::new("b", "c2", p(700.0, 300.0)).with_side(ExitSide::Left);
        let obstacles = Obstacles::new();
        let config = RouterConfig {
            visual_offset: 0.0,
            ..RouterConfig::default()
        };
        let path = route_connection(&ctx(&start, &end, &[], &obstacles), &config);
        assert_eq!(path, vec![p(100.0, 300.0), p(700.0, 300.0)]);
    }

    #[test]
    fn far_flung_existing_path_still_routes() {
        let existing = vec![Connection {
            id: "far".to_string(),
            endpoint1_id: "x".to_string(),
            endpoint2_id: "y".to_string(),
            path: vec![p(0.0, 0.0), p(1e14, 0.0), p(1e14, 1e14)],
            manual: false,
        }];
        let start = EndpointContext::new("a", "c1", p(100.0, 300.0)).with_side(ExitSide::Right);
        let end = EndpointContext::new("b", "c2", p(700.0, 500.0)).with_side(ExitSide::Left);
        let obstacles = Obstacles::new();
        let outcome = Router::default().route(&ctx(&start, &end, &existing, &obstacles));
        assert!(outcome.chosen.is_some());
        assert_eq!(outcome.path[0], p(108.0, 300.0));
        assert!(geometry::is_orthogonal(&outcome.path, 0.5));
    }
}
