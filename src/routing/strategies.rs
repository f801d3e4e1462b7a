use crate::config::StrategyConfig;
use crate::model::{CanvasBounds, EndpointContext, Point};

pub type Path = Vec<Point>;

/// What every strategy may look at besides the two exit points.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub start: &'a EndpointContext,
    pub end: &'a EndpointContext,
    pub canvas: CanvasBounds,
    pub config: &'a StrategyConfig,
    pub epsilon: f32,
}

/// A family of raw orthogonal polylines from `p1` to `p2`.
///
/// Paths must start at `p1` and end at `p2`; they are cleaned and scored by
/// the caller, so a strategy may emit duplicates or degenerate shapes.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, p1: Point, p2: Point, input: &StrategyInput<'_>) -> Vec<Path>;
}

/// Horizontal, vertical at `x`, horizontal.
fn via_column(p1: Point, p2: Point, x: f32) -> Path {
    vec![p1, Point::new(x, p1.y), Point::new(x, p2.y), p2]
}

/// Vertical, horizontal at `y`, vertical.
fn via_row(p1: Point, p2: Point, y: f32) -> Path {
    vec![p1, Point::new(p1.x, y), Point::new(p2.x, y), p2]
}

pub struct Direct;

impl Strategy for Direct {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn generate(&self, p1: Point, p2: Point, input: &StrategyInput<'_>) -> Vec<Path> {
        if (p1.x - p2.x).abs() < input.epsilon || (p1.y - p2.y).abs() < input.epsilon {
            vec![vec![p1, p2]]
        } else {
            Vec::new()
        }
    }
}

pub struct SingleBend;

impl Strategy for SingleBend {
    fn name(&self) -> &'static str {
        "single-bend"
    }

    fn generate(&self, p1: Point, p2: Point, _input: &StrategyInput<'_>) -> Vec<Path> {
        vec![
            vec![p1, Point::new(p1.x, p2.y), p2],
            vec![p1, Point::new(p2.x, p1.y), p2],
        ]
    }
}

pub struct MidpointDoubleBend;

impl Strategy for MidpointDoubleBend {
    fn name(&self) -> &'static str {
        "midpoint"
    }

    fn generate(&self, p1: Point, p2: Point, _input: &StrategyInput<'_>) -> Vec<Path> {
        vec![
            via_column(p1, p2, (p1.x + p2.x) / 2.0),
            via_row(p1, p2, (p1.y + p2.y) / 2.0),
        ]
    }
}

/// Parallel lanes around the canvas centerlines.
pub struct CentralChannel;

impl Strategy for CentralChannel {
    fn name(&self) -> &'static str {
        "central-channel"
    }

    fn generate(&self, p1: Point, p2: Point, input: &StrategyInput<'_>) -> Vec<Path> {
        let center = input.canvas.center();
        let mut out = Vec::with_capacity(input.config.channel_offsets.len() * 2);
        for &offset in &input.config.channel_offsets {
            out.push(via_column(p1, p2, center.x + offset));
            out.push(via_row(p1, p2, center.y + offset));
        }
        out
    }
}

/// Leaves each face straight for a fixed distance before turning, so the
/// first bend clears the owning body.
pub struct ExtendedExit;

impl Strategy for ExtendedExit {
    fn name(&self) -> &'static str {
        "extended-exit"
    }

    fn generate(&self, p1: Point, p2: Point, input: &StrategyInput<'_>) -> Vec<Path> {
        if input.start.side.is_none() && input.end.side.is_none() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(input.config.exit_distances.len() * 4);
        for &distance in &input.config.exit_distances {
            let s = input.start.side.map_or(p1, |side| side.step(p1, distance));
            let e = input.end.side.map_or(p2, |side| side.step(p2, distance));
            let inner = [
                vec![s, Point::new(s.x, e.y), e],
                vec![s, Point::new(e.x, s.y), e],
                via_column(s, e, (s.x + e.x) / 2.0),
                via_row(s, e, (s.y + e.y) / 2.0),
            ];
            for middle in inner {
                let mut path = Vec::with_capacity(middle.len() + 2);
                path.push(p1);
                path.extend(middle);
                path.push(p2);
                out.push(path);
            }
        }
        out
    }
}

/// Doglegs through waypoints on a grid of central-channel offsets.
pub struct ChannelGrid;

impl Strategy for ChannelGrid {
    fn name(&self) -> &'static str {
        "channel-grid"
    }

    fn generate(&self, p1: Point, p2: Point, input: &StrategyInput<'_>) -> Vec<Path> {
        let center = input.canvas.center();
        let offsets = &input.config.grid_offsets;
        let mut out = Vec::with_capacity(offsets.len() * offsets.len() * 2);
        for &ox in offsets {
            for &oy in offsets {
                let x = center.x + ox;
                let y = center.y + oy;
                out.push(vec![
                    p1,
                    Point::new(x, p1.y),
                    Point::new(x, y),
                    Point::new(p2.x, y),
                    p2,
                ]);
                out.push(vec![
                    p1,
                    Point::new(p1.x, y),
                    Point::new(x, y),
                    Point::new(x, p2.y),
                    p2,
                ]);
            }
        }
        out
    }
}

/// Lanes just inside the canvas border for when the middle is saturated.
pub struct EdgeRouting;

impl Strategy for EdgeRouting {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn generate(&self, p1: Point, p2: Point, input: &StrategyInput<'_>) -> Vec<Path> {
        let pad = input.config.edge_padding;
        let canvas = input.canvas;
        vec![
            via_column(p1, p2, canvas.x + pad),
            via_column(p1, p2, canvas.right() - pad),
            via_row(p1, p2, canvas.y + pad),
            via_row(p1, p2, canvas.bottom() - pad),
        ]
    }
}

/// The fixed generation order; earlier strategies win cost ties.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(Direct),
        Box::new(SingleBend),
        Box::new(MidpointDoubleBend),
        Box::new(CentralChannel),
        Box::new(ExtendedExit),
        Box::new(ChannelGrid),
        Box::new(EdgeRouting),
    ]
}
