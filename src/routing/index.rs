use crate::model::{Obstacle, Rect};

use super::RouteContext;
use super::geometry::{Segment, segment_bbox, segments};

/// Upper bound on grid cells; coarser cells are used past it.
const MAX_CELLS: usize = 250_000;
const MIN_CELL: f32 = 4.0;

/// Uniform grid of item indices bucketed by bounding box.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell: f32,
    min_x: f32,
    min_y: f32,
    cols: i32,
    rows: i32,
    buckets: Vec<Vec<usize>>,
}

impl GridIndex {
    pub fn new(boxes: &[Rect], cell: f32) -> Self {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for rect in boxes {
            min_x = min_x.min(rect.x);
            min_y = min_y.min(rect.y);
            max_x = max_x.max(rect.right());
            max_y = max_y.max(rect.bottom());
        }
        let cell = cell.max(MIN_CELL);
        if boxes.is_empty() {
            return Self {
                cell,
                min_x: 0.0,
                min_y: 0.0,
                cols: 0,
                rows: 0,
                buckets: Vec::new(),
            };
        }
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite {
            return Self::single_bucket(boxes.len(), cell);
        }

        // sized in f64 so extents near f32::MAX cannot overflow the cell count
        let width = (f64::from(max_x) - f64::from(min_x)).max(1.0);
        let height = (f64::from(max_y) - f64::from(min_y)).max(1.0);
        let cells_along = |extent: f64, cell: f64| (extent / cell).ceil() + 1.0;
        let mut grid_cell = f64::from(cell);
        while cells_along(width, grid_cell) * cells_along(height, grid_cell) > MAX_CELLS as f64 {
            grid_cell *= 2.0;
        }
        let cols = cells_along(width, grid_cell) as i32;
        let rows = cells_along(height, grid_cell) as i32;

        let mut index = Self {
            cell: grid_cell as f32,
            min_x,
            min_y,
            cols,
            rows,
            buckets: vec![Vec::new(); cols as usize * rows as usize],
        };
        for (idx, rect) in boxes.iter().enumerate() {
            let (x0, y0, x1, y1) = index.cell_range(rect);
            for iy in y0..=y1 {
                for ix in x0..=x1 {
                    let slot = index.slot(ix, iy);
                    index.buckets[slot].push(idx);
                }
            }
        }
        index
    }

    /// Every item in one bucket; used when the extent is not finite.
    fn single_bucket(len: usize, cell: f32) -> Self {
        Self {
            cell,
            min_x: 0.0,
            min_y: 0.0,
            cols: 1,
            rows: 1,
            buckets: vec![(0..len).collect()],
        }
    }

    fn slot(&self, ix: i32, iy: i32) -> usize {
        (iy * self.cols + ix) as usize
    }

    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let col = |v: f32| {
            (((v - self.min_x) / self.cell).floor() as i32).clamp(0, self.cols - 1)
        };
        let row = |v: f32| {
            (((v - self.min_y) / self.cell).floor() as i32).clamp(0, self.rows - 1)
        };
        (col(rect.x), row(rect.y), col(rect.right()), row(rect.bottom()))
    }

    fn misses(&self, rect: &Rect) -> bool {
        let max_x = self.min_x + self.cols as f32 * self.cell;
        let max_y = self.min_y + self.rows as f32 * self.cell;
        rect.right() < self.min_x || rect.x > max_x || rect.bottom() < self.min_y || rect.y > max_y
    }

    /// Indices of items whose cells meet `rect`, ascending and deduplicated.
    pub fn query(&self, rect: &Rect) -> Vec<usize> {
        if self.buckets.len() == 1 {
            return self.buckets[0].clone();
        }
        if self.buckets.is_empty() || self.misses(rect) {
            return Vec::new();
        }
        let (x0, y0, x1, y1) = self.cell_range(rect);
        let mut out = Vec::new();
        for iy in y0..=y1 {
            for ix in x0..=x1 {
                out.extend_from_slice(&self.buckets[self.slot(ix, iy)]);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Snapshot of everything a candidate is scored against for one route call.
#[derive(Debug)]
pub struct RouteIndex<'a> {
    segments: Vec<Segment>,
    segment_grid: GridIndex,
    obstacles: Vec<&'a Obstacle>,
    obstacle_grid: GridIndex,
}

impl<'a> RouteIndex<'a> {
    /// Collects other connections' segments and the obstacles not owned by
    /// either endpoint. Zero-area obstacles are dropped here.
    pub fn build(ctx: &RouteContext<'a>, cell: f32) -> Self {
        let mut segs: Vec<Segment> = Vec::new();
        for conn in ctx.existing {
            if ctx.exclude_connection_id == Some(conn.id.as_str()) {
                continue;
            }
            segs.extend(segments(&conn.path));
        }
        let obstacles: Vec<&'a Obstacle> = ctx
            .obstacles
            .items
            .iter()
            .filter(|obstacle| !obstacle.rect.is_degenerate())
            .filter(|obstacle| !ctx.start.owns(&obstacle.id) && !ctx.end.owns(&obstacle.id))
            .collect();

        let seg_boxes: Vec<Rect> = segs.iter().map(|s| segment_bbox(*s, 0.0)).collect();
        let obs_boxes: Vec<Rect> = obstacles.iter().map(|o| o.rect).collect();
        Self {
            segment_grid: GridIndex::new(&seg_boxes, cell),
            segments: segs,
            obstacle_grid: GridIndex::new(&obs_boxes, cell),
            obstacles,
        }
    }

    pub fn segments_near(&self, area: &Rect) -> impl Iterator<Item = Segment> + '_ {
        self.segment_grid
            .query(area)
            .into_iter()
            .map(|idx| self.segments[idx])
    }

    pub fn obstacles_near(&self, area: &Rect) -> impl Iterator<Item = &'a Obstacle> + '_ {
        self.obstacle_grid
            .query(area)
            .into_iter()
            .map(|idx| self.obstacles[idx])
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }
}
