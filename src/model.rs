use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn approx_eq(self, other: Point, eps: f32) -> bool {
        (self.x - other.x).abs() < eps && (self.y - other.y).abs() < eps
    }

    pub fn manhattan(self, other: Point) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Rects with no area never act as obstacles.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Outward direction of an endpoint, away from the body that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl ExitSide {
    /// Unit step pointing out of the face.
    pub fn unit(self) -> (f32, f32) {
        match self {
            ExitSide::Left => (-1.0, 0.0),
            ExitSide::Right => (1.0, 0.0),
            ExitSide::Top => (0.0, -1.0),
            ExitSide::Bottom => (0.0, 1.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, ExitSide::Left | ExitSide::Right)
    }

    pub fn step(self, point: Point, distance: f32) -> Point {
        let (ux, uy) = self.unit();
        point.translate(ux * distance, uy * distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CableOrientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CableRole {
    In,
    Out,
}

/// Fibers of an "in" cable face the canvas interior from the left (or top);
/// "out" cables mirror that.
pub fn cable_exit_side(orientation: CableOrientation, role: CableRole) -> ExitSide {
    match (orientation, role) {
        (CableOrientation::Vertical, CableRole::In) => ExitSide::Right,
        (CableOrientation::Vertical, CableRole::Out) => ExitSide::Left,
        (CableOrientation::Horizontal, CableRole::In) => ExitSide::Bottom,
        (CableOrientation::Horizontal, CableRole::Out) => ExitSide::Top,
    }
}

/// A fiber or splitter port as seen by the router.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointContext {
    pub id: String,
    pub owner_id: String,
    pub point: Point,
    pub side: Option<ExitSide>,
    pub owner_body: Option<Rect>,
}

impl EndpointContext {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, point: Point) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            point,
            side: None,
            owner_body: None,
        }
    }

    pub fn with_side(mut self, side: ExitSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_owner_body(mut self, body: Rect) -> Self {
        self.owner_body = Some(body);
        self
    }

    /// True when `obstacle_id` is this endpoint or the body it sits on.
    pub fn owns(&self, obstacle_id: &str) -> bool {
        self.id == obstacle_id || self.owner_id == obstacle_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub endpoint1_id: String,
    pub endpoint2_id: String,
    #[serde(default)]
    pub path: Vec<Point>,
    /// Interior vertices were placed by hand; moves only re-anchor the ends.
    #[serde(default)]
    pub manual: bool,
}

impl Connection {
    pub fn touches(&self, endpoint_id: &str) -> bool {
        self.endpoint1_id == endpoint_id || self.endpoint2_id == endpoint_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObstacleKind {
    Fiber,
    Cable,
    Splitter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: String,
    pub kind: ObstacleKind,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Obstacles {
    pub items: Vec<Obstacle>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>, kind: ObstacleKind, rect: Rect) {
        self.items.push(Obstacle {
            id: id.into(),
            kind,
            rect,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasBounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_side_follows_orientation_and_role() {
        assert_eq!(
            cable_exit_side(CableOrientation::Vertical, CableRole::In),
            ExitSide::Right
        );
        assert_eq!(
            cable_exit_side(CableOrientation::Vertical, CableRole::Out),
            ExitSide::Left
        );
        assert_eq!(
            cable_exit_side(CableOrientation::Horizontal, CableRole::Out),
            ExitSide::Top
        );
    }

    #[test]
    fn zero_area_rects_are_degenerate() {
        assert!(Rect::new(10.0, 10.0, 0.0, 20.0).is_degenerate());
        assert!(Rect::new(10.0, 10.0, 5.0, -1.0).is_degenerate());
        assert!(!Rect::new(10.0, 10.0, 5.0, 1.0).is_degenerate());
    }

    #[test]
    fn connection_deserializes_from_camel_case() {
        let json = r#"{"id":"c1","endpoint1Id":"f1","endpoint2Id":"f2","path":[{"x":1,"y":2}]}"#;
        let conn: Connection = serde_json::from_str(json).unwrap();
        assert_eq!(conn.endpoint2_id, "f2");
        assert_eq!(conn.path, vec![Point::new(1.0, 2.0)]);
        assert!(!conn.manual);
    }
}
