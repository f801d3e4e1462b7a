use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RouterConfig;
use crate::log::debug;
use crate::model::{
    CableOrientation, CableRole, CanvasBounds, Connection, EndpointContext, ExitSide,
    ObstacleKind, Obstacles, Point, Rect, cable_exit_side,
};
use crate::routing::geometry::{clean_path, is_orthogonal};
use crate::routing::select::reanchor_path;
use crate::routing::{RouteContext, RouteOutcome, Router};

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("unknown cable: {0}")]
    UnknownCable(String),
    #[error("unknown splitter: {0}")]
    UnknownSplitter(String),
    #[error("unknown connection: {0}")]
    UnknownConnection(String),
    #[error("connection id already in use: {0}")]
    DuplicateConnection(String),
    #[error("endpoint {0} is already spliced")]
    EndpointInUse(String),
    #[error("cannot splice endpoint {0} to itself")]
    SelfSplice(String),
    #[error("invalid path for connection {id}: {reason}")]
    InvalidPath { id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tube {
    pub id: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fiber {
    pub id: String,
    pub color: String,
    #[serde(default)]
    pub marked: bool,
    #[serde(default)]
    pub tube_id: Option<String>,
    pub rect: Rect,
    pub exit: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cable {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub body: Rect,
    pub orientation: CableOrientation,
    pub role: CableRole,
    #[serde(default)]
    pub tubes: Vec<Tube>,
    #[serde(default)]
    pub fibers: Vec<Fiber>,
}

impl Cable {
    pub fn exit_side(&self) -> ExitSide {
        cable_exit_side(self.orientation, self.role)
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.body = self.body.translate(dx, dy);
        for fiber in &mut self.fibers {
            fiber.rect = fiber.rect.translate(dx, dy);
            fiber.exit = fiber.exit.translate(dx, dy);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortKind {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitterPort {
    pub id: String,
    pub kind: PortKind,
    pub rect: Rect,
    pub exit: Point,
}

fn default_splitter_orientation() -> CableOrientation {
    CableOrientation::Horizontal
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Splitter {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub body: Rect,
    /// Horizontal splitters take input on the left; vertical ones on top.
    #[serde(default = "default_splitter_orientation")]
    pub orientation: CableOrientation,
    #[serde(default)]
    pub ports: Vec<SplitterPort>,
}

impl Splitter {
    pub fn port_side(&self, kind: PortKind) -> ExitSide {
        match (self.orientation, kind) {
            (CableOrientation::Horizontal, PortKind::Input) => ExitSide::Left,
            (CableOrientation::Horizontal, PortKind::Output) => ExitSide::Right,
            (CableOrientation::Vertical, PortKind::Input) => ExitSide::Top,
            (CableOrientation::Vertical, PortKind::Output) => ExitSide::Bottom,
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.body = self.body.translate(dx, dy);
        for port in &mut self.ports {
            port.rect = port.rect.translate(dx, dy);
            port.exit = port.exit.translate(dx, dy);
        }
    }
}

/// The editor's connection store together with the geometry the layout
/// layer computed for cables and splitters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub canvas: CanvasBounds,
    #[serde(default)]
    pub cables: Vec<Cable>,
    #[serde(default)]
    pub splitters: Vec<Splitter>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Parses a scene as JSON, retrying as JSON5 for hand-written files.
pub fn parse_scene(input: &str) -> anyhow::Result<Scene> {
    match serde_json::from_str::<Scene>(input) {
        Ok(scene) => Ok(scene),
        Err(json_err) => json5::from_str::<Scene>(input).map_err(|json5_err| {
            anyhow::anyhow!("invalid scene: {json_err} (as JSON5: {json5_err})")
        }),
    }
}

impl Scene {
    pub fn new(canvas: CanvasBounds) -> Self {
        Self {
            canvas,
            ..Self::default()
        }
    }

    pub fn endpoint(&self, id: &str) -> Option<EndpointContext> {
        for cable in &self.cables {
            if let Some(fiber) = cable.fibers.iter().find(|f| f.id == id) {
                return Some(
                    EndpointContext::new(&fiber.id, &cable.id, fiber.exit)
                        .with_side(cable.exit_side())
                        .with_owner_body(cable.body),
                );
            }
        }
        for splitter in &self.splitters {
            if let Some(port) = splitter.ports.iter().find(|p| p.id == id) {
                return Some(
                    EndpointContext::new(&port.id, &splitter.id, port.exit)
                        .with_side(splitter.port_side(port.kind))
                        .with_owner_body(splitter.body),
                );
            }
        }
        None
    }

    fn require_endpoint(&self, id: &str) -> Result<EndpointContext, SceneError> {
        self.endpoint(id)
            .ok_or_else(|| SceneError::UnknownEndpoint(id.to_string()))
    }

    /// Every body and strand rectangle as a flat obstacle snapshot.
    pub fn obstacles(&self) -> Obstacles {
        let mut obstacles = Obstacles::new();
        for cable in &self.cables {
            obstacles.push(&cable.id, ObstacleKind::Cable, cable.body);
            for fiber in &cable.fibers {
                obstacles.push(&fiber.id, ObstacleKind::Fiber, fiber.rect);
            }
        }
        for splitter in &self.splitters {
            obstacles.push(&splitter.id, ObstacleKind::Splitter, splitter.body);
            for port in &splitter.ports {
                obstacles.push(&port.id, ObstacleKind::Splitter, port.rect);
            }
        }
        obstacles
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    fn connection_index(&self, id: &str) -> Result<usize, SceneError> {
        self.connections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| SceneError::UnknownConnection(id.to_string()))
    }

    pub fn is_spliced(&self, endpoint_id: &str) -> bool {
        self.connections.iter().any(|c| c.touches(endpoint_id))
    }

    fn route_between(
        &self,
        start: &EndpointContext,
        end: &EndpointContext,
        exclude: Option<&str>,
        router: &Router,
    ) -> RouteOutcome {
        let obstacles = self.obstacles();
        let ctx = RouteContext {
            start,
            end,
            existing: &self.connections,
            obstacles: &obstacles,
            canvas: self.canvas,
            exclude_connection_id: exclude,
        };
        router.route(&ctx)
    }

    /// Routes a connection between its endpoints as the scene stands now.
    pub fn plan(&self, connection_id: &str, router: &Router) -> Result<RouteOutcome, SceneError> {
        let idx = self.connection_index(connection_id)?;
        let conn = &self.connections[idx];
        let start = self.require_endpoint(&conn.endpoint1_id)?;
        let end = self.require_endpoint(&conn.endpoint2_id)?;
        Ok(self.route_between(&start, &end, Some(connection_id), router))
    }

    /// Commits a presplice between two free endpoints.
    pub fn connect(
        &mut self,
        id: &str,
        endpoint1_id: &str,
        endpoint2_id: &str,
        router: &Router,
    ) -> Result<&Connection, SceneError> {
        if self.connection(id).is_some() {
            return Err(SceneError::DuplicateConnection(id.to_string()));
        }
        if endpoint1_id == endpoint2_id {
            return Err(SceneError::SelfSplice(endpoint1_id.to_string()));
        }
        let start = self.require_endpoint(endpoint1_id)?;
        let end = self.require_endpoint(endpoint2_id)?;
        for endpoint in [endpoint1_id, endpoint2_id] {
            if self.is_spliced(endpoint) {
                return Err(SceneError::EndpointInUse(endpoint.to_string()));
            }
        }

        let outcome = self.route_between(&start, &end, None, router);
        debug!(
            connection = id,
            cost = outcome.chosen.as_ref().map(|c| c.cost),
            "spliced"
        );
        self.connections.push(Connection {
            id: id.to_string(),
            endpoint1_id: endpoint1_id.to_string(),
            endpoint2_id: endpoint2_id.to_string(),
            path: outcome.path,
            manual: false,
        });
        let last = self.connections.len() - 1;
        Ok(&self.connections[last])
    }

    pub fn remove_connection(&mut self, id: &str) -> Result<Connection, SceneError> {
        let idx = self.connection_index(id)?;
        Ok(self.connections.remove(idx))
    }

    fn anchor(endpoint: &EndpointContext, config: &RouterConfig) -> Point {
        match endpoint.side {
            Some(side) if config.visual_offset > 0.0 => {
                side.step(endpoint.point, config.visual_offset)
            }
            _ => endpoint.point,
        }
    }

    /// Recomputes one connection and returns the route call behind the new
    /// path. Hand-edited connections keep their interior, only have their
    /// ends re-anchored, and yield `None`.
    pub fn reroute_with_outcome(
        &mut self,
        id: &str,
        router: &Router,
    ) -> Result<Option<RouteOutcome>, SceneError> {
        let idx = self.connection_index(id)?;
        let conn = &self.connections[idx];
        let start = self.require_endpoint(&conn.endpoint1_id)?;
        let end = self.require_endpoint(&conn.endpoint2_id)?;

        if conn.manual && conn.path.len() >= 2 {
            let config = router.config();
            let path = reanchor_path(
                &conn.path,
                Self::anchor(&start, config),
                Self::anchor(&end, config),
                config.tolerances.epsilon,
            );
            self.connections[idx].path = path;
            return Ok(None);
        }

        let outcome = self.route_between(&start, &end, Some(id), router);
        self.connections[idx].path = outcome.path.clone();
        Ok(Some(outcome))
    }

    pub fn reroute(&mut self, id: &str, router: &Router) -> Result<(), SceneError> {
        self.reroute_with_outcome(id, router).map(|_| ())
    }

    /// Reroutes every connection in store order, each against the updated
    /// state of the ones before it.
    pub fn reroute_all(&mut self, router: &Router) -> Result<(), SceneError> {
        let ids: Vec<String> = self.connections.iter().map(|c| c.id.clone()).collect();
        for id in ids {
            self.reroute(&id, router)?;
        }
        Ok(())
    }

    fn reroute_touching(
        &mut self,
        endpoint_ids: &[String],
        router: &Router,
    ) -> Result<Vec<String>, SceneError> {
        let affected: Vec<String> = self
            .connections
            .iter()
            .filter(|c| endpoint_ids.iter().any(|e| c.touches(e)))
            .map(|c| c.id.clone())
            .collect();
        for id in &affected {
            self.reroute(id, router)?;
        }
        Ok(affected)
    }

    /// Moves a cable and recomputes the connections attached to its fibers.
    /// Returns the ids of the connections that changed.
    pub fn move_cable(
        &mut self,
        cable_id: &str,
        dx: f32,
        dy: f32,
        router: &Router,
    ) -> Result<Vec<String>, SceneError> {
        let cable = self
            .cables
            .iter_mut()
            .find(|c| c.id == cable_id)
            .ok_or_else(|| SceneError::UnknownCable(cable_id.to_string()))?;
        cable.translate(dx, dy);
        let fibers: Vec<String> = cable.fibers.iter().map(|f| f.id.clone()).collect();
        self.reroute_touching(&fibers, router)
    }

    pub fn move_splitter(
        &mut self,
        splitter_id: &str,
        dx: f32,
        dy: f32,
        router: &Router,
    ) -> Result<Vec<String>, SceneError> {
        let splitter = self
            .splitters
            .iter_mut()
            .find(|s| s.id == splitter_id)
            .ok_or_else(|| SceneError::UnknownSplitter(splitter_id.to_string()))?;
        splitter.translate(dx, dy);
        let ports: Vec<String> = splitter.ports.iter().map(|p| p.id.clone()).collect();
        self.reroute_touching(&ports, router)
    }

    /// Stores a hand-edited path after a control-point drag. The path must be
    /// orthogonal and start and end within one visual offset of the exits.
    /// Repeated points and straight runs are merged before it is stored.
    pub fn commit_manual_path(
        &mut self,
        id: &str,
        path: Vec<Point>,
        config: &RouterConfig,
    ) -> Result<(), SceneError> {
        let idx = self.connection_index(id)?;
        let conn = &self.connections[idx];
        let invalid = |reason: &str| SceneError::InvalidPath {
            id: id.to_string(),
            reason: reason.to_string(),
        };
        if path.len() < 2 {
            return Err(invalid("needs at least two points"));
        }
        let eps = config.tolerances.epsilon;
        if !is_orthogonal(&path, eps) {
            return Err(invalid("segments must be horizontal or vertical"));
        }
        let start = self.require_endpoint(&conn.endpoint1_id)?;
        let end = self.require_endpoint(&conn.endpoint2_id)?;
        let (first, last) = (path[0], path[path.len() - 1]);
        let reach = config.visual_offset + eps;
        if first.manhattan(start.point) > reach || last.manhattan(end.point) > reach {
            return Err(invalid("ends must stay on their endpoints"));
        }
        let cleaned = clean_path(&path, first, last, eps)
            .ok_or_else(|| invalid("path collapses to a point"))?;

        let conn = &mut self.connections[idx];
        conn.path = cleaned;
        conn.manual = true;
        Ok(())
    }

    /// Drops manual edits and routes the connection from scratch.
    pub fn reset_connection(&mut self, id: &str, router: &Router) -> Result<(), SceneError> {
        let idx = self.connection_index(id)?;
        self.connections[idx].manual = false;
        self.reroute(id, router)
    }
}
