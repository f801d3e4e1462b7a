use crate::model::{Connection, Point};
use crate::routing::geometry::{path_bends, path_length};
use crate::routing::{Candidate, RouteOutcome};
use crate::scene::Scene;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RouteDump {
    pub width: f32,
    pub height: f32,
    pub connections: Vec<ConnectionDump>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub manual: bool,
    pub points: Vec<[f32; 2]>,
    pub bends: usize,
    pub length: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateDump>,
}

#[derive(Debug, Serialize)]
pub struct CandidateDump {
    pub strategy: String,
    pub cost: f32,
    pub bends: usize,
    pub length: f32,
    pub hard_collides: bool,
    pub too_close: bool,
    pub crossings: usize,
    pub points: Vec<[f32; 2]>,
}

fn points(path: &[Point]) -> Vec<[f32; 2]> {
    path.iter().map(|p| [p.x, p.y]).collect()
}

impl From<&Candidate> for CandidateDump {
    fn from(candidate: &Candidate) -> Self {
        CandidateDump {
            strategy: candidate.strategy.to_string(),
            cost: candidate.cost,
            bends: candidate.bends,
            length: candidate.length,
            hard_collides: candidate.hard_collides,
            too_close: candidate.too_close,
            crossings: candidate.crossings,
            points: points(&candidate.path),
        }
    }
}

impl ConnectionDump {
    pub fn from_connection(conn: &Connection) -> Self {
        ConnectionDump {
            id: conn.id.clone(),
            from: conn.endpoint1_id.clone(),
            to: conn.endpoint2_id.clone(),
            manual: conn.manual,
            points: points(&conn.path),
            bends: path_bends(&conn.path),
            length: path_length(&conn.path),
            strategy: None,
            cost: None,
            candidates: Vec::new(),
        }
    }

    /// Attaches the scoring details of the route call that produced the path.
    pub fn with_outcome(mut self, outcome: &RouteOutcome, keep_candidates: bool) -> Self {
        if let Some(chosen) = &outcome.chosen {
            self.strategy = Some(chosen.strategy.to_string());
            self.cost = Some(chosen.cost);
        }
        if keep_candidates {
            self.candidates = outcome.candidates.iter().map(CandidateDump::from).collect();
        }
        self
    }
}

impl RouteDump {
    pub fn from_scene(scene: &Scene) -> Self {
        RouteDump {
            width: scene.canvas.width,
            height: scene.canvas.height,
            connections: scene
                .connections
                .iter()
                .map(ConnectionDump::from_connection)
                .collect(),
        }
    }
}

pub fn write_route_dump<W: Write>(writer: W, dump: &RouteDump) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, dump)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_route_dump_file(path: &Path, dump: &RouteDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    write_route_dump(file, dump)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_reports_path_shape() {
        let conn = Connection {
            id: "c1".to_string(),
            endpoint1_id: "a".to_string(),
            endpoint2_id: "b".to_string(),
            path: vec![Point::new(0.0, 0.0), Point::new(0.0, 50.0), Point::new(30.0, 50.0)],
            manual: true,
        };
        let dump = ConnectionDump::from_connection(&conn);
        assert_eq!(dump.bends, 1);
        assert_eq!(dump.length, 80.0);
        assert_eq!(dump.points[2], [30.0, 50.0]);

        let mut out = Vec::new();
        let route_dump = RouteDump {
            width: 100.0,
            height: 100.0,
            connections: vec![dump],
        };
        write_route_dump(&mut out, &route_dump).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["connections"][0]["manual"], true);
        assert!(json["connections"][0].get("candidates").is_none());
    }
}
