use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weights of the candidate cost terms.
///
/// The hard-collision weight must stay larger than any sum of the other terms a
/// canvas-sized path can collect, otherwise a colliding path can win.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostWeights {
    pub bend: f32,
    pub crossing: f32,
    pub proximity: f32,
    pub hard_collision: f32,
    pub fiber: f32,
    pub cable: f32,
    pub splitter: f32,
    pub central_channel_reward: f32,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            bend: 25.0,
            crossing: 60.0,
            proximity: 200.0,
            hard_collision: 1_000_000.0,
            fiber: 50_000.0,
            cable: 100_000.0,
            splitter: 50_000.0,
            central_channel_reward: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tolerances {
    /// Points closer than this are merged; also the axis-alignment threshold.
    pub epsilon: f32,
    pub hard_collision: f32,
    /// Added to `hard_collision` for the proximity check.
    pub proximity_buffer: f32,
    pub obstacle_margin: f32,
    pub central_channel: f32,
}

impl Tolerances {
    pub fn proximity(&self) -> f32 {
        self.hard_collision + self.proximity_buffer
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            epsilon: 0.5,
            hard_collision: 2.0,
            proximity_buffer: 8.0,
            obstacle_margin: 5.0,
            central_channel: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    pub channel_offsets: Vec<f32>,
    /// Offsets crossed with each other by the channel-grid strategy.
    pub grid_offsets: Vec<f32>,
    pub exit_distances: Vec<f32>,
    pub edge_padding: f32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            channel_offsets: vec![
                0.0, 25.0, -25.0, 50.0, -50.0, 75.0, -75.0, 100.0, -100.0, 150.0, -150.0, 200.0,
                -200.0,
            ],
            grid_offsets: vec![0.0, 50.0, -50.0, 100.0, -100.0],
            exit_distances: vec![20.0, 40.0, 60.0, 80.0],
            edge_padding: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterConfig {
    pub weights: CostWeights,
    pub tolerances: Tolerances,
    pub strategies: StrategyConfig,
    /// Distance the rendered path starts outside an endpoint's face.
    pub visual_offset: f32,
    /// Cell size of the spatial index over segments and obstacles.
    pub index_cell: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            weights: CostWeights::default(),
            tolerances: Tolerances::default(),
            strategies: StrategyConfig::default(),
            visual_offset: 8.0,
            index_cell: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// Minimum gap between drag-move recomputes.
    pub throttle_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { throttle_ms: 16 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub router: RouterConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WeightsFile {
    bend_penalty: Option<f32>,
    crossing_penalty: Option<f32>,
    proximity_penalty: Option<f32>,
    hard_collision_penalty: Option<f32>,
    fiber_penalty: Option<f32>,
    cable_penalty: Option<f32>,
    splitter_penalty: Option<f32>,
    central_channel_reward: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TolerancesFile {
    epsilon: Option<f32>,
    hard_collision_tolerance: Option<f32>,
    proximity_buffer: Option<f32>,
    obstacle_margin: Option<f32>,
    central_channel_tolerance: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StrategiesFile {
    channel_offsets: Option<Vec<f32>>,
    grid_offsets: Option<Vec<f32>>,
    exit_distances: Option<Vec<f32>>,
    edge_padding: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    weights: Option<WeightsFile>,
    tolerances: Option<TolerancesFile>,
    strategies: Option<StrategiesFile>,
    visual_offset: Option<f32>,
    index_cell: Option<f32>,
    throttle_ms: Option<u64>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(w) = parsed.weights {
        let weights = &mut config.router.weights;
        if let Some(v) = w.bend_penalty {
            weights.bend = v;
        }
        if let Some(v) = w.crossing_penalty {
            weights.crossing = v;
        }
        if let Some(v) = w.proximity_penalty {
            weights.proximity = v;
        }
        if let Some(v) = w.hard_collision_penalty {
            weights.hard_collision = v;
        }
        if let Some(v) = w.fiber_penalty {
            weights.fiber = v;
        }
        if let Some(v) = w.cable_penalty {
            weights.cable = v;
        }
        if let Some(v) = w.splitter_penalty {
            weights.splitter = v;
        }
        if let Some(v) = w.central_channel_reward {
            weights.central_channel_reward = v;
        }
    }

    if let Some(t) = parsed.tolerances {
        let tol = &mut config.router.tolerances;
        if let Some(v) = t.epsilon {
            tol.epsilon = v.max(1e-4);
        }
        if let Some(v) = t.hard_collision_tolerance {
            tol.hard_collision = v.max(0.0);
        }
        if let Some(v) = t.proximity_buffer {
            tol.proximity_buffer = v.max(0.0);
        }
        if let Some(v) = t.obstacle_margin {
            tol.obstacle_margin = v;
        }
        if let Some(v) = t.central_channel_tolerance {
            tol.central_channel = v.max(0.0);
        }
    }

    if let Some(s) = parsed.strategies {
        let strategies = &mut config.router.strategies;
        if let Some(v) = s.channel_offsets {
            strategies.channel_offsets = v;
        }
        if let Some(v) = s.grid_offsets {
            strategies.grid_offsets = v;
        }
        if let Some(v) = s.exit_distances {
            strategies.exit_distances = v;
        }
        if let Some(v) = s.edge_padding {
            strategies.edge_padding = v;
        }
    }

    if let Some(v) = parsed.visual_offset {
        config.router.visual_offset = v.max(0.0);
    }
    if let Some(v) = parsed.index_cell {
        config.router.index_cell = v;
    }
    if let Some(v) = parsed.throttle_ms {
        config.schedule.throttle_ms = v;
    }

    Ok(config)
}
