#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod log;
pub mod model;
pub mod route_dump;
pub mod routing;
pub mod scene;
pub mod schedule;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, RouterConfig};
pub use model::{Connection, EndpointContext, ExitSide, Obstacles, Point, Rect};
pub use routing::{RouteContext, RouteOutcome, Router, route_connection};
pub use scene::{Scene, SceneError};
