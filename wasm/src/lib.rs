use serde::Deserialize;
use splice_router::config::parse_config;
use splice_router::scene::parse_scene;
use splice_router::{Router, Scene};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RerouteOptions {
    /// Only reroute this connection; all of them otherwise.
    connection_id: Option<String>,
}

fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn reroute(scene: &mut Scene, router: &Router, options: &RerouteOptions) -> Result<(), String> {
    match options.connection_id.as_deref() {
        Some(id) => scene.reroute(id, router),
        None => scene.reroute_all(router),
    }
    .map_err(|error| error.to_string())
}

/// Reroutes a scene and returns it as JSON. `config_json` uses the same
/// format as the CLI's config file; `options_json` may name one connection.
#[wasm_bindgen]
pub fn reroute_scene(
    scene_json: &str,
    config_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let config = match config_json {
        Some(raw) => parse_config(&raw).map_err(js_error)?,
        None => Default::default(),
    };
    let options = match options_json {
        Some(raw) => serde_json::from_str::<RerouteOptions>(&raw).map_err(js_error)?,
        None => RerouteOptions::default(),
    };
    let mut scene = parse_scene(scene_json).map_err(js_error)?;
    let router = Router::new(config.router);
    reroute(&mut scene, &router, &options).map_err(js_error)?;
    serde_json::to_string(&scene).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use splice_router::Router;
    use splice_router::scene::parse_scene;

    use crate::{RerouteOptions, reroute};

    #[test]
    fn reroutes_every_connection() {
        let scene_json = r#"{
            "canvas": { "x": 0, "y": 0, "width": 800, "height": 400 },
            "cables": [
                { "id": "a", "body": { "x": 20, "y": 50, "width": 30, "height": 100 },
                  "orientation": "vertical", "role": "in",
                  "fibers": [ { "id": "a1", "color": "red", "rect": { "x": 50, "y": 77, "width": 20, "height": 6 }, "exit": { "x": 70, "y": 80 } } ] },
                { "id": "b", "body": { "x": 700, "y": 200, "width": 30, "height": 100 },
                  "orientation": "vertical", "role": "out",
                  "fibers": [ { "id": "b1", "color": "red", "rect": { "x": 680, "y": 247, "width": 20, "height": 6 }, "exit": { "x": 680, "y": 250 } } ] }
            ],
            "connections": [ { "id": "c", "endpoint1Id": "a1", "endpoint2Id": "b1" } ]
        }"#;
        let mut scene = parse_scene(scene_json).expect("scene should parse");
        reroute(&mut scene, &Router::default(), &RerouteOptions::default())
            .expect("scene should reroute");

        let path = &scene.connections[0].path;
        assert_eq!(path[0].x, 78.0);
        assert_eq!(path[path.len() - 1].x, 672.0);
    }
}
