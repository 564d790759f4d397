//! Facepick Web - face measurement for browser viewers.
//!
//! The page does its own rendering and raycasting; it hands this module
//! the STL bytes and the picked triangle, and gets back the measurement as
//! JSON plus flat arrays for drawing the highlighted outline.
use facepick_core::{stl, Error, MeasureConfig, MeasureSession, PickEvent};
use nalgebra::Point3;
use tracing::debug;
use wasm_bindgen::prelude::*;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct FaceMeasurer {
    session: MeasureSession,
}

#[wasm_bindgen]
impl FaceMeasurer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> FaceMeasurer {
        FaceMeasurer {
            session: MeasureSession::default(),
        }
    }

    /// Replace the thresholds with a TOML document.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, toml: &str) -> Result<(), JsValue> {
        self.apply_config(toml).map_err(to_js)
    }

    /// Load a binary or ASCII STL; returns the triangle count.
    #[wasm_bindgen(js_name = loadStl)]
    pub fn load_stl(&mut self, data: &[u8]) -> Result<usize, JsValue> {
        self.load(data).map_err(to_js)
    }

    /// Measure the face under a pick. A negative triangle is a miss and
    /// keeps the current selection. Returns the selection as JSON.
    pub fn pick(&mut self, triangle: i32, x: f32, y: f32, z: f32) -> Option<String> {
        let point = Point3::new(x, y, z);
        let event = match usize::try_from(triangle) {
            Ok(triangle) => PickEvent::new(point, triangle),
            Err(_) => PickEvent::miss(point),
        };
        self.session.pick(&event)?;
        self.selection_json()
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    #[wasm_bindgen(js_name = selectionJson)]
    pub fn selection_json(&self) -> Option<String> {
        self.session
            .selection()
            .and_then(|result| serde_json::to_string(result).ok())
    }

    /// Outline segments as `[x0, y0, z0, x1, y1, z1, ...]`.
    #[wasm_bindgen(js_name = highlightEdgePositions)]
    pub fn highlight_edge_positions(&self) -> Vec<f32> {
        self.session
            .highlight_edges()
            .iter()
            .flat_map(|edge| {
                let (s, e) = (edge.start, edge.end);
                [s.x, s.y, s.z, e.x, e.y, e.z]
            })
            .collect()
    }

    /// One `0xRRGGBB` colour per outline segment.
    #[wasm_bindgen(js_name = highlightEdgeColors)]
    pub fn highlight_edge_colors(&self) -> Vec<u32> {
        self.session
            .highlight_edges()
            .iter()
            .map(|edge| edge.color.0)
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.session.generation()
    }
}

impl FaceMeasurer {
    fn apply_config(&mut self, toml: &str) -> facepick_core::Result<()> {
        let config = MeasureConfig::from_toml_str(toml)?;
        self.session.set_config(config);
        Ok(())
    }

    fn load(&mut self, data: &[u8]) -> facepick_core::Result<usize> {
        let mesh = stl::parse_stl(data).map_err(Error::from)?;
        let count = mesh.len();
        debug!(triangles = count, "Loaded STL from page");
        self.session.load_mesh(mesh);
        Ok(count)
    }
}

impl Default for FaceMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facepick_core::Mesh;

    fn loaded() -> FaceMeasurer {
        let mut measurer = FaceMeasurer::new();
        let bytes = stl::write_binary_stl(&Mesh::cube(2.0));
        assert_eq!(measurer.load(&bytes).unwrap(), 12);
        measurer
    }

    #[test]
    fn test_pick_returns_json_and_edges() {
        let mut measurer = loaded();
        let json = measurer.pick(0, 0.0, 0.0, 1.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "rectangle");
        assert_eq!(measurer.highlight_edge_positions().len(), 4 * 6);
        assert_eq!(measurer.highlight_edge_colors().len(), 4);
    }

    #[test]
    fn test_miss_keeps_selection_and_clear_drops_it() {
        let mut measurer = loaded();
        measurer.pick(0, 0.0, 0.0, 1.0);
        assert!(measurer.pick(-1, 5.0, 5.0, 5.0).is_none());
        assert!(measurer.selection_json().is_some());
        measurer.clear();
        assert!(measurer.selection_json().is_none());
        assert!(measurer.highlight_edge_positions().is_empty());
    }

    #[test]
    fn test_reload_bumps_generation() {
        let mut measurer = loaded();
        let before = measurer.generation();
        measurer.load(&stl::write_binary_stl(&Mesh::cube(1.0))).unwrap();
        assert!(measurer.generation() > before);
    }

    #[test]
    fn test_bad_input_is_an_error() {
        let mut measurer = FaceMeasurer::new();
        assert!(measurer.load(b"xx").is_err());
        assert!(measurer.apply_config("normal_threshold = 3.0").is_err());
    }
}
