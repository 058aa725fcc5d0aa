//! Core WASM simulation wrapper.

use js_sys::Float64Array;
use lorenz_core::frame::FrameRecord;
use lorenz_core::{SimulationConfig, SimulationSession};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSimulation {
    session: SimulationSession,
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn serialize_record(record: &FrameRecord) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(record)
        .map_err(|err| JsValue::from_str(&format!("Failed to serialize frame: {err}")))
}

impl WasmSimulation {
    pub(crate) fn from_session_config(config: SimulationConfig) -> Result<Self, String> {
        SimulationSession::build(config)
            .map(|session| Self { session })
            .map_err(|err| err.to_string())
    }

    pub(crate) fn record(&self, frame: u32) -> FrameRecord {
        self.session.frame(u64::from(frame)).to_record()
    }
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Builds the reference run: 20 trajectories, seed 1, 5000 samples over 0..10.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();
        Self::from_session_config(SimulationConfig::default()).map_err(to_js_error)
    }

    /// Builds a run from a plain JS object; omitted fields keep their defaults.
    pub fn from_config(config: JsValue) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();
        let config: SimulationConfig = if config.is_undefined() || config.is_null() {
            SimulationConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|err| JsValue::from_str(&format!("Invalid config: {err}")))?
        };
        Self::from_session_config(config).map_err(to_js_error)
    }

    pub fn trajectory_count(&self) -> usize {
        self.session.batch().len()
    }

    pub fn sample_count(&self) -> usize {
        self.session.batch().sample_count()
    }

    pub fn total_frames(&self) -> Option<f64> {
        self.session.config().total_frames.map(|n| n as f64)
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.session.config().frame_interval_ms as f64
    }

    pub fn sample_index(&self, frame: u32) -> usize {
        self.session.frame_state(u64::from(frame)).sample_index
    }

    /// `[elevation, azimuth]` in degrees.
    pub fn camera(&self, frame: u32) -> Vec<f64> {
        let camera = self.session.frame_state(u64::from(frame)).camera;
        vec![camera.elevation_deg, camera.azimuth_deg]
    }

    pub fn frame(&self, frame: u32) -> Result<JsValue, JsValue> {
        serialize_record(&self.record(frame))
    }

    pub fn initial_frame(&self) -> Result<JsValue, JsValue> {
        serialize_record(&self.session.initial_frame().to_record())
    }

    /// Full trajectory as a flat `[x0, y0, z0, x1, ...]` array.
    pub fn trajectory(&self, index: usize) -> Result<Float64Array, JsValue> {
        let trajectory = self.session.batch().trajectory(index).ok_or_else(|| {
            JsValue::from_str(&format!(
                "Trajectory index {index} out of range ({} trajectories).",
                self.trajectory_count()
            ))
        })?;
        let flat: Vec<f64> = trajectory
            .states()
            .iter()
            .flat_map(|s| [s.x, s.y, s.z])
            .collect();
        Ok(Float64Array::from(flat.as_slice()))
    }

    /// Flat `[r, g, b, ...]` colors, one triple per trajectory.
    pub fn colors(&self) -> Vec<f32> {
        self.session
            .scene()
            .colors
            .iter()
            .flat_map(|c| [c.r, c.g, c.b])
            .collect()
    }

    /// `[x_min, x_max, y_min, y_max, z_min, z_max]`
    pub fn bounds(&self) -> Vec<f64> {
        self.session.scene().limits.to_array().to_vec()
    }
}
