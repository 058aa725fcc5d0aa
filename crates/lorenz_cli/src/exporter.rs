//! Writes the whole animation as one JSON scene document for an external encoder.

use lorenz_core::config::ExportSettings;
use lorenz_core::frame::{FrameGeometry, FrameState};
use lorenz_core::render::Renderer;
use lorenz_core::scene::Scene;
use lorenz_core::{LorenzError, SimulationSession};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Serialize)]
struct SceneDocument<'a> {
    scene: &'a Scene,
    export: ExportSettings,
    frame_interval_ms: u64,
    times: Vec<f64>,
    /// One flat `[x0, y0, z0, x1, ...]` array per trajectory.
    trajectories: Vec<Vec<f64>>,
    frames: &'a [ExportedFrame],
}

#[derive(Debug, Clone, Serialize)]
struct ExportedFrame {
    #[serde(flatten)]
    state: FrameState,
    markers: Vec<Option<[f64; 3]>>,
}

struct Prepared {
    scene: Scene,
    export: ExportSettings,
    frame_interval_ms: u64,
    times: Vec<f64>,
    trajectories: Vec<Vec<f64>>,
}

/// Renderer that records frame states and writes them with the full batch on `finish`.
pub struct SceneExporter {
    path: PathBuf,
    prepared: Option<Prepared>,
    frames: Vec<ExportedFrame>,
}

impl SceneExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            prepared: None,
            frames: Vec::new(),
        }
    }

    pub fn frames_recorded(&self) -> usize {
        self.frames.len()
    }
}

impl Renderer for SceneExporter {
    fn prepare(&mut self, scene: &Scene, session: &SimulationSession) -> Result<(), LorenzError> {
        let batch = session.batch();
        self.prepared = Some(Prepared {
            scene: scene.clone(),
            export: session.config().export.clone(),
            frame_interval_ms: session.config().frame_interval_ms,
            times: batch.grid().times().to_vec(),
            trajectories: batch
                .trajectories()
                .iter()
                .map(|t| t.states().iter().flat_map(|s| [s.x, s.y, s.z]).collect())
                .collect(),
        });
        self.frames.clear();
        Ok(())
    }

    fn draw(&mut self, frame: &FrameGeometry<'_>) -> Result<(), LorenzError> {
        if self.prepared.is_none() {
            return Err(LorenzError::frame_render(
                frame.state.frame_index,
                "exporter used before prepare",
            ));
        }
        self.frames.push(ExportedFrame {
            state: frame.state,
            markers: frame
                .polylines
                .iter()
                .map(|line| line.marker.map(|m| [m.x, m.y, m.z]))
                .collect(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LorenzError> {
        let prepared = self
            .prepared
            .take()
            .ok_or_else(|| LorenzError::export("exporter finished before prepare"))?;
        let document = SceneDocument {
            scene: &prepared.scene,
            export: prepared.export,
            frame_interval_ms: prepared.frame_interval_ms,
            times: prepared.times,
            trajectories: prepared.trajectories,
            frames: &self.frames,
        };

        let file = File::create(&self.path).map_err(|err| {
            LorenzError::export(format!("Could not create {}.", self.path.display()))
                .with_source(err)
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &document).map_err(|err| {
            LorenzError::export(format!("Could not write {}.", self.path.display()))
                .with_source(err)
        })?;
        writer.flush().map_err(|err| {
            LorenzError::export(format!("Could not flush {}.", self.path.display()))
                .with_source(err)
        })?;

        info!(
            path = %self.path.display(),
            frames = self.frames.len(),
            "scene exported"
        );
        Ok(())
    }
}
