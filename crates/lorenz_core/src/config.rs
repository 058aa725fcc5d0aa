use crate::error::{LorenzError, Result};
use crate::frame::DEFAULT_STEP_MULTIPLIER;
use crate::initial_conditions::{DEFAULT_CUBE_SIDE, DEFAULT_SEED};
use crate::lorenz::LorenzParameters;
use crate::solvers::IntegrationMethod;
use crate::time_grid::TimeSpan;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where and how an external encoder should write the finished animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub path: PathBuf,
    pub fps: u32,
    pub codec: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("lorentz_attractor.mp4"),
            fps: 15,
            codec: "libx264".to_string(),
        }
    }
}

/// Construction-time settings for one run. Nothing here changes once a session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub trajectory_count: usize,
    #[serde(flatten)]
    pub params: LorenzParameters,
    pub time_span: TimeSpan,
    pub sample_count: usize,
    pub random_seed: u64,
    pub step_multiplier: usize,
    pub frame_interval_ms: u64,
    /// `None` runs until the host stops asking for frames.
    pub total_frames: Option<u64>,
    pub initial_cube_side: f64,
    pub integration: IntegrationMethod,
    /// Box half-width beyond which a trajectory is reported as diverging.
    pub divergence_bound: Option<f64>,
    pub export: ExportSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trajectory_count: 20,
            params: LorenzParameters::default(),
            time_span: TimeSpan::default(),
            sample_count: 5000,
            random_seed: DEFAULT_SEED,
            step_multiplier: DEFAULT_STEP_MULTIPLIER,
            frame_interval_ms: 30,
            total_frames: Some(2000),
            initial_cube_side: DEFAULT_CUBE_SIDE,
            integration: IntegrationMethod::default(),
            divergence_bound: Some(1.0e3),
            export: ExportSettings::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|err| {
            LorenzError::setup("Could not parse simulation config.").with_source(err)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            LorenzError::setup(format!("Could not read config file {}.", path.display()))
                .with_source(err)
        })?;
        Self::from_json_str(&text)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trajectory_count == 0 {
            return Err(LorenzError::setup("trajectory_count must be at least 1."));
        }
        self.params.validate()?;
        let TimeSpan { start, end } = self.time_span;
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(LorenzError::setup(format!(
                "time_span must be finite with end >= start (got {start}..{end})."
            )));
        }
        if self.sample_count == 0 {
            return Err(LorenzError::setup("sample_count must be at least 1."));
        }
        if self.step_multiplier == 0 {
            return Err(LorenzError::setup("step_multiplier must be at least 1."));
        }
        if self.frame_interval_ms == 0 {
            return Err(LorenzError::setup("frame_interval_ms must be positive."));
        }
        if !self.initial_cube_side.is_finite() || self.initial_cube_side <= 0.0 {
            return Err(LorenzError::setup(format!(
                "initial_cube_side must be positive (got {}).",
                self.initial_cube_side
            )));
        }
        if let Some(bound) = self.divergence_bound {
            if bound.is_nan() || bound <= 0.0 {
                return Err(LorenzError::setup(format!(
                    "divergence_bound must be positive (got {bound})."
                )));
            }
        }
        self.integration.validate()?;
        if self.export.fps == 0 {
            return Err(LorenzError::setup("export.fps must be positive."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    #[test]
    fn defaults_match_reference_run() {
        let config = SimulationConfig::default();
        assert_eq!(config.trajectory_count, 20);
        assert_eq!(config.params.sigma, 10.0);
        assert_eq!(config.params.rho, 28.0);
        assert!((config.params.beta - 8.0 / 3.0).abs() < 1e-15);
        assert_eq!(config.time_span, TimeSpan { start: 0.0, end: 10.0 });
        assert_eq!(config.sample_count, 5000);
        assert_eq!(config.random_seed, 1);
        assert_eq!(config.step_multiplier, 5);
        assert_eq!(config.frame_interval(), Duration::from_millis(30));
        assert_eq!(config.total_frames, Some(2000));
        assert_eq!(config.export.fps, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimulationConfig::from_json_str(
            r#"{"trajectory_count": 3, "rho": 14.0, "total_frames": null}"#,
        )
        .expect("valid config");
        assert_eq!(config.trajectory_count, 3);
        assert_eq!(config.params.rho, 14.0);
        assert_eq!(config.params.sigma, 10.0);
        assert_eq!(config.total_frames, None);
        assert_eq!(config.sample_count, 5000);
    }

    #[test]
    fn malformed_json_is_a_setup_failure() {
        let err = SimulationConfig::from_json_str("{ nope").expect_err("invalid json");
        assert_eq!(err.stage(), Stage::Setup);
    }

    #[test]
    fn validation_rejects_each_bad_field() {
        let cases: Vec<(SimulationConfig, &str)> = vec![
            (
                SimulationConfig {
                    trajectory_count: 0,
                    ..Default::default()
                },
                "trajectory_count",
            ),
            (
                SimulationConfig {
                    sample_count: 0,
                    ..Default::default()
                },
                "sample_count",
            ),
            (
                SimulationConfig {
                    step_multiplier: 0,
                    ..Default::default()
                },
                "step_multiplier",
            ),
            (
                SimulationConfig {
                    frame_interval_ms: 0,
                    ..Default::default()
                },
                "frame_interval_ms",
            ),
            (
                SimulationConfig {
                    time_span: TimeSpan {
                        start: 5.0,
                        end: 1.0,
                    },
                    ..Default::default()
                },
                "time_span",
            ),
            (
                SimulationConfig {
                    divergence_bound: Some(-1.0),
                    ..Default::default()
                },
                "divergence_bound",
            ),
            (
                SimulationConfig {
                    params: LorenzParameters {
                        sigma: -10.0,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                "sigma",
            ),
        ];
        for (config, needle) in cases {
            let err = config.validate().expect_err("config should be rejected");
            assert!(
                err.to_string().contains(needle),
                "expected error to contain \"{needle}\", got \"{err}\""
            );
        }
    }
}
