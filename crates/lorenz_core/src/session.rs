use crate::config::SimulationConfig;
use crate::error::{LorenzError, Result};
use crate::frame::{empty_geometry, FrameGeometry, FrameSampler, FrameState};
use crate::initial_conditions::InitialConditionSampler;
use crate::lorenz::{LorenzSystem, State};
use crate::scene::Scene;
use crate::time_grid::TimeGrid;
use crate::trajectory::TrajectoryBatch;
use tracing::{info, warn};

/// Everything one run needs, computed once and read-only afterwards.
///
/// Frame generation borrows from the session, so a single session can feed any number
/// of renderers (or threads) at once.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    config: SimulationConfig,
    system: LorenzSystem,
    initial_states: Vec<State>,
    batch: TrajectoryBatch,
    sampler: FrameSampler,
    scene: Scene,
}

impl SimulationSession {
    /// Validates `config`, draws the seeded initial conditions and integrates the batch.
    pub fn build(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let sampler = InitialConditionSampler::new(config.random_seed, config.initial_cube_side)?;
        let initial_states = sampler.sample(config.trajectory_count);
        info!(
            seed = config.random_seed,
            count = initial_states.len(),
            "drew initial conditions"
        );
        Self::with_initial_states(config, initial_states)
    }

    /// Like [`SimulationSession::build`], but with caller-chosen initial states.
    /// `trajectory_count` is taken from `initial_states`.
    pub fn with_initial_states(
        mut config: SimulationConfig,
        initial_states: Vec<State>,
    ) -> Result<Self> {
        if initial_states.is_empty() {
            return Err(LorenzError::setup("At least one initial state is required."));
        }
        config.trajectory_count = initial_states.len();
        config.validate()?;

        let grid = TimeGrid::from_span(config.time_span, config.sample_count)?;
        let system = LorenzSystem::new(config.params);
        let batch = TrajectoryBatch::integrate(&system, &grid, &initial_states, config.integration);

        if let Some(bound) = config.divergence_bound {
            let escaped = batch.escaped(bound);
            if !escaped.is_empty() {
                warn!(
                    ?escaped,
                    bound, "trajectories left the bounding box or became non-finite"
                );
            }
        }
        info!(
            trajectories = batch.len(),
            samples = batch.sample_count(),
            "trajectory batch ready"
        );

        let scene = Scene::for_trajectories(batch.len());
        Ok(Self {
            sampler: FrameSampler::new(config.step_multiplier),
            config,
            system,
            initial_states,
            batch,
            scene,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn system(&self) -> &LorenzSystem {
        &self.system
    }

    pub fn initial_states(&self) -> &[State] {
        &self.initial_states
    }

    pub fn batch(&self) -> &TrajectoryBatch {
        &self.batch
    }

    pub fn sampler(&self) -> &FrameSampler {
        &self.sampler
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn frame_state(&self, frame: u64) -> FrameState {
        self.sampler.frame_state(frame, self.batch.sample_count())
    }

    pub fn frame(&self, frame: u64) -> FrameGeometry<'_> {
        self.sampler.geometry(frame, &self.batch)
    }

    /// Cleared geometry for the first frame and for resets.
    pub fn initial_frame(&self) -> FrameGeometry<'static> {
        empty_geometry(self.batch.len())
    }
}
