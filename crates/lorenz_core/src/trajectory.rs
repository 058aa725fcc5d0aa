use crate::lorenz::{LorenzSystem, State};
use crate::solvers::IntegrationMethod;
use crate::time_grid::TimeGrid;
use tracing::{debug, info_span};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A solution sampled at every point of a [`TimeGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    states: Vec<State>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// States `[0, end)`, clamped to the trajectory length.
    pub fn prefix(&self, end: usize) -> &[State] {
        &self.states[..end.min(self.states.len())]
    }

    pub fn initial_state(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn final_state(&self) -> Option<&State> {
        self.states.last()
    }

    /// True if any sample is non-finite or has a coordinate beyond `bound`.
    pub fn escapes(&self, bound: f64) -> bool {
        self.states
            .iter()
            .any(|s| s.iter().any(|v| !v.is_finite() || v.abs() > bound))
    }
}

/// Solves one initial-value problem and samples it on `grid`.
///
/// Divergence is not treated as an error: non-finite values are kept as produced.
pub fn integrate_trajectory(
    system: &LorenzSystem,
    grid: &TimeGrid,
    initial: State,
    method: IntegrationMethod,
) -> Trajectory {
    let mut stepper = method.build(3);
    let times = grid.times();
    let mut states = Vec::with_capacity(times.len());
    let mut state = [initial.x, initial.y, initial.z];
    let mut t = grid.start();
    states.push(initial);

    for &t_next in &times[1..] {
        stepper.advance(system, &mut t, &mut state, t_next);
        states.push(State::from(state));
    }

    Trajectory { states }
}

/// Independent trajectories that share one time grid and one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryBatch {
    grid: TimeGrid,
    trajectories: Vec<Trajectory>,
}

impl TrajectoryBatch {
    /// Integrates every initial state. Output order follows `initial_states`.
    ///
    /// With the `parallel` feature each solve runs as its own rayon task; the solves
    /// share only the read-only system and grid.
    pub fn integrate(
        system: &LorenzSystem,
        grid: &TimeGrid,
        initial_states: &[State],
        method: IntegrationMethod,
    ) -> Self {
        let span = info_span!(
            "integrate_batch",
            trajectories = initial_states.len(),
            samples = grid.len()
        );
        let _enter = span.enter();

        let solve = |(index, x0): (usize, &State)| {
            let trajectory = integrate_trajectory(system, grid, *x0, method);
            debug!(
                index,
                final_state = ?trajectory.final_state().map(|s| [s.x, s.y, s.z]),
                "trajectory integrated"
            );
            trajectory
        };

        #[cfg(feature = "parallel")]
        let trajectories = initial_states.par_iter().enumerate().map(solve).collect();
        #[cfg(not(feature = "parallel"))]
        let trajectories = initial_states.iter().enumerate().map(solve).collect();

        Self {
            grid: grid.clone(),
            trajectories,
        }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn trajectory(&self, index: usize) -> Option<&Trajectory> {
        self.trajectories.get(index)
    }

    /// Number of trajectories.
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Samples per trajectory (the grid length).
    pub fn sample_count(&self) -> usize {
        self.grid.len()
    }

    /// Indices of trajectories that leave the box `|coord| <= bound` or go non-finite.
    pub fn escaped(&self, bound: f64) -> Vec<usize> {
        self.trajectories
            .iter()
            .enumerate()
            .filter(|(_, trajectory)| trajectory.escapes(bound))
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial_conditions::InitialConditionSampler;
    use crate::lorenz::LorenzParameters;

    fn lorenz() -> LorenzSystem {
        LorenzSystem::new(LorenzParameters::default())
    }

    #[test]
    fn zero_span_yields_single_sample_equal_to_initial_state() {
        let grid = TimeGrid::linspace(0.0, 0.0, 1).expect("grid");
        let x0 = State::new(3.0, -2.0, 7.5);
        let trajectory = integrate_trajectory(&lorenz(), &grid, x0, IntegrationMethod::default());
        assert_eq!(trajectory.states(), &[x0]);
    }

    #[test]
    fn short_horizon_stays_bounded() {
        let grid = TimeGrid::linspace(0.0, 1.0, 101).expect("grid");
        let trajectory = integrate_trajectory(
            &lorenz(),
            &grid,
            State::new(1.0, 1.0, 1.0),
            IntegrationMethod::default(),
        );
        assert_eq!(trajectory.len(), 101);
        let last = trajectory.final_state().expect("non-empty");
        assert!(last.iter().all(|v| v.is_finite() && v.abs() < 100.0), "{last:?}");
    }

    #[test]
    fn fixed_and_adaptive_methods_agree_on_short_horizon() {
        let grid = TimeGrid::linspace(0.0, 0.5, 51).expect("grid");
        let x0 = State::new(1.0, 1.0, 1.0);
        let adaptive = integrate_trajectory(&lorenz(), &grid, x0, IntegrationMethod::default());
        let rk4 = integrate_trajectory(
            &lorenz(),
            &grid,
            x0,
            IntegrationMethod::Rk4 { substeps: 20 },
        );
        let a = adaptive.final_state().expect("non-empty");
        let b = rk4.final_state().expect("non-empty");
        assert!((a - b).norm() < 1e-5, "adaptive={a:?} rk4={b:?}");
    }

    #[test]
    fn adaptive_run_meets_its_tolerance_against_fine_rk4() {
        let grid = TimeGrid::linspace(0.0, 1.0, 101).expect("grid");
        let x0 = State::new(1.0, 1.0, 1.0);
        let adaptive = integrate_trajectory(&lorenz(), &grid, x0, IntegrationMethod::default());
        let reference = integrate_trajectory(
            &lorenz(),
            &grid,
            x0,
            IntegrationMethod::Rk4 { substeps: 2000 },
        );
        let a = adaptive.final_state().expect("non-empty");
        let b = reference.final_state().expect("non-empty");
        assert!((a - b).norm() < 1e-6, "adaptive={a:?} reference={b:?}");
    }

    #[test]
    fn coincident_initial_states_give_identical_trajectories() {
        let grid = TimeGrid::linspace(0.0, 2.0, 201).expect("grid");
        let x0 = State::new(-4.0, 6.0, 12.0);
        let batch = TrajectoryBatch::integrate(
            &lorenz(),
            &grid,
            &[x0, x0],
            IntegrationMethod::default(),
        );
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.trajectories()[0], batch.trajectories()[1]);
    }

    #[test]
    fn repeated_integration_is_deterministic() {
        let grid = TimeGrid::linspace(0.0, 1.0, 101).expect("grid");
        let initial = InitialConditionSampler::default().sample(4);
        let first = TrajectoryBatch::integrate(
            &lorenz(),
            &grid,
            &initial,
            IntegrationMethod::default(),
        );
        let second = TrajectoryBatch::integrate(
            &lorenz(),
            &grid,
            &initial,
            IntegrationMethod::default(),
        );
        assert_eq!(first, second);
        for (trajectory, x0) in first.trajectories().iter().zip(&initial) {
            assert_eq!(trajectory.initial_state(), Some(x0));
        }
    }

    #[test]
    fn reference_batch_settles_on_the_attractor() {
        let grid = TimeGrid::linspace(0.0, 10.0, 5000).expect("grid");
        let initial = InitialConditionSampler::default().sample(20);
        let batch = TrajectoryBatch::integrate(
            &lorenz(),
            &grid,
            &initial,
            IntegrationMethod::default(),
        );
        assert_eq!(batch.len(), 20);
        assert_eq!(batch.sample_count(), 5000);
        assert!(batch.escaped(100.0).is_empty());

        // Late samples visit both lobes (x > 0 and x < 0) around z ~ 25.
        let tail: Vec<&State> = batch
            .trajectories()
            .iter()
            .flat_map(|t| t.states()[4000..].iter())
            .collect();
        assert!(tail.iter().any(|s| s.x > 5.0));
        assert!(tail.iter().any(|s| s.x < -5.0));
        assert!(tail.iter().all(|s| s.z > 0.0 && s.z < 60.0));
    }

    #[test]
    fn escaped_reports_non_finite_trajectories() {
        let grid = TimeGrid::linspace(0.0, 0.1, 3).expect("grid");
        let initial = [State::new(1.0, 1.0, 1.0), State::new(f64::NAN, 0.0, 0.0)];
        let batch = TrajectoryBatch::integrate(
            &lorenz(),
            &grid,
            &initial,
            IntegrationMethod::default(),
        );
        assert_eq!(batch.escaped(1.0e3), vec![1]);
    }

    #[test]
    fn prefix_is_clamped() {
        let grid = TimeGrid::linspace(0.0, 0.1, 11).expect("grid");
        let trajectory = integrate_trajectory(
            &lorenz(),
            &grid,
            State::new(1.0, 1.0, 1.0),
            IntegrationMethod::Rk4 { substeps: 1 },
        );
        assert!(trajectory.prefix(0).is_empty());
        assert_eq!(trajectory.prefix(4).len(), 4);
        assert_eq!(trajectory.prefix(1_000).len(), 11);
    }
}
