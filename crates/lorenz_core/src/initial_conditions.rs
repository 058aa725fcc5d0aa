//! Seeded initial conditions.
//!
//! Points are drawn with `ChaCha8Rng::seed_from_u64(seed)`; for each point the x, y and z
//! coordinates are taken in that order as `-side / 2 + side * u` with `u = rng.gen::<f64>()`
//! in [0, 1). Repeated draws with the same seed and count are identical; no agreement with
//! other generators is implied.

use crate::error::{LorenzError, Result};
use crate::lorenz::State;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const DEFAULT_SEED: u64 = 1;
pub const DEFAULT_CUBE_SIDE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialConditionSampler {
    seed: u64,
    cube_side: f64,
}

impl Default for InitialConditionSampler {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            cube_side: DEFAULT_CUBE_SIDE,
        }
    }
}

impl InitialConditionSampler {
    pub fn new(seed: u64, cube_side: f64) -> Result<Self> {
        if !cube_side.is_finite() || cube_side <= 0.0 {
            return Err(LorenzError::setup(format!(
                "Initial-condition cube side must be positive and finite (got {cube_side})."
            )));
        }
        Ok(Self { seed, cube_side })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cube_side(&self) -> f64 {
        self.cube_side
    }

    /// Draws `count` states uniformly from the cube centered at the origin.
    pub fn sample(&self, count: usize) -> Vec<State> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let low = -0.5 * self.cube_side;
        let mut coord = || low + self.cube_side * rng.gen::<f64>();
        (0..count)
            .map(|_| {
                let x = coord();
                let y = coord();
                let z = coord();
                State::new(x, y, z)
            })
            .collect()
    }
}
