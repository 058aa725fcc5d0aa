//! The Lorenz vector field.

use crate::error::{LorenzError, Result};
use crate::traits::{DynamicalSystem, Scalar};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A point (x, y, z) in phase space.
pub type State = Vector3<f64>;

/// Fixed constants of the Lorenz equations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzParameters {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for LorenzParameters {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

impl LorenzParameters {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("sigma", self.sigma), ("rho", self.rho), ("beta", self.beta)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LorenzError::setup(format!(
                    "Lorenz parameter {name} must be positive and finite (got {value})."
                )));
            }
        }
        Ok(())
    }
}

/// dx/dt = sigma (y - x), dy/dt = x (rho - z) - y, dz/dt = x y - beta z.
///
/// The field is autonomous; the time argument of [`DynamicalSystem::apply`] is ignored.
/// Non-finite inputs propagate through the arithmetic unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LorenzSystem {
    params: LorenzParameters,
}

impl LorenzSystem {
    pub fn new(params: LorenzParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LorenzParameters {
        &self.params
    }

    pub fn derivative(&self, state: &State) -> State {
        let mut out = [0.0; 3];
        DynamicalSystem::<f64>::apply(self, 0.0, state.as_slice(), &mut out);
        State::from(out)
    }
}

impl<T: Scalar> DynamicalSystem<T> for LorenzSystem {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let sigma = T::lit(self.params.sigma);
        let rho = T::lit(self.params.rho);
        let beta = T::lit(self.params.beta);
        let (x0, y0, z0) = (x[0], x[1], x[2]);
        out[0] = sigma * (y0 - x0);
        out[1] = x0 * (rho - z0) - y0;
        out[2] = x0 * y0 - beta * z0;
    }
}
