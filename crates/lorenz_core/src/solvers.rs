use crate::error::{LorenzError, Result};
use crate::traits::{DynamicalSystem, Scalar, Steppable};
use serde::{Deserialize, Serialize};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = T::lit(0.5);
        let sixth = T::lit(1.0 / 6.0);
        let two = T::lit(2.0);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Tsitouras 5/4 Solver
///
/// Works as a plain fixed-step 5th order method through [`Steppable`], or as an
/// embedded pair through [`Tsit5::try_step`], which also reports the local error.
pub struct Tsit5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    tmp: Vec<T>,
    next: Vec<T>,
}

// Tsit5 tableau
const C2: f64 = 0.161;
const C3: f64 = 0.327;
const C4: f64 = 0.9;
const C5: f64 = 0.9800255409045097;

const A21: f64 = 0.161;

const A31: f64 = -0.008480655492356989;
const A32: f64 = 0.335480655492357;

const A41: f64 = 2.897153057105493;
const A42: f64 = -6.359448489975075;
const A43: f64 = 4.3622954328695815;

const A51: f64 = 5.325864828439257;
const A52: f64 = -11.748883564062828;
const A53: f64 = 7.4955393428898365;
const A54: f64 = -0.09249506636175525;

const A61: f64 = 5.86145544294642;
const A62: f64 = -12.92096931784711;
const A63: f64 = 8.159367898576159;
const A64: f64 = -0.071584973281401;
const A65: f64 = -0.028269050394068383;

// b coefficients (5th order), identical to the last stage row (FSAL)
const B1: f64 = 0.09646076681806523;
const B2: f64 = 0.01;
const B3: f64 = 0.4798896504144996;
const B4: f64 = 1.379008574103742;
const B5: f64 = -3.290069515436081;
const B6: f64 = 2.324710524099774;

// b - b_hat, the embedded error weights
const E1: f64 = -0.00178001105222577714;
const E2: f64 = -0.0008164344596567469;
const E3: f64 = 0.007880878010261995;
const E4: f64 = -0.1447110071732629;
const E5: f64 = 0.5823571654525552;
const E6: f64 = -0.45808210592918697;
const E7: f64 = 0.015151515151515152;

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            tmp: vec![z; dim],
            next: vec![z; dim],
        }
    }

    /// Evaluates stages k1..k6 and writes the 5th order solution into `out`.
    fn stages(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t0: T,
        state: &[T],
        dt: T,
        out: &mut [T],
    ) {
        let a21 = T::lit(A21);
        let (a31, a32) = (T::lit(A31), T::lit(A32));
        let (a41, a42, a43) = (T::lit(A41), T::lit(A42), T::lit(A43));
        let (a51, a52, a53, a54) = (T::lit(A51), T::lit(A52), T::lit(A53), T::lit(A54));
        let (a61, a62, a63, a64, a65) = (
            T::lit(A61),
            T::lit(A62),
            T::lit(A63),
            T::lit(A64),
            T::lit(A65),
        );

        // k1
        system.apply(t0, state, &mut self.k1);

        // k2
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        system.apply(t0 + T::lit(C2) * dt, &self.tmp, &mut self.k2);

        // k3
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        system.apply(t0 + T::lit(C3) * dt, &self.tmp, &mut self.k3);

        // k4
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t0 + T::lit(C4) * dt, &self.tmp, &mut self.k4);

        // k5
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t0 + T::lit(C5) * dt, &self.tmp, &mut self.k5);

        // k6
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k6);

        let (b1, b2, b3, b4, b5, b6) = (
            T::lit(B1),
            T::lit(B2),
            T::lit(B3),
            T::lit(B4),
            T::lit(B5),
            T::lit(B6),
        );
        for i in 0..state.len() {
            out[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b2 * self.k2[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }
    }

    /// Attempts one step of size dt from (t0, state) without committing it.
    ///
    /// Writes the candidate state into `out` and returns the RMS norm of the local
    /// error scaled by `atol + rtol * max(|y|, |y_new|)`. A value <= 1 means the step
    /// meets the tolerance.
    #[allow(clippy::too_many_arguments)]
    pub fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t0: T,
        state: &[T],
        dt: T,
        out: &mut [T],
        rtol: T,
        atol: T,
    ) -> T {
        self.stages(system, t0, state, dt, out);
        system.apply(t0 + dt, out, &mut self.k7);

        let (e1, e2, e3, e4, e5, e6, e7) = (
            T::lit(E1),
            T::lit(E2),
            T::lit(E3),
            T::lit(E4),
            T::lit(E5),
            T::lit(E6),
            T::lit(E7),
        );
        let mut sum = T::zero();
        for i in 0..state.len() {
            let local = dt
                * (e1 * self.k1[i]
                    + e2 * self.k2[i]
                    + e3 * self.k3[i]
                    + e4 * self.k4[i]
                    + e5 * self.k5[i]
                    + e6 * self.k6[i]
                    + e7 * self.k7[i]);
            let scale = atol + rtol * state[i].abs().max(out[i].abs());
            let ratio = local / scale;
            sum = sum + ratio * ratio;
        }
        match T::from_usize(state.len()) {
            Some(n) if n > T::zero() => (sum / n).sqrt(),
            _ => T::zero(),
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;
        let mut next = std::mem::take(&mut self.next);
        self.stages(system, t0, state, dt, &mut next);
        state.copy_from_slice(&next);
        self.next = next;
        *t = t0 + dt;
    }
}

/// Step-size controller around the Tsit5 embedded pair.
///
/// `advance` always lands exactly on the requested end time, so callers can sample a
/// solution on an arbitrary grid. The last accepted step size is carried between calls.
pub struct AdaptiveTsit5<T: Scalar> {
    stepper: Tsit5<T>,
    candidate: Vec<T>,
    rtol: T,
    atol: T,
    h: Option<T>,
    min_step: T,
    max_steps: usize,
}

impl<T: Scalar> AdaptiveTsit5<T> {
    const SAFETY: f64 = 0.9;
    const MIN_FACTOR: f64 = 0.2;
    const MAX_FACTOR: f64 = 5.0;

    pub fn new(dim: usize, rtol: T, atol: T) -> Self {
        Self {
            stepper: Tsit5::new(dim),
            candidate: vec![T::zero(); dim],
            rtol,
            atol,
            h: None,
            min_step: T::lit(1e-12),
            max_steps: 100_000,
        }
    }

    /// Step size the next call will start from, if any step has been taken.
    pub fn current_step(&self) -> Option<T> {
        self.h
    }

    /// Integrates from `t` to `t_end`, updating `t` and `state` in place.
    ///
    /// Steps shorter than the minimum step are accepted regardless of error so the loop
    /// always terminates; once the state itself is non-finite the interval is finished
    /// in one step and the non-finite values propagate.
    pub fn advance(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        t_end: T,
    ) {
        if t_end <= *t || t_end.is_nan() {
            return;
        }
        let mut h = self.h.unwrap_or(t_end - *t);
        let mut attempts = 0usize;

        while *t < t_end {
            attempts += 1;
            let remaining = t_end - *t;
            // Past the attempt budget, finish the interval in one unchecked step.
            let last = h >= remaining || attempts >= self.max_steps;
            let dt = if last { remaining } else { h };

            let err = self.stepper.try_step(
                system,
                *t,
                state,
                dt,
                &mut self.candidate,
                self.rtol,
                self.atol,
            );

            if !err.is_finite() && state.iter().any(|v| !v.is_finite()) {
                state.copy_from_slice(&self.candidate);
                *t = t_end;
                break;
            }

            let accept = err <= T::one() || dt <= self.min_step || attempts >= self.max_steps;
            let factor = (T::lit(Self::SAFETY) * err.powf(T::lit(-0.2)))
                .max(T::lit(Self::MIN_FACTOR))
                .min(T::lit(Self::MAX_FACTOR));

            if accept {
                state.copy_from_slice(&self.candidate);
                if last {
                    *t = t_end;
                } else {
                    *t = *t + dt;
                    h = dt * factor;
                }
            } else {
                h = dt * factor;
            }
        }

        self.h = Some(h);
    }
}

/// Integration scheme used to fill a trajectory on its time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Classic RK4 with a fixed number of equal substeps per grid interval.
    Rk4 { substeps: usize },
    /// Tsit5 with a fixed number of equal substeps per grid interval.
    Tsit5 { substeps: usize },
    /// Error-controlled Tsit5, resampled exactly onto the grid.
    AdaptiveTsit5 { rtol: f64, atol: f64 },
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::AdaptiveTsit5 {
            rtol: 1e-8,
            atol: 1e-10,
        }
    }
}

impl IntegrationMethod {
    pub fn validate(&self) -> Result<()> {
        match *self {
            IntegrationMethod::Rk4 { substeps } | IntegrationMethod::Tsit5 { substeps } => {
                if substeps == 0 {
                    return Err(LorenzError::setup(
                        "Fixed-step integration requires at least one substep per interval.",
                    ));
                }
            }
            IntegrationMethod::AdaptiveTsit5 { rtol, atol } => {
                if !(rtol.is_finite() && rtol > 0.0) || !(atol.is_finite() && atol > 0.0) {
                    return Err(LorenzError::setup(format!(
                        "Adaptive tolerances must be positive and finite \
                         (rtol={rtol}, atol={atol})."
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn build(self, dim: usize) -> GridStepper {
        match self {
            IntegrationMethod::Rk4 { substeps } => GridStepper::Rk4 {
                solver: RK4::new(dim),
                substeps,
            },
            IntegrationMethod::Tsit5 { substeps } => GridStepper::Tsit5 {
                solver: Tsit5::new(dim),
                substeps,
            },
            IntegrationMethod::AdaptiveTsit5 { rtol, atol } => {
                GridStepper::Adaptive(AdaptiveTsit5::new(dim, rtol, atol))
            }
        }
    }
}

/// A solver instance that advances a state from one grid point to the next.
pub enum GridStepper {
    Rk4 { solver: RK4<f64>, substeps: usize },
    Tsit5 { solver: Tsit5<f64>, substeps: usize },
    Adaptive(AdaptiveTsit5<f64>),
}

impl GridStepper {
    pub fn advance(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        t_end: f64,
    ) {
        match self {
            GridStepper::Rk4 { solver, substeps } => {
                fixed_advance(solver, *substeps, system, t, state, t_end)
            }
            GridStepper::Tsit5 { solver, substeps } => {
                fixed_advance(solver, *substeps, system, t, state, t_end)
            }
            GridStepper::Adaptive(solver) => solver.advance(system, t, state, t_end),
        }
    }
}

fn fixed_advance(
    solver: &mut impl Steppable<f64>,
    substeps: usize,
    system: &impl DynamicalSystem<f64>,
    t: &mut f64,
    state: &mut [f64],
    t_end: f64,
) {
    if t_end <= *t || t_end.is_nan() {
        return;
    }
    let dt = (t_end - *t) / substeps as f64;
    for _ in 0..substeps {
        solver.step(system, t, state, dt);
    }
    // Pin to the grid point rather than the accumulated sum of substeps.
    *t = t_end;
}
