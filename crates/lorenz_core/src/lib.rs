//! The `lorenz_core` crate integrates a batch of Lorenz trajectories and turns them into
//! per-frame geometry for a rotating 3-D animation.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (vector fields),
//!   `Steppable` (Solvers).
//! - **Lorenz**: the vector field and its parameters.
//! - **Solvers**: RK4, Tsit5 and an error-controlled Tsit5 that samples onto a time grid.
//! - **Trajectory**: seeded initial conditions and the independent batch solve.
//! - **Frame**: the pure frame-index to geometry mapping, plus the reset hook.
//! - **Session / Render**: the read-only run record and the renderer seam.

pub mod config;
pub mod error;
pub mod frame;
pub mod initial_conditions;
pub mod lorenz;
pub mod render;
pub mod scene;
pub mod session;
pub mod solvers;
pub mod time_grid;
pub mod trajectory;
pub mod traits;

pub use config::SimulationConfig;
pub use error::{LorenzError, Stage};
pub use frame::{FrameGeometry, FrameRecord, FrameSampler};
pub use lorenz::{LorenzParameters, LorenzSystem, State};
pub use session::SimulationSession;
