//! WASM bridge: a JavaScript renderer asks for frames, the core computes them.

mod simulation;

pub use simulation::WasmSimulation;
