//! Simulator invocation and result reading.
//!
//! This crate provides:
//! - A blocking runner for the external circuit simulator
//! - A reader for PSF ASCII result files

pub mod error;
pub mod psf;
pub mod runner;

pub use error::{Error, Result};
pub use psf::{result_path, AxisScale, Composite, ResultSet, Samples, Signal, Sweep};
pub use runner::{
    command_line, run_simulator, SimulationJob, SimulationOutput, SimulatorConfig,
};
