//! Error types for simulation and result reading.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the simulator or reading its results.
#[derive(Debug, Error)]
pub enum Error {
    /// The simulator exited with a failure status.
    #[error("simulation failed ({status}): {command}")]
    Simulation {
        command: String,
        status: String,
        stdout: String,
        log_file: PathBuf,
    },

    /// The simulator executable could not be started.
    #[error("simulator not found: {executable}: {reason}")]
    SimulatorNotFound { executable: String, reason: String },

    /// The simulator ran longer than allowed and was killed.
    #[error("simulator timed out after {secs} seconds: {command}")]
    Timeout {
        secs: u64,
        command: String,
        log_file: PathBuf,
    },

    /// The simulator reported success but left no results behind.
    #[error("simulator produced no results in {}: {command}", .results_dir.display())]
    MissingResults {
        results_dir: PathBuf,
        command: String,
        log_file: PathBuf,
    },

    /// Failed to read a result file.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed result file.
    #[error("result parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The result file uses a construct this reader does not handle.
    #[error("unsupported result format: {0}")]
    UnsupportedFormat(String),

    /// A trace does not have one sample per sweep point.
    #[error("signal {signal} has {actual} samples but the sweep has {expected} points")]
    Misaligned {
        signal: String,
        expected: usize,
        actual: usize,
    },

    /// Two traces that should share a sweep were recorded at different points.
    #[error("signal {signal} is swept at {actual} where point {index} should be {expected}")]
    SweepMismatch {
        signal: String,
        index: usize,
        expected: f64,
        actual: f64,
    },

    /// No signal with the requested name.
    #[error("signal not found: {name} (available: {})", .available.join(", "))]
    SignalNotFound {
        name: String,
        available: Vec<String>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Simulator log of a failed run, if the error comes from one.
    pub fn log_file(&self) -> Option<&Path> {
        match self {
            Error::Simulation { log_file, .. }
            | Error::Timeout { log_file, .. }
            | Error::MissingResults { log_file, .. } => Some(log_file),
            _ => None,
        }
    }
}
