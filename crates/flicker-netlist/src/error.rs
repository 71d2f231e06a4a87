//! Error types for netlist generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for netlist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a netlist.
#[derive(Debug, Error)]
pub enum Error {
    /// The skeleton contains a placeholder the template does not declare.
    #[error("template {template}: undeclared slot {{{{{slot}}}}}")]
    UnknownSlot { template: String, slot: String },

    /// A declared slot has no value bound to it.
    #[error("template {template}: no value for slot {slot}")]
    MissingSlot { template: String, slot: String },

    /// A value was bound to a name the template does not declare.
    #[error("template {template}: binding {slot} matches no slot")]
    UnusedBinding { template: String, slot: String },

    /// A placeholder was opened but never closed.
    #[error("template {template}: unterminated slot at byte {offset}")]
    UnterminatedSlot { template: String, offset: usize },

    /// Failed to write the netlist.
    #[error("failed to write netlist {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parameter error.
    #[error(transparent)]
    Core(#[from] flicker_core::Error),
}
