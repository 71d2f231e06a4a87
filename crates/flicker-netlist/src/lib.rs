//! Netlist generation for flicker noise experiments.
//!
//! A [`Template`] is a simulator netlist skeleton with declared slots. The
//! [`Netlist`] generator binds each slot to the parameter of the same name
//! and the `model` slot to the selected device model file.

pub mod error;
pub mod models;
pub mod netlist;
pub mod template;
pub mod templates;

pub use error::{Error, Result};
pub use models::{ModelSelector, TRANSISTOR_MODEL};
pub use netlist::Netlist;
pub use template::{SlotValues, Template, MODEL_SLOT};
pub use templates::{RESISTOR, TRANSISTOR};
