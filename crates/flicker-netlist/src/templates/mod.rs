//! Netlist templates for the two flicker noise experiments.

mod resistor;
mod transistor;

pub use resistor::RESISTOR;
pub use transistor::TRANSISTOR;

use crate::template::Template;

/// All built-in templates.
pub const TEMPLATES: &[Template] = &[RESISTOR, TRANSISTOR];

/// Look up a built-in template by name.
pub fn find(name: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.name() == name)
}
