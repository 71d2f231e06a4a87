//! Netlist generation from a template and a parameter set.

use std::fs;
use std::path::Path;

use flicker_core::ParameterSet;

use crate::error::{Error, Result};
use crate::template::{SlotValues, Template, MODEL_SLOT};

/// A rendered netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Netlist {
    template: &'static str,
    text: String,
}

impl Netlist {
    /// Render `template` with every parameter slot bound to the parameter of
    /// the same name, and the model slot bound to `model`.
    ///
    /// Values are written in engineering notation at full precision without
    /// units, so the simulator reads back exactly the extracted value.
    pub fn generate(template: &Template, params: &ParameterSet, model: &Path) -> Result<Self> {
        let mut values = SlotValues::new();
        for slot in template.slots() {
            let value = if *slot == MODEL_SLOT {
                model.display().to_string()
            } else {
                params.quantity(slot)?.engineering()
            };
            values.insert(slot.to_string(), value);
        }

        let text = template.render(&values)?;
        Ok(Self {
            template: template.name(),
            text,
        })
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Write the netlist to `path`, replacing whatever was there.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let write_err = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, &self.text).map_err(write_err)?;

        log::debug!("wrote {} netlist to {}", self.template, path.display());
        Ok(())
    }
}
