//! Netlist skeletons with typed slots.
//!
//! A skeleton marks each substitution point as `{{name}}`. Every name used
//! in the skeleton must be declared by the template, and rendering requires
//! exactly one value per declared slot.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Name of the slot that receives the device model path.
pub const MODEL_SLOT: &str = "model";

/// Values bound to template slots.
pub type SlotValues = BTreeMap<String, String>;

/// A netlist skeleton, its declared slots and its default parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    name: &'static str,
    skeleton: &'static str,
    slots: &'static [&'static str],
    defaults: &'static str,
}

impl Template {
    pub const fn new(
        name: &'static str,
        skeleton: &'static str,
        slots: &'static [&'static str],
        defaults: &'static str,
    ) -> Self {
        Self {
            name,
            skeleton,
            slots,
            defaults,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn skeleton(&self) -> &'static str {
        self.skeleton
    }

    /// Declared slots in declaration order.
    pub fn slots(&self) -> &'static [&'static str] {
        self.slots
    }

    /// Documented default parameter block.
    pub fn defaults(&self) -> &'static str {
        self.defaults
    }

    pub fn declares(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| *s == slot)
    }

    /// Substitute the bound values into the skeleton.
    pub fn render(&self, values: &SlotValues) -> Result<String> {
        if let Some(unused) = values.keys().find(|k| !self.declares(k)) {
            return Err(Error::UnusedBinding {
                template: self.name.to_string(),
                slot: unused.clone(),
            });
        }
        if let Some(missing) = self.slots.iter().find(|s| !values.contains_key(**s)) {
            return Err(Error::MissingSlot {
                template: self.name.to_string(),
                slot: missing.to_string(),
            });
        }

        let mut out = String::with_capacity(self.skeleton.len());
        let mut rest = self.skeleton;
        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or_else(|| Error::UnterminatedSlot {
                template: self.name.to_string(),
                offset: self.skeleton.len() - rest.len() + open,
            })?;

            let slot = after[..close].trim();
            let value = values
                .get(slot)
                .filter(|_| self.declares(slot))
                .ok_or_else(|| Error::UnknownSlot {
                    template: self.name.to_string(),
                    slot: slot.to_string(),
                })?;
            out.push_str(value);
            rest = &after[close + 2..];
        }
        out.push_str(rest);

        Ok(out)
    }

    /// Placeholder names in the order they appear in the skeleton.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.skeleton;
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                break;
            };
            names.push(after[..close].trim());
            rest = &after[close + 2..];
        }
        names
    }
}
