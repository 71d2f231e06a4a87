//! The two flicker noise experiments.

mod resistor;
mod transistor;

use std::fmt;
use std::path::{Path, PathBuf};

use flicker_netlist::{ModelSelector, Template, RESISTOR, TRANSISTOR, TRANSISTOR_MODEL};

/// A noise trace to read and plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveSpec {
    /// Analysis that wrote the trace.
    pub analysis: &'static str,
    /// Analysis kind, which is also the result file extension.
    pub kind: &'static str,
    pub signal: &'static str,
    pub label: &'static str,
    /// Plot the square root of a power density.
    pub amplitude: bool,
}

/// Which experiment to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experiment {
    Resistor(ModelSelector),
    Transistor,
}

impl Experiment {
    pub fn name(&self) -> &'static str {
        match self {
            Experiment::Resistor(_) => "resistor",
            Experiment::Transistor => "transistor",
        }
    }

    /// File stem of the artifacts this experiment writes by default.
    pub fn stem(&self) -> &'static str {
        match self {
            Experiment::Resistor(ModelSelector::Broken) => "broken_resistor",
            Experiment::Resistor(ModelSelector::Nominal) => "resistor",
            Experiment::Transistor => "transistor",
        }
    }

    pub fn template(&self) -> &'static Template {
        match self {
            Experiment::Resistor(_) => &RESISTOR,
            Experiment::Transistor => &TRANSISTOR,
        }
    }

    /// Device model file the netlist includes.
    pub fn model_path(&self, models_dir: &Path) -> PathBuf {
        match self {
            Experiment::Resistor(selector) => selector.resolve(models_dir),
            Experiment::Transistor => models_dir.join(TRANSISTOR_MODEL),
        }
    }

    pub fn curves(&self) -> &'static [CurveSpec] {
        match self {
            Experiment::Resistor(_) => resistor::CURVES,
            Experiment::Transistor => transistor::CURVES,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Experiment::Resistor(selector) => resistor::title(*selector),
            Experiment::Transistor => transistor::title(),
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Experiment::Resistor(selector) => write!(f, "resistor ({} model)", selector),
            Experiment::Transistor => write!(f, "transistor"),
        }
    }
}
