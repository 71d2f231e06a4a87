//! Device model selection.

use std::fmt;
use std::path::{Path, PathBuf};

/// Device model file used by the transistor experiment.
pub const TRANSISTOR_MODEL: &str = "nmos.scs";

/// Which resistor model the resistor experiment includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSelector {
    /// Flicker noise modulated by the instantaneous current.
    #[default]
    Nominal,
    /// Flicker noise scaled by the current but never modulated by it.
    Broken,
}

impl ModelSelector {
    pub fn from_broken(broken: bool) -> Self {
        if broken {
            Self::Broken
        } else {
            Self::Nominal
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Nominal => "resistor.va",
            Self::Broken => "broken_resistor.va",
        }
    }

    /// Path of the model file under `models_dir`.
    pub fn resolve(self, models_dir: &Path) -> PathBuf {
        models_dir.join(self.file_name())
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominal => write!(f, "nominal"),
            Self::Broken => write!(f, "broken"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let dir = Path::new("models");
        assert_eq!(
            ModelSelector::Nominal.resolve(dir),
            PathBuf::from("models/resistor.va")
        );
        assert_eq!(
            ModelSelector::from_broken(true).resolve(dir),
            PathBuf::from("models/broken_resistor.va")
        );
        assert_eq!(ModelSelector::default(), ModelSelector::Nominal);
    }
}
