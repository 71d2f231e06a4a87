//! Run configuration loading and merging.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use flicker_core::{Notation, Overrides};
use flicker_sim::SimulatorConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Everything one run needs besides the experiment itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Simulator invocation.
    pub simulator: SimulatorSection,

    /// Where artifacts are written.
    pub paths: PathsConfig,

    /// Chart output.
    pub plot: PlotConfig,

    /// Parameter overrides by name.
    pub params: IndexMap<String, ParamValue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorSection {
    pub executable: String,
    pub format: String,
    pub extra_args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        let defaults = SimulatorConfig::default();
        Self {
            executable: defaults.executable,
            format: defaults.format,
            extra_args: defaults.extra_args,
            timeout_secs: defaults.timeout_secs,
        }
    }
}

impl From<&SimulatorSection> for SimulatorConfig {
    fn from(section: &SimulatorSection) -> Self {
        SimulatorConfig {
            executable: section.executable.clone(),
            format: section.format.clone(),
            extra_args: section.extra_args.clone(),
            timeout_secs: section.timeout_secs,
        }
    }
}

/// Artifact locations. Unset paths default to `<stem>.scs`, `<stem>.log`
/// and `<stem>.raw` in the current directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub netlist: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub results: Option<PathBuf>,
    /// Directory holding the device model files.
    pub models: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            netlist: None,
            log: None,
            results: None,
            models: PathBuf::from("models"),
        }
    }
}

impl PathsConfig {
    pub fn netlist_for(&self, stem: &str) -> PathBuf {
        self.netlist
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.scs", stem)))
    }

    pub fn log_for(&self, stem: &str) -> PathBuf {
        self.log
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.log", stem)))
    }

    pub fn results_for(&self, stem: &str) -> PathBuf {
        self.results
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.raw", stem)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// Image to write. `.svg` writes SVG, anything else a bitmap.
    pub output: Option<PathBuf>,
    pub notation: NotationSetting,
    pub width: u32,
    pub height: u32,
    /// Program to open the image with once it is written.
    pub viewer: Option<String>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: None,
            notation: NotationSetting::default(),
            width: 1024,
            height: 768,
            viewer: None,
        }
    }
}

impl PlotConfig {
    pub fn output_for(&self, stem: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.svg", stem)))
    }
}

/// Tick label notation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotationSetting {
    /// SI scale factors: 131.07 kHz
    #[default]
    Si,
    /// Engineering: 131.07e3 Hz
    Eng,
    /// Scientific: 1.31e5 Hz
    Sci,
}

impl From<NotationSetting> for Notation {
    fn from(setting: NotationSetting) -> Self {
        match setting {
            NotationSetting::Si => Notation::Si,
            NotationSetting::Eng => Notation::Engineering,
            NotationSetting::Sci => Notation::Scientific,
        }
    }
}

/// A parameter override as written in a config file: `freq = "1MHz"` or
/// `pts = 40`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Command-line settings that take precedence over the config file.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub params: Vec<(String, String)>,
    pub output: Option<PathBuf>,
    pub notation: Option<NotationSetting>,
}

impl RunConfig {
    /// Apply command-line settings on top of this configuration.
    pub fn merge(mut self, cli: CliOverrides) -> Self {
        for (name, value) in cli.params {
            self.params.insert(name, ParamValue::Text(value));
        }
        if let Some(output) = cli.output {
            self.plot.output = Some(output);
        }
        if let Some(notation) = cli.notation {
            self.plot.notation = notation;
        }
        self
    }

    /// Parameter overrides in the form the extractor takes.
    pub fn overrides(&self) -> Overrides {
        self.params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }
}

/// Load a configuration file: JSON when the extension is `.json`, TOML otherwise.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: RunConfig = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config as JSON: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config as TOML: {}", path.display()))?
    };

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &RunConfig) -> Result<()> {
    if config.simulator.executable.trim().is_empty() {
        bail!("simulator.executable must not be empty");
    }
    if config.simulator.format.trim().is_empty() {
        bail!("simulator.format must not be empty");
    }
    if config.plot.width == 0 || config.plot.height == 0 {
        bail!(
            "plot size must be positive, got {}x{}",
            config.plot.width,
            config.plot.height
        );
    }
    Ok(())
}

/// Parse a `NAME=VALUE` command-line parameter.
pub fn parse_param(arg: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found '{}'", arg))?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return Err(format!("expected NAME=VALUE, found '{}'", arg));
    }
    Ok((name.to_string(), value.to_string()))
}
