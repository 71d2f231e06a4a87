//! The linear experiment pipeline.
//!
//! parameters → netlist → simulation → results → plot, with no retries.
//! Any failure aborts the run at the stage it happened in.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flicker_core::{extract_with_overrides, ParameterSet};
use flicker_netlist::Netlist;
use flicker_sim::{
    result_path, run_simulator, AxisScale, ResultSet, SimulationJob, SimulatorConfig, Sweep,
};
use indexmap::IndexMap;

use crate::config::RunConfig;
use crate::experiment::Experiment;
use crate::plot::{self, Curve, PlotSpec};

/// Pipeline stages in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    ParamsExtracted,
    NetlistWritten,
    SimulationRunning,
    ResultsLoaded,
    Plotted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParamsExtracted => "PARAMS_EXTRACTED",
            Stage::NetlistWritten => "NETLIST_WRITTEN",
            Stage::SimulationRunning => "SIMULATION_RUNNING",
            Stage::ResultsLoaded => "RESULTS_LOADED",
            Stage::Plotted => "PLOTTED",
        };
        f.write_str(name)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub stage: Stage,
    pub netlist: PathBuf,
    pub image: Option<PathBuf>,
}

/// One run of one experiment.
pub struct Pipeline<'a> {
    experiment: Experiment,
    config: &'a RunConfig,
    stage: Option<Stage>,
}

impl<'a> Pipeline<'a> {
    pub fn new(experiment: Experiment, config: &'a RunConfig) -> Self {
        Self {
            experiment,
            config,
            stage: None,
        }
    }

    /// The last stage reached.
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        log::info!("{}: {}", self.experiment, stage);
        self.stage = Some(stage);
    }

    /// Run every stage. With `dry_run` the run stops once the netlist is written.
    pub fn run(&mut self, dry_run: bool) -> Result<Outcome> {
        let params = self.extract_params()?;
        let netlist = self.write_netlist(&params)?;
        if dry_run {
            return Ok(Outcome {
                stage: Stage::NetlistWritten,
                netlist,
                image: None,
            });
        }

        let results_dir = self.simulate(&netlist)?;
        let spec = self.load_results(&results_dir)?;
        let image = self.plot(&spec)?;

        Ok(Outcome {
            stage: Stage::Plotted,
            netlist,
            image: Some(image),
        })
    }

    pub fn extract_params(&mut self) -> Result<ParameterSet> {
        let template = self.experiment.template();
        let params = extract_with_overrides(template.defaults(), &self.config.overrides())
            .with_context(|| format!("extracting {} parameters", template.name()))?;
        self.advance(Stage::ParamsExtracted);
        Ok(params)
    }

    pub fn write_netlist(&mut self, params: &ParameterSet) -> Result<PathBuf> {
        let model = self.experiment.model_path(&self.config.paths.models);
        if !model.exists() {
            log::warn!("device model {} does not exist", model.display());
        }

        let netlist = Netlist::generate(self.experiment.template(), params, &model)
            .with_context(|| format!("generating the {} netlist", self.experiment.name()))?;
        let path = self.config.paths.netlist_for(self.experiment.stem());
        netlist.write_to(&path)?;

        self.advance(Stage::NetlistWritten);
        Ok(path)
    }

    pub fn simulate(&mut self, netlist: &Path) -> Result<PathBuf> {
        let stem = self.experiment.stem();
        let job = SimulationJob::new(
            netlist,
            self.config.paths.log_for(stem),
            self.config.paths.results_for(stem),
        );
        let simulator = SimulatorConfig::from(&self.config.simulator);

        self.advance(Stage::SimulationRunning);
        let output = run_simulator(&job, &simulator)?;
        log::info!("simulation finished in {:.1?}", output.elapsed);
        Ok(output.results_dir)
    }

    pub fn load_results(&mut self, results_dir: &Path) -> Result<PlotSpec> {
        let mut files: IndexMap<PathBuf, ResultSet> = IndexMap::new();
        for curve in self.experiment.curves() {
            let path = result_path(results_dir, curve.analysis, curve.kind);
            if !files.contains_key(&path) {
                let results = ResultSet::open(&path)?;
                files.insert(path, results);
            }
        }

        let mut curves = Vec::new();
        let mut axes: Option<(Sweep, String, String, AxisScale)> = None;
        for spec in self.experiment.curves() {
            let results = &files[&result_path(results_dir, spec.analysis, spec.kind)];
            let sweep = results.sweep();
            let signal = results
                .signal(spec.signal)
                .with_context(|| format!("reading {} results", spec.analysis))?;

            let mut values = signal.samples.magnitudes();
            let mut units = signal.units.clone();
            if spec.amplitude {
                match plot::to_amplitude(&values, &units) {
                    Some((amplitude, amplitude_units)) => {
                        values = amplitude;
                        units = amplitude_units;
                    }
                    None => log::warn!(
                        "{}: units {:?} are not a power density, plotting as is",
                        spec.label,
                        signal.units
                    ),
                }
            }

            match axes.as_ref().map(|(first, ..)| first) {
                None => axes = Some((sweep.clone(), signal.name.clone(), units, signal.scale)),
                Some(first) if first.len() != sweep.len() => {
                    return Err(flicker_sim::Error::Misaligned {
                        signal: format!("{}.{}", spec.analysis, spec.signal),
                        expected: first.len(),
                        actual: sweep.len(),
                    }
                    .into());
                }
                Some(first) => {
                    if let Some(index) = first.first_difference(sweep) {
                        return Err(flicker_sim::Error::SweepMismatch {
                            signal: format!("{}.{}", spec.analysis, spec.signal),
                            index,
                            expected: first.values[index],
                            actual: sweep.values[index],
                        }
                        .into());
                    }
                }
            }

            curves.push(Curve {
                label: spec.label.to_string(),
                x: sweep.values.clone(),
                y: values,
            });
        }

        let Some((sweep, y_name, y_units, y_scale)) = axes else {
            bail!("{} has no curves to plot", self.experiment.name());
        };

        self.advance(Stage::ResultsLoaded);
        Ok(PlotSpec {
            title: self.experiment.title(),
            x_name: sweep.name,
            x_units: sweep.units,
            x_scale: sweep.scale,
            y_name,
            y_units,
            y_scale,
            curves,
            notation: self.config.plot.notation.into(),
            width: self.config.plot.width,
            height: self.config.plot.height,
        })
    }

    pub fn plot(&mut self, spec: &PlotSpec) -> Result<PathBuf> {
        let path = self.config.plot.output_for(self.experiment.stem());
        plot::render(spec, &path).with_context(|| format!("plotting to {}", path.display()))?;
        self.advance(Stage::Plotted);

        if let Some(viewer) = &self.config.plot.viewer {
            plot::open_viewer(viewer, &path);
        }
        Ok(path)
    }
}
