//! Flicker noise experiment driver.

mod config;
mod experiment;
mod pipeline;
mod plot;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use flicker_core::{extract_with_overrides, Notation, ParameterSet};
use flicker_netlist::ModelSelector;

use crate::config::{load_config, parse_param, CliOverrides, NotationSetting, RunConfig};
use crate::experiment::Experiment;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "flicker")]
#[command(about = "Simulate and plot flicker noise under DC and periodic drives", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Run configuration (TOML, or JSON with a .json extension)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override a parameter, e.g. -p freq=1MHz
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param, global = true)]
    params: Vec<(String, String)>,

    /// Image to write the chart to
    #[arg(short, long, value_name = "IMAGE", global = true)]
    output: Option<PathBuf>,

    /// Tick label notation
    #[arg(long, value_enum, global = true)]
    notation: Option<NotationSetting>,

    /// Stop once the netlist is written
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the parameters and exit
    #[arg(long, global = true)]
    list_params: bool,

    #[command(subcommand)]
    experiment: ExperimentCommand,
}

#[derive(Subcommand)]
enum ExperimentCommand {
    /// Resistor driven by DC and by a sine wave
    Resistor {
        /// Use the model whose noise is not modulated by the current
        #[arg(long)]
        broken: bool,
    },
    /// NMOS transistor with a constant and a sinusoidal gate drive
    Transistor,
}

impl From<&ExperimentCommand> for Experiment {
    fn from(command: &ExperimentCommand) -> Self {
        match command {
            ExperimentCommand::Resistor { broken } => {
                Experiment::Resistor(ModelSelector::from_broken(*broken))
            }
            ExperimentCommand::Transistor => Experiment::Transistor,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let experiment = Experiment::from(&cli.experiment);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RunConfig::default(),
    };
    let config = config.merge(CliOverrides {
        params: cli.params,
        output: cli.output,
        notation: cli.notation,
    });

    if cli.list_params {
        let template = experiment.template();
        let params = extract_with_overrides(template.defaults(), &config.overrides())
            .with_context(|| format!("extracting {} parameters", template.name()))?;
        print_params(&params, config.plot.notation.into());
        return Ok(());
    }

    let mut pipeline = Pipeline::new(experiment, &config);
    let outcome = pipeline.run(cli.dry_run)?;

    match outcome.image {
        Some(image) => println!("{}", image.display()),
        None => println!("{}", outcome.netlist.display()),
    }
    Ok(())
}

fn print_params(params: &ParameterSet, notation: Notation) {
    let width = params.names().map(str::len).max().unwrap_or(0);
    for param in params.iter() {
        let mut line = format!(
            "{:width$} = {}",
            param.name(),
            param.quantity().render(notation, 4),
            width = width
        );
        if let Some(derivation) = param.derivation() {
            line.push_str(&format!("  ({})", derivation));
        }
        if param.is_overridden() {
            line.push_str("  [overridden]");
        }
        if let Some(description) = param.description() {
            line.push_str(&format!("  -- {}", description));
        }
        println!("{}", line);
    }
}

fn report(err: &anyhow::Error) {
    eprintln!("error: {:#}", err);

    let Some(sim_err) = err.downcast_ref::<flicker_sim::Error>() else {
        return;
    };
    if let flicker_sim::Error::Simulation { stdout, .. } = sim_err {
        let tail: Vec<&str> = stdout.lines().rev().take(10).collect();
        for line in tail.into_iter().rev() {
            eprintln!("  | {}", line);
        }
    }
    if let Some(log_file) = sim_err.log_file() {
        eprintln!("see {} for the simulator log", log_file.display());
    }
}
