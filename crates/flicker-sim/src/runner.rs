//! Simulator process runner.
//!
//! The simulator is invoked as
//!
//! ```text
//! <exe> =log <log file> -format <format> -raw <result dir> [extra args...] <netlist>
//! ```
//!
//! and the pipeline blocks until it exits. Results left in the result
//! directory by an earlier run are removed first.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// How to invoke the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Path to the simulator executable (default: "spectre" in PATH).
    pub executable: String,
    /// Result format requested with `-format`.
    pub format: String,
    /// Arguments placed before the netlist.
    pub extra_args: Vec<String>,
    /// Kill the simulator after this many seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: "spectre".to_string(),
            format: "psfascii".to_string(),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// Files involved in one simulator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationJob {
    pub netlist: PathBuf,
    pub log_file: PathBuf,
    pub results_dir: PathBuf,
}

impl SimulationJob {
    pub fn new(
        netlist: impl Into<PathBuf>,
        log_file: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            netlist: netlist.into(),
            log_file: log_file.into(),
            results_dir: results_dir.into(),
        }
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub stdout: String,
    pub stderr: String,
    pub results_dir: PathBuf,
    pub elapsed: Duration,
}

/// Arguments passed to the simulator, excluding the executable.
pub fn simulator_args(job: &SimulationJob, config: &SimulatorConfig) -> Vec<String> {
    let mut args = vec![
        "=log".to_string(),
        job.log_file.display().to_string(),
        "-format".to_string(),
        config.format.clone(),
        "-raw".to_string(),
        job.results_dir.display().to_string(),
    ];
    args.extend(config.extra_args.iter().cloned());
    args.push(job.netlist.display().to_string());
    args
}

/// The full command line, quoted for display.
pub fn command_line(job: &SimulationJob, config: &SimulatorConfig) -> String {
    std::iter::once(config.executable.clone())
        .chain(simulator_args(job, config))
        .map(|arg| quote(&arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('\'') {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// Run the simulator on a netlist and wait for it to finish.
pub fn run_simulator(job: &SimulationJob, config: &SimulatorConfig) -> Result<SimulationOutput> {
    let command = command_line(job, config);
    clear_stale_results(job)?;
    log::debug!("running {}", command);

    let start = Instant::now();
    let child = Command::new(&config.executable)
        .args(simulator_args(job, config))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::SimulatorNotFound {
            executable: config.executable.clone(),
            reason: e.to_string(),
        })?;

    let (status, stdout, stderr) = match config.timeout_secs {
        Some(secs) => match wait_with_timeout(child, Duration::from_secs(secs))? {
            Some(finished) => finished,
            None => {
                return Err(Error::Timeout {
                    secs,
                    command,
                    log_file: job.log_file.clone(),
                })
            }
        },
        None => {
            let output = child.wait_with_output()?;
            (
                output.status,
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )
        }
    };
    let elapsed = start.elapsed();

    log::trace!("simulator stdout:\n{}", stdout);
    log::trace!("simulator stderr:\n{}", stderr);

    if !status.success() {
        return Err(Error::Simulation {
            command,
            status: status.to_string(),
            stdout,
            log_file: job.log_file.clone(),
        });
    }

    if !job.results_dir.is_dir() {
        return Err(Error::MissingResults {
            results_dir: job.results_dir.clone(),
            command,
            log_file: job.log_file.clone(),
        });
    }

    log::debug!("simulator finished in {:.2?}", elapsed);
    Ok(SimulationOutput {
        stdout,
        stderr,
        results_dir: job.results_dir.clone(),
        elapsed,
    })
}

/// Remove the result directory of an earlier run so that only fresh results
/// can be read. A directory holding the netlist or log, or one without a
/// name such as `.`, is left alone.
fn clear_stale_results(job: &SimulationJob) -> Result<()> {
    let dir = &job.results_dir;
    if !dir.exists() {
        return Ok(());
    }
    if dir.file_name().is_none() || job.netlist.starts_with(dir) || job.log_file.starts_with(dir)
    {
        log::warn!("not clearing old results in {}", dir.display());
        return Ok(());
    }

    log::debug!("removing old results in {}", dir.display());
    if dir.is_dir() {
        fs::remove_dir_all(dir)?;
    } else {
        fs::remove_file(dir)?;
    }
    Ok(())
}

/// Wait for a child process, killing it once `timeout` has passed.
/// Returns `None` on timeout.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> Result<Option<(ExitStatus, String, String)>> {
    // Drain the pipes while waiting so a chatty simulator cannot block.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() > timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            None => thread::sleep(poll_interval),
        }
    };

    let join = |handle: Option<thread::JoinHandle<String>>| {
        handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    };
    Ok(Some((status, join(stdout), join(stderr))))
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
