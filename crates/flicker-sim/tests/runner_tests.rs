//! Runner tests against fake simulators.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use flicker_sim::{result_path, run_simulator, Error, ResultSet, SimulationJob, SimulatorConfig};

const RESULT: &str = r#"HEADER
"PSFversion" "1.00"
TYPE
"sweep" FLOAT DOUBLE PROP( "units" "Hz" "grid" 3 )
"V2/Hz" FLOAT DOUBLE PROP( "units" "V**2/Hz" "grid" 3 )
SWEEP
"freq" "sweep"
TRACE
"out" "V2/Hz"
VALUE
"freq" 1
"out" 1e-16
"freq" 10
"out" 1e-17
END
"#;

/// Write an executable shell script standing in for the simulator.
fn fake_simulator(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-spectre");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn config(executable: &Path) -> SimulatorConfig {
    SimulatorConfig {
        executable: executable.display().to_string(),
        ..SimulatorConfig::default()
    }
}

fn job(dir: &Path) -> SimulationJob {
    SimulationJob::new(
        dir.join("resistor.scs"),
        dir.join("resistor.log"),
        dir.join("resistor.raw"),
    )
}

#[test]
fn test_failing_simulator() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path());
    let config = SimulatorConfig {
        executable: "false".to_string(),
        ..SimulatorConfig::default()
    };

    match run_simulator(&job, &config).unwrap_err() {
        Error::Simulation {
            command, log_file, ..
        } => {
            assert!(command.starts_with("false =log "));
            assert!(command.ends_with("resistor.scs"));
            assert_eq!(log_file, job.log_file);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_failure_captures_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_simulator(dir.path(), "echo 'ERROR (SFE-23): no such model'\nexit 3");

    match run_simulator(&job(dir.path()), &config(&exe)).unwrap_err() {
        Error::Simulation { stdout, status, .. } => {
            assert!(stdout.contains("SFE-23"));
            assert!(status.contains('3'));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_successful_run_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    // $6 is the result directory in the fixed argument shape.
    let script = format!(
        "mkdir -p \"$6\"\ncat > \"$6/pnoiseDC.pnoise\" <<'PSF'\n{}PSF\necho done",
        RESULT
    );
    let exe = fake_simulator(dir.path(), &script);
    let job = job(dir.path());

    let output = run_simulator(&job, &config(&exe)).unwrap();
    assert_eq!(output.stdout.trim(), "done");
    assert_eq!(output.results_dir, job.results_dir);

    let results = ResultSet::open(&result_path(&job.results_dir, "pnoiseDC", "pnoise")).unwrap();
    assert_eq!(results.sweep().values, vec![1.0, 10.0]);
    assert_eq!(results.signal("out").unwrap().samples.len(), 2);
}

#[test]
fn test_success_without_results() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_simulator(dir.path(), "exit 0");
    let job = job(dir.path());
    match run_simulator(&job, &config(&exe)).unwrap_err() {
        Error::MissingResults {
            results_dir,
            command,
            log_file,
        } => {
            assert_eq!(results_dir, job.results_dir);
            assert!(command.ends_with("resistor.scs"));
            assert_eq!(log_file, job.log_file);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_stale_results_are_not_reused() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path());
    fs::create_dir_all(&job.results_dir).unwrap();
    fs::write(result_path(&job.results_dir, "pnoiseDC", "pnoise"), RESULT).unwrap();

    // Exits cleanly without writing anything.
    let exe = fake_simulator(dir.path(), "exit 0");
    let err = run_simulator(&job, &config(&exe)).unwrap_err();
    assert!(matches!(err, Error::MissingResults { .. }));
    assert!(!result_path(&job.results_dir, "pnoiseDC", "pnoise").exists());
}

#[test]
fn test_timeout_kills_simulator() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_simulator(dir.path(), "sleep 10");
    let config = SimulatorConfig {
        timeout_secs: Some(0),
        ..config(&exe)
    };
    let job = job(dir.path());
    let err = run_simulator(&job, &config).unwrap_err();
    assert!(matches!(err, Error::Timeout { secs: 0, .. }));
    assert_eq!(err.log_file(), Some(job.log_file.as_path()));
}

#[test]
fn test_timeout_allows_fast_simulator() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_simulator(dir.path(), "mkdir -p \"$6\"");
    let config = SimulatorConfig {
        timeout_secs: Some(30),
        ..config(&exe)
    };
    assert!(run_simulator(&job(dir.path()), &config).is_ok());
}
