//! Reader for simulator results in PSF ASCII format.
//!
//! Each analysis writes its results to `<result dir>/<analysis>.<kind>`,
//! for example `pnoise.raw/pnoiseDC.pnoise`. A result set exposes the swept
//! variable and the named signals recorded along it.

mod lexer;
mod reader;
mod types;

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Error, Result};

pub use types::{AxisScale, Composite, PropValue, Samples, Signal, Sweep, ValueKind};

/// Path of the result file an analysis writes.
pub fn result_path(results_dir: &Path, analysis: &str, kind: &str) -> PathBuf {
    results_dir.join(format!("{}.{}", analysis, kind))
}

/// Read-only view over one result file.
#[derive(Debug, Clone)]
pub struct ResultSet {
    source: Option<PathBuf>,
    header: IndexMap<String, PropValue>,
    sweep: Sweep,
    signals: IndexMap<String, Signal>,
    composites: IndexMap<String, Composite>,
}

impl ResultSet {
    /// Read and parse a result file.
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut results = Self::parse(&text)?;
        results.source = Some(path.to_path_buf());
        log::debug!(
            "read {} signals over {} points from {}",
            results.signals.len(),
            results.sweep.len(),
            path.display()
        );
        Ok(results)
    }

    /// Parse result text.
    pub fn parse(text: &str) -> Result<Self> {
        let parsed = reader::parse(text)?;
        Ok(Self {
            source: None,
            header: parsed.header,
            sweep: parsed.sweep,
            signals: parsed.signals,
            composites: parsed.composites,
        })
    }

    /// File the results were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn header(&self, key: &str) -> Option<&PropValue> {
        self.header.get(key)
    }

    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    /// Look up a signal by name. Composite traces are not signals.
    pub fn signal(&self, name: &str) -> Result<&Signal> {
        if let Some(composite) = self.composites.get(name) {
            return Err(Error::UnsupportedFormat(format!(
                "{} is a composite trace ({})",
                name,
                composite.fields.join(", ")
            )));
        }
        self.signals
            .get(name)
            .ok_or_else(|| Error::SignalNotFound {
                name: name.to_string(),
                available: self.signals.keys().cloned().collect(),
            })
    }

    pub fn composite(&self, name: &str) -> Option<&Composite> {
        self.composites.get(name)
    }

    pub fn signal_names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOISE: &str = r#"HEADER
"PSFversion" "1.00"
"simulator" "spectre"
"analysis type" "pnoise"
"PSF sweeps" 1
"PSF traces" 2
TYPE
"sweep" FLOAT DOUBLE PROP(
"key" "sweep"
)
"V2/Hz" FLOAT DOUBLE PROP(
"key" "node"
"units" "V**2/Hz"
"grid" 3
)
"A2/Hz" FLOAT DOUBLE PROP(
"units" "A**2/Hz"
)
SWEEP
"freq" "sweep" PROP(
"units" "Hz"
"grid" 3
)
TRACE
"out" "V2/Hz"
"in" "A2/Hz"
VALUE
"freq" 1.000000000000000e+00
"out" 4.0e-16
"in" 1.0e-20
"freq" 1.000000000000000e+01
"out" 4.0e-17
"in" 1.0e-21
"freq" 1.000000000000000e+02
"out" 4.0e-18
"in" 1.0e-22
END
"#;

    #[test]
    fn test_parse_swept_noise() {
        let results = ResultSet::parse(NOISE).unwrap();

        let sweep = results.sweep();
        assert_eq!(sweep.name, "freq");
        assert_eq!(sweep.units, "Hz");
        assert_eq!(sweep.scale, AxisScale::Log);
        assert_eq!(sweep.values, vec![1.0, 10.0, 100.0]);

        let out = results.signal("out").unwrap();
        assert_eq!(out.units, "V**2/Hz");
        assert_eq!(out.scale, AxisScale::Log);
        assert_eq!(out.samples, Samples::Real(vec![4.0e-16, 4.0e-17, 4.0e-18]));

        let input = results.signal("in").unwrap();
        assert_eq!(input.scale, AxisScale::Linear);
        assert_eq!(input.samples.len(), sweep.len());

        assert_eq!(results.signal_names().collect::<Vec<_>>(), vec!["out", "in"]);
        assert_eq!(
            results.header("simulator"),
            Some(&PropValue::Str("spectre".to_string()))
        );
        assert_eq!(results.header("PSF traces"), Some(&PropValue::Number(2.0)));
    }

    #[test]
    fn test_signal_not_found() {
        let results = ResultSet::parse(NOISE).unwrap();
        let err = results.signal("vout").unwrap_err();
        match err {
            Error::SignalNotFound { name, available } => {
                assert_eq!(name, "vout");
                assert_eq!(available, vec!["out".to_string(), "in".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_complex_values() {
        let text = r#"HEADER
"PSFversion" "1.00"
TYPE
"sweep" FLOAT DOUBLE PROP( "units" "Hz" )
"V" COMPLEX DOUBLE PROP( "units" "V" )
SWEEP
"freq" "sweep"
TRACE
"out" "V"
VALUE
"freq" 1
"out" (3 4)
"freq" 2
"out" (0 -2)
END
"#;
        let results = ResultSet::parse(text).unwrap();
        assert_eq!(results.sweep().units, "Hz");
        assert_eq!(results.sweep().scale, AxisScale::Linear);

        let out = results.signal("out").unwrap();
        assert_eq!(out.samples.kind(), ValueKind::Complex);
        assert_eq!(out.samples.magnitudes(), vec![5.0, 2.0]);
    }

    #[test]
    fn test_misaligned_trace() {
        let text = NOISE.replace("\"in\" 1.0e-22\n", "");
        let err = ResultSet::parse(&text).unwrap_err();
        assert!(matches!(
            err,
            Error::Misaligned { ref signal, expected: 3, actual: 2 } if signal == "in"
        ));
    }

    #[test]
    fn test_non_swept_is_unsupported() {
        let text = r#"HEADER
"PSFversion" "1.00"
TYPE
"V" FLOAT DOUBLE PROP( "units" "V" )
VALUE
"out" "V" 1.5
END
"#;
        assert!(matches!(
            ResultSet::parse(text),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_group_is_unsupported() {
        let text = NOISE.replace("\"out\" \"V2/Hz\"\n", "\"grp\" GROUP 1\n\"out\" \"V2/Hz\"\n");
        assert!(matches!(
            ResultSet::parse(&text),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_malformed_reports_line() {
        let text = NOISE.replace("\"out\" 4.0e-17", "\"out\" bogus");
        assert!(matches!(
            ResultSet::parse(&text),
            Err(Error::Parse { line: 32, .. })
        ));
        assert!(matches!(
            ResultSet::parse("not a result file"),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_undeclared_signal_value() {
        let text = NOISE.replace("\"in\" 1.0e-20", "\"nope\" 1.0e-20");
        assert!(matches!(ResultSet::parse(&text), Err(Error::Parse { .. })));
    }

    const CONTRIBUTIONS: &str = r#"HEADER
"PSFversion" "1.00"
"analysis type" "pnoise"
TYPE
"sweep" FLOAT DOUBLE PROP( "units" "Hz" "grid" 3 )
"V2/Hz" FLOAT DOUBLE PROP( "units" "V**2/Hz" )
"instance" STRUCT(
"total" FLOAT DOUBLE PROP( "units" "V**2/Hz" )
"thermal" FLOAT DOUBLE
"flicker" FLOAT DOUBLE
) PROP( "key" "instance" )
SWEEP
"freq" "sweep"
TRACE
"out" "V2/Hz"
"Rdc" "instance"
VALUE
"freq" 1
"out" 5.0e-16
"Rdc" (5.0e-16 1.0e-16 4.0e-16)
"freq" 10
"out" 1.4e-16
"Rdc" (1.4e-16 1.0e-16 4.0e-17)
END
"#;

    #[test]
    fn test_struct_traces_keep_signals_readable() {
        let results = ResultSet::parse(CONTRIBUTIONS).unwrap();

        let out = results.signal("out").unwrap();
        assert_eq!(out.samples, Samples::Real(vec![5.0e-16, 1.4e-16]));
        assert_eq!(results.signal_names().collect::<Vec<_>>(), vec!["out"]);

        let rdc = results.composite("Rdc").unwrap();
        assert_eq!(rdc.fields, vec!["total", "thermal", "flicker"]);
        assert_eq!(rdc.rows.len(), 2);
        assert_eq!(rdc.rows[1], vec![1.4e-16, 1.0e-16, 4.0e-17]);

        assert!(matches!(
            results.signal("Rdc"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_struct_trace_misaligned() {
        let text = CONTRIBUTIONS.replace("\"Rdc\" (1.4e-16 1.0e-16 4.0e-17)\n", "");
        assert!(matches!(
            ResultSet::parse(&text),
            Err(Error::Misaligned { ref signal, expected: 2, actual: 1 }) if signal == "Rdc"
        ));
    }

    #[test]
    fn test_struct_record_must_be_parenthesized() {
        let text = CONTRIBUTIONS.replace("(5.0e-16 1.0e-16 4.0e-16)", "5.0e-16");
        assert!(matches!(ResultSet::parse(&text), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_sweep_first_difference() {
        let sweep = |values: Vec<f64>| Sweep {
            name: "freq".to_string(),
            units: "Hz".to_string(),
            scale: AxisScale::Log,
            values,
        };
        let a = sweep(vec![1.0, 10.0, 100.0]);
        assert_eq!(a.first_difference(&sweep(vec![1.0, 10.0, 100.0])), None);
        assert_eq!(a.first_difference(&sweep(vec![1.0, 10.0 + 1e-12, 100.0])), None);
        assert_eq!(a.first_difference(&sweep(vec![1.0, 20.0, 100.0])), Some(1));
    }

    #[test]
    fn test_result_path() {
        assert_eq!(
            result_path(Path::new("pnoise.raw"), "pnoiseDC", "pnoise"),
            PathBuf::from("pnoise.raw/pnoiseDC.pnoise")
        );
    }
}
