//! Types for simulation results.

use num_complex::Complex64;

/// Preferred scaling of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl AxisScale {
    /// Interpret a PSF `grid` property. Grid 3 is logarithmic.
    pub fn from_grid(grid: f64) -> Self {
        if grid == 3.0 {
            AxisScale::Log
        } else {
            AxisScale::Linear
        }
    }

    pub fn is_log(self) -> bool {
        self == AxisScale::Log
    }
}

/// A property value from a `PROP(...)` list or the header.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Number(f64),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            PropValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            PropValue::Str(_) => None,
        }
    }
}

/// Kind of the values a type describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Real,
    Complex,
}

/// Samples of one signal, aligned with the sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Real(v) => v.len(),
            Samples::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Samples::Real(_) => ValueKind::Real,
            Samples::Complex(_) => ValueKind::Complex,
        }
    }

    /// Real samples as they are, complex samples by magnitude.
    pub fn magnitudes(&self) -> Vec<f64> {
        match self {
            Samples::Real(v) => v.clone(),
            Samples::Complex(v) => v.iter().map(|c| c.norm()).collect(),
        }
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            Samples::Real(v) => Some(v),
            Samples::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&[Complex64]> {
        match self {
            Samples::Complex(v) => Some(v),
            Samples::Real(_) => None,
        }
    }
}

/// The swept independent variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub name: String,
    pub units: String,
    pub scale: AxisScale,
    pub values: Vec<f64>,
}

impl Sweep {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first point where two sweeps of equal length differ by
    /// more than a relative `1e-9`.
    pub fn first_difference(&self, other: &Sweep) -> Option<usize> {
        self.values
            .iter()
            .zip(&other.values)
            .position(|(a, b)| (a - b).abs() > 1e-9 * a.abs().max(b.abs()))
    }
}

/// A named dependent signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub units: String,
    pub scale: AxisScale,
    pub samples: Samples,
}

/// A trace of records, such as the per-instance noise contributions of a
/// noise analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub name: String,
    pub fields: Vec<String>,
    /// One row per sweep point. Complex fields contribute two numbers.
    pub rows: Vec<Vec<f64>>,
}
