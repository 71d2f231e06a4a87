//! Physical quantities and SI scale factor handling.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// SI scale factors and their decimal exponents.
///
/// Unlike SPICE, scale factors are case sensitive: `M` is mega and `m` is milli.
const SCALE_FACTORS: &[(char, i32)] = &[
    ('Y', 24),
    ('Z', 21),
    ('E', 18),
    ('P', 15),
    ('T', 12),
    ('G', 9),
    ('M', 6),
    ('k', 3),
    ('m', -3),
    ('u', -6),
    ('µ', -6),
    ('n', -9),
    ('p', -12),
    ('f', -15),
    ('a', -18),
    ('z', -21),
    ('y', -24),
];

/// Look up the decimal exponent of an SI scale factor.
pub fn scale_exponent(c: char) -> Option<i32> {
    SCALE_FACTORS
        .iter()
        .find(|(factor, _)| *factor == c)
        .map(|(_, exp)| *exp)
}

fn scale_prefix(exponent: i32) -> &'static str {
    match exponent {
        24 => "Y",
        21 => "Z",
        18 => "E",
        15 => "P",
        12 => "T",
        9 => "G",
        6 => "M",
        3 => "k",
        -3 => "m",
        -6 => "u",
        -9 => "n",
        -12 => "p",
        -15 => "f",
        -18 => "a",
        -21 => "z",
        -24 => "y",
        _ => "",
    }
}

/// How a quantity is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    /// SI scale factor prefix: `131.07 kHz`.
    #[default]
    Si,
    /// Mantissa with an exponent that is a multiple of three: `131.07e3 Hz`.
    Engineering,
    /// Normalized mantissa: `1.3107e5 Hz`.
    Scientific,
}

/// A numeric value with its units.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    value: f64,
    units: String,
}

impl Quantity {
    pub fn new(value: f64, units: impl Into<String>) -> Self {
        Self {
            value,
            units: units.into(),
        }
    }

    pub fn unitless(value: f64) -> Self {
        Self::new(value, "")
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// Replace the units, keeping the value.
    pub fn with_units(self, units: impl Into<String>) -> Self {
        Self::new(self.value, units)
    }

    /// Parse a literal such as `131.072kHz`, `100 mV`, `1e-12` or `64`.
    ///
    /// A single scale factor character directly after the number is always
    /// taken as a scale factor, so `1m` is 1e-3 with no units.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (mantissa, exponent, rest) =
            split_number(s).ok_or_else(|| Error::InvalidQuantity(s.to_string()))?;

        let rest = rest.trim_start();
        let mut chars = rest.chars();
        let (scale, units) = match chars.next() {
            Some(c) => match scale_exponent(c) {
                Some(exp) => (exp, chars.as_str()),
                None => (0, rest),
            },
            None => (0, ""),
        };

        if !is_valid_units(units) {
            return Err(Error::InvalidQuantity(s.to_string()));
        }

        // Shift the exponent textually so the decimal value is rounded once.
        let value: f64 = format!("{}e{}", mantissa, exponent + scale)
            .parse()
            .map_err(|_| Error::InvalidQuantity(s.to_string()))?;

        Ok(Self::new(value, units))
    }

    /// Render the value with full precision in engineering form and no units.
    ///
    /// This is the form written into netlists: `131072` becomes `131.072e3`
    /// and `0.1` becomes `100e-3`. The text parses back to the identical value.
    pub fn engineering(&self) -> String {
        engineering_digits(self.value)
    }

    /// Render for humans with the given number of digits after the decimal point.
    pub fn render(&self, notation: Notation, precision: usize) -> String {
        format_value(self.value, &self.units, notation, precision)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Notation::Si, 4))
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split a leading decimal number into mantissa text, exponent and the rest.
fn split_number(s: &str) -> Option<(&str, i32, &str)> {
    let bytes = s.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }
    let digits_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if !s[digits_start..pos].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let mantissa = &s[..pos];

    // An exponent only counts when digits follow, so `1E` stays exa.
    let mut exponent = 0;
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut end = pos + 1;
        if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
            end += 1;
        }
        let exp_digits = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > exp_digits {
            exponent = s[pos + 1..end].parse().ok()?;
            pos = end;
        }
    }

    Some((mantissa, exponent, &s[pos..]))
}

fn is_valid_units(units: &str) -> bool {
    match units.chars().next() {
        None => true,
        Some(first) => {
            (first.is_alphabetic() || matches!(first, '%' | '°' | 'Ω'))
                && units
                    .chars()
                    .all(|c| !c.is_whitespace() && !matches!(c, '"' | '=' | '#' | '+' | ','))
        }
    }
}

fn engineering_digits(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }

    // `{:e}` yields the shortest text that round-trips.
    let sci = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return format!("{}", value);
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return format!("{}", value);
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let eng_exp = exponent.div_euclid(3) * 3;
    let int_len = (exponent - eng_exp) as usize + 1;

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    if digits.len() > int_len {
        out.push_str(&digits[..int_len]);
        out.push('.');
        out.push_str(&digits[int_len..]);
    } else {
        out.push_str(&format!("{:0<width$}", digits, width = int_len));
    }
    if eng_exp != 0 {
        out.push_str(&format!("e{}", eng_exp));
    }
    out
}

/// Format a value with units in the requested notation.
pub fn format_value(value: f64, units: &str, notation: Notation, precision: usize) -> String {
    let number = match notation {
        _ if value == 0.0 => "0".to_string(),
        _ if !value.is_finite() => format!("{}", value),
        Notation::Scientific => format!("{:.*e}", precision, value),
        Notation::Engineering => {
            let (scaled, exp) = scale_to_engineering(value, precision);
            let mantissa = trim_zeros(format!("{:.*}", precision, scaled));
            if exp == 0 {
                mantissa
            } else {
                format!("{}e{}", mantissa, exp)
            }
        }
        Notation::Si => {
            let (scaled, exp) = scale_to_engineering(value, precision);
            let prefix = scale_prefix(exp);
            if prefix.is_empty() && exp != 0 {
                // Beyond the named prefixes.
                format!("{:.*e}", precision, value)
            } else {
                let mantissa = trim_zeros(format!("{:.*}", precision, scaled));
                return if units.is_empty() {
                    format!("{}{}", mantissa, prefix)
                } else {
                    format!("{} {}{}", mantissa, prefix, units)
                };
            }
        }
    };

    if units.is_empty() {
        number
    } else {
        format!("{} {}", number, units)
    }
}

/// Scale a value into [1, 1000) with an exponent that is a multiple of three.
fn scale_to_engineering(value: f64, precision: usize) -> (f64, i32) {
    let mut exp = (value.abs().log10() / 3.0).floor() as i32 * 3;
    let mut scaled = value / 10f64.powi(exp);

    // Rounding to the requested precision may carry into the next decade group.
    let rounded: f64 = format!("{:.*}", precision, scaled.abs())
        .parse()
        .unwrap_or(scaled.abs());
    if rounded >= 1000.0 {
        exp += 3;
        scaled = value / 10f64.powi(exp);
    }
    (scaled, exp)
}

fn trim_zeros(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
