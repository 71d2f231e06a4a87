//! Parameter extraction from documented parameter blocks.
//!
//! A parameter block holds one assignment per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! freq = 2**17 "Hz"        -- drive frequency
//! ampl = 100mV             -- drive amplitude
//! period = 1/freq "s"      -- period of the drive
//! ```
//!
//! The value is either a literal quantity (`100mV`, `1kOhm`, `64`) or an
//! expression over parameters defined on earlier lines, optionally followed
//! by its units in double quotes. Anything after `--` is the description.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::expression::{parse_expression, EvalContext};
use crate::units::Quantity;

/// Parameter overrides by name. Values use the same grammar as the block.
pub type Overrides = IndexMap<String, String>;

/// One extracted parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    quantity: Quantity,
    description: Option<String>,
    derivation: Option<String>,
    line: usize,
    overridden: bool,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Expression the value was computed from, if it is not a literal.
    pub fn derivation(&self) -> Option<&str> {
        self.derivation.as_deref()
    }

    pub fn is_derived(&self) -> bool {
        self.derivation.is_some()
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Line of the parameter block that defined it (1-based).
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Ordered set of extracted parameters. Never mutated after extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: IndexMap<String, Parameter>,
}

impl ParameterSet {
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    pub fn quantity(&self, name: &str) -> Result<&Quantity> {
        self.get(name)
            .map(Parameter::quantity)
            .ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    pub fn value(&self, name: &str) -> Result<f64> {
        self.quantity(name).map(Quantity::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Extract the parameters of a documented block.
pub fn extract(doc: &str) -> Result<ParameterSet> {
    extract_with_overrides(doc, &Overrides::new())
}

/// Extract the parameters of a documented block, replacing some values.
///
/// An override replaces the value of a parameter before anything later in
/// the block is derived from it. Overrides without units take the units the
/// block declares for that parameter.
pub fn extract_with_overrides(doc: &str, overrides: &Overrides) -> Result<ParameterSet> {
    if let Some(unknown) = overrides
        .keys()
        .find(|name| !declares(doc, name.as_str()))
    {
        return Err(Error::UnknownOverride(unknown.clone()));
    }

    let mut params = IndexMap::new();
    let mut ctx = EvalContext::new();

    for (index, raw) in doc.lines().enumerate() {
        let line = index + 1;
        let Some(assignment) = split_assignment(raw).map_err(|message| {
            Error::ParameterExtraction { line, message }
        })?
        else {
            continue;
        };

        if params.contains_key(assignment.name) {
            return Err(Error::DuplicateParameter(assignment.name.to_string()));
        }

        let parameter = match overrides.get(assignment.name) {
            Some(text) => {
                check_declared(&assignment.value, &ctx).map_err(|e| {
                    Error::ParameterExtraction {
                        line,
                        message: e.to_string(),
                    }
                })?;
                let value = split_value(text).map_err(|message| Error::ParameterExtraction {
                    line,
                    message: format!("override of {}: {}", assignment.name, message),
                })?;
                let default_units = declared_units(&assignment.value);
                let (quantity, derivation) = evaluate(&value, Some(default_units), &ctx)
                    .map_err(|e| Error::ParameterExtraction {
                        line,
                        message: format!("override of {}: {}", assignment.name, e),
                    })?;
                log::debug!("{} overridden with {}", assignment.name, text);
                Parameter {
                    name: assignment.name.to_string(),
                    quantity,
                    description: assignment.description.map(str::to_string),
                    derivation,
                    line,
                    overridden: true,
                }
            }
            None => {
                let (quantity, derivation) = evaluate(&assignment.value, None, &ctx)
                    .map_err(|e| Error::ParameterExtraction {
                        line,
                        message: e.to_string(),
                    })?;
                Parameter {
                    name: assignment.name.to_string(),
                    quantity,
                    description: assignment.description.map(str::to_string),
                    derivation,
                    line,
                    overridden: false,
                }
            }
        };

        ctx.set(&parameter.name, parameter.quantity.value());
        params.insert(parameter.name.clone(), parameter);
    }

    Ok(ParameterSet { params })
}

/// Right-hand side of an assignment before evaluation.
#[derive(Debug, Clone, PartialEq)]
enum Value<'a> {
    Literal(Quantity),
    Expression { text: &'a str, units: Option<&'a str> },
}

struct Assignment<'a> {
    name: &'a str,
    value: Value<'a>,
    description: Option<&'a str>,
}

/// Split one line of a block. Blank and comment lines yield `None`.
fn split_assignment(raw: &str) -> std::result::Result<Option<Assignment<'_>>, String> {
    let text = raw.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let (body, description) = match text.split_once("--") {
        Some((body, description)) => {
            let description = description.trim();
            (body, (!description.is_empty()).then_some(description))
        }
        None => (text, None),
    };

    let (name, value) = body
        .split_once('=')
        .ok_or_else(|| format!("expected `name = value`, found '{}'", text))?;

    let name = name.trim();
    if !is_identifier(name) {
        return Err(format!("invalid parameter name '{}'", name));
    }

    let value = split_value(value)?;
    Ok(Some(Assignment {
        name,
        value,
        description,
    }))
}

fn split_value(value: &str) -> std::result::Result<Value<'_>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("missing value".to_string());
    }

    if let Some(unquoted) = value.strip_suffix('"') {
        let (text, units) = unquoted
            .rsplit_once('"')
            .ok_or_else(|| format!("unbalanced quote in '{}'", value))?;
        let text = text.trim();
        if text.is_empty() {
            return Err("missing value before units".to_string());
        }
        if text.contains('"') {
            return Err(format!("unexpected quote in '{}'", value));
        }
        return Ok(Value::Expression {
            text,
            units: Some(units.trim()),
        });
    }

    if value.contains('"') {
        return Err(format!("units must be quoted at the end of the value: '{}'", value));
    }

    match Quantity::parse(value) {
        Ok(quantity) => Ok(Value::Literal(quantity)),
        Err(_) => Ok(Value::Expression { text: value, units: None }),
    }
}

fn declared_units<'a>(value: &'a Value<'_>) -> &'a str {
    match value {
        Value::Literal(quantity) => quantity.units(),
        Value::Expression { units, .. } => units.unwrap_or(""),
    }
}

/// Evaluate a value, returning the quantity and its derivation if any.
fn evaluate(
    value: &Value<'_>,
    default_units: Option<&str>,
    ctx: &EvalContext,
) -> Result<(Quantity, Option<String>)> {
    let (quantity, derivation) = match value {
        Value::Literal(quantity) => (quantity.clone(), None),
        Value::Expression { text, units } => {
            let expr = parse_expression(text)?;
            let number = expr.eval(ctx)?;
            let quantity = Quantity::new(number, units.unwrap_or(""));
            let derivation = (!expr.names().is_empty()).then(|| text.to_string());
            (quantity, derivation)
        }
    };

    if !quantity.value().is_finite() {
        return Err(Error::InvalidQuantity(format!(
            "value is not finite: {}",
            quantity.value()
        )));
    }

    let quantity = match default_units {
        Some(units) if quantity.units().is_empty() => quantity.with_units(units),
        _ => quantity,
    };
    Ok((quantity, derivation))
}

/// Check that an overridden value would have been valid on its own: it
/// parses and refers only to parameters defined above it.
fn check_declared(value: &Value<'_>, ctx: &EvalContext) -> Result<()> {
    let Value::Expression { text, .. } = value else {
        return Ok(());
    };
    let expr = parse_expression(text)?;
    match expr.names().into_iter().find(|name| ctx.get(name).is_none()) {
        Some(name) => Err(Error::UnknownName(name)),
        None => Ok(()),
    }
}

fn declares(doc: &str, name: &str) -> bool {
    doc.lines().any(|raw| {
        let text = raw.trim();
        !text.starts_with('#')
            && text
                .split_once('=')
                .is_some_and(|(lhs, _)| lhs.trim() == name)
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = r#"
        # drive
        freq = 2**17 "Hz"     -- drive frequency
        ampl = 100mV          -- drive amplitude
        period = 1/freq "s"   -- period of the drive

        pts = 20              -- points per decade
        fstop = freq/2 "Hz"   -- stop frequency of the noise sweep
    "#;

    fn overrides(pairs: &[(&str, &str)]) -> Overrides {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_block() {
        let params = extract(BLOCK).unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(
            params.names().collect::<Vec<_>>(),
            vec!["freq", "ampl", "period", "pts", "fstop"]
        );

        let freq = params.get("freq").unwrap();
        assert_eq!(freq.quantity().value(), 131072.0);
        assert_eq!(freq.quantity().units(), "Hz");
        assert_eq!(freq.description(), Some("drive frequency"));
        assert!(!freq.is_derived());

        let ampl = params.quantity("ampl").unwrap();
        assert_eq!(ampl.value(), 0.1);
        assert_eq!(ampl.units(), "V");

        let period = params.get("period").unwrap();
        assert_eq!(period.quantity().value(), 1.0 / 131072.0);
        assert_eq!(period.quantity().units(), "s");
        assert_eq!(period.derivation(), Some("1/freq"));
        assert_eq!(period.line(), 5);

        assert_eq!(params.value("fstop").unwrap(), 65536.0);
        assert_eq!(params.quantity("pts").unwrap().units(), "");
    }

    #[test]
    fn test_rejects_malformed_line() {
        let err = extract("freq = 2**17 \"Hz\"\nthis is not a parameter\n").unwrap_err();
        assert!(matches!(err, Error::ParameterExtraction { line: 2, .. }));

        let err = extract("freq 131kHz -- missing equals").unwrap_err();
        assert!(matches!(err, Error::ParameterExtraction { line: 1, .. }));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(extract("2freq = 1").is_err());
        assert!(extract("freq =").is_err());
        assert!(extract("freq = 1kHz \"Hz\"").is_err());
        assert!(extract("freq = \"Hz").is_err());
        assert!(extract("freq = 1 \"Hz\" extra").is_err());
        assert!(extract("x = 1/0").is_err());
    }

    #[test]
    fn test_rejects_forward_reference() {
        let err = extract("period = 1/freq \"s\"\nfreq = 1kHz\n").unwrap_err();
        assert!(matches!(err, Error::ParameterExtraction { line: 1, .. }));
    }

    #[test]
    fn test_rejects_duplicate() {
        let err = extract("a = 1\na = 2\n").unwrap_err();
        assert!(matches!(err, Error::DuplicateParameter(ref n) if n == "a"));
    }

    #[test]
    fn test_override_propagates_to_derived() {
        let params = extract_with_overrides(BLOCK, &overrides(&[("freq", "1MHz")])).unwrap();
        assert_eq!(params.value("freq").unwrap(), 1e6);
        assert_eq!(params.value("period").unwrap(), 1e-6);
        assert_eq!(params.value("fstop").unwrap(), 5e5);
        assert!(params.get("freq").unwrap().is_overridden());
        assert!(!params.get("period").unwrap().is_overridden());
    }

    #[test]
    fn test_override_inherits_units() {
        let params = extract_with_overrides(BLOCK, &overrides(&[("ampl", "0.5")])).unwrap();
        let ampl = params.quantity("ampl").unwrap();
        assert_eq!(ampl.value(), 0.5);
        assert_eq!(ampl.units(), "V");

        let params = extract_with_overrides(BLOCK, &overrides(&[("pts", "2*5")])).unwrap();
        assert_eq!(params.value("pts").unwrap(), 10.0);
    }

    #[test]
    fn test_override_does_not_hide_broken_default() {
        let block = "freq = 1kHz\nfstop = freq/ \"Hz\"\n";
        let err = extract_with_overrides(block, &overrides(&[("fstop", "10Hz")])).unwrap_err();
        assert!(matches!(err, Error::ParameterExtraction { line: 2, .. }));

        let block = "freq = 1kHz\nfstop = fred/2 \"Hz\"\n";
        let err = extract_with_overrides(block, &overrides(&[("fstop", "10Hz")])).unwrap_err();
        assert!(matches!(err, Error::ParameterExtraction { line: 2, .. }));

        let params =
            extract_with_overrides(BLOCK, &overrides(&[("fstop", "10Hz")])).unwrap();
        assert_eq!(params.value("fstop").unwrap(), 10.0);
    }

    #[test]
    fn test_unknown_override() {
        let err = extract_with_overrides(BLOCK, &overrides(&[("fred", "1")])).unwrap_err();
        assert!(matches!(err, Error::UnknownOverride(ref n) if n == "fred"));
    }

    #[test]
    fn test_missing_parameter() {
        let params = extract(BLOCK).unwrap();
        assert!(matches!(
            params.value("harms"),
            Err(Error::MissingParameter(_))
        ));
    }
}
