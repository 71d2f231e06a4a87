//! PSF ASCII parser.
//!
//! A swept PSF ASCII file has these sections, in order:
//!
//! ```text
//! HEADER   "key" value ...
//! TYPE     "name" FLOAT DOUBLE PROP( "units" "V" ... ) ...
//! SWEEP    "name" "type" PROP( "grid" 3 ... )
//! TRACE    "name" "type" ...
//! VALUE    "sweep" 1.0 "trace" 2.0 ... (one group per sweep point)
//! END
//! ```
//!
//! A `STRUCT( "field" FLOAT DOUBLE ... )` type describes record traces such
//! as per-instance noise contributions. Their values are parenthesized
//! number lists, kept as [`Composite`] rows.

use indexmap::IndexMap;
use num_complex::Complex64;

use super::lexer::{Lexer, SpannedToken, Token};
use super::types::{AxisScale, Composite, PropValue, Samples, Signal, Sweep, ValueKind};
use crate::error::{Error, Result};

pub(crate) type Props = IndexMap<String, PropValue>;

const SECTIONS: &[&str] = &["HEADER", "TYPE", "SWEEP", "TRACE", "VALUE", "END"];

#[derive(Debug, Clone)]
struct TypeDef {
    kind: Option<ValueKind>,
    words: Vec<String>,
    /// Field names of a `STRUCT` type, empty otherwise.
    fields: Vec<String>,
    props: Props,
}

impl TypeDef {
    fn is_struct(&self) -> bool {
        !self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    type_name: String,
    props: Props,
    line: usize,
}

/// Everything read from one file.
#[derive(Debug, Clone)]
pub(crate) struct Parsed {
    pub header: Props,
    pub sweep: Sweep,
    pub signals: IndexMap<String, Signal>,
    pub composites: IndexMap<String, Composite>,
}

pub(crate) fn parse(input: &str) -> Result<Parsed> {
    let tokens = Lexer::new(input).tokenize()?;
    Reader { tokens, pos: 0 }.parse()
}

struct Reader {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Reader {
    fn parse(mut self) -> Result<Parsed> {
        self.expect_section("HEADER")?;
        let header = self.parse_pairs()?;

        let mut types = IndexMap::new();
        if self.at_section("TYPE") {
            self.pos += 1;
            types = self.parse_types()?;
        }

        if !self.at_section("SWEEP") {
            return Err(Error::UnsupportedFormat(
                "result has no sweep (non-swept analyses are not supported)".to_string(),
            ));
        }
        self.pos += 1;
        let sweeps = self.parse_entries()?;
        let sweep_entry = match sweeps.as_slice() {
            [entry] => entry.clone(),
            [] => return Err(self.error("empty SWEEP section")),
            _ => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} sweeps (only one is supported)",
                    sweeps.len()
                )))
            }
        };

        let mut traces = Vec::new();
        if self.at_section("TRACE") {
            self.pos += 1;
            traces = self.parse_entries()?;
        }

        self.expect_section("VALUE")?;
        let (sweep_values, mut trace_values, mut trace_rows) =
            self.parse_values(&sweep_entry, &traces, &types)?;
        self.expect_section("END")?;

        let sweep_type = lookup_type(&types, &sweep_entry)?;
        let sweep = Sweep {
            name: sweep_entry.name.clone(),
            units: prop_str(&sweep_entry.props, "units")
                .or_else(|| prop_str(&sweep_type.props, "units"))
                .unwrap_or_default(),
            scale: prop_scale(&sweep_entry.props)
                .or_else(|| prop_scale(&sweep_type.props))
                .unwrap_or_default(),
            values: sweep_values,
        };

        let mut signals = IndexMap::new();
        let mut composites = IndexMap::new();
        for trace in &traces {
            let ty = lookup_type(&types, trace)?;
            if ty.is_struct() {
                let rows = trace_rows.shift_remove(&trace.name).unwrap_or_default();
                if rows.len() != sweep.len() {
                    return Err(Error::Misaligned {
                        signal: trace.name.clone(),
                        expected: sweep.len(),
                        actual: rows.len(),
                    });
                }
                composites.insert(
                    trace.name.clone(),
                    Composite {
                        name: trace.name.clone(),
                        fields: ty.fields.clone(),
                        rows,
                    },
                );
                continue;
            }

            let samples = trace_values
                .shift_remove(&trace.name)
                .unwrap_or(Samples::Real(Vec::new()));
            if samples.len() != sweep.len() {
                return Err(Error::Misaligned {
                    signal: trace.name.clone(),
                    expected: sweep.len(),
                    actual: samples.len(),
                });
            }

            signals.insert(
                trace.name.clone(),
                Signal {
                    name: trace.name.clone(),
                    units: prop_str(&ty.props, "units").unwrap_or_default(),
                    scale: prop_scale(&ty.props).unwrap_or_default(),
                    samples,
                },
            );
        }

        Ok(Parsed {
            header,
            sweep,
            signals,
            composites,
        })
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn at_section(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Word(w) if w == name)
    }

    fn at_any_section(&self) -> bool {
        matches!(self.peek(), Token::Word(w) if SECTIONS.contains(&w.as_str()))
            || *self.peek() == Token::Eof
    }

    fn expect_section(&mut self, name: &str) -> Result<()> {
        if self.at_section(name) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {:?}", name, self.peek())))
        }
    }

    fn expect_str(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Token::Str(s) => Ok(s),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected {}, found {:?}", what, other)))
            }
        }
    }

    fn expect_number(&mut self) -> Result<f64> {
        match self.next() {
            Token::Number(n) => Ok(n),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected a number, found {:?}", other)))
            }
        }
    }

    /// `"key" value` pairs up to the next section keyword.
    fn parse_pairs(&mut self) -> Result<Props> {
        let mut props = Props::new();
        while !self.at_any_section() {
            let key = self.expect_str("a property name")?;
            let value = match self.next() {
                Token::Str(s) => PropValue::Str(s),
                Token::Number(n) => PropValue::Number(n),
                other => {
                    self.pos -= 1;
                    return Err(self.error(format!("bad value for {}: {:?}", key, other)));
                }
            };
            props.insert(key, value);
        }
        Ok(props)
    }

    /// Optional `PROP( "key" value ... )`.
    fn parse_props(&mut self) -> Result<Props> {
        if !matches!(self.peek(), Token::Word(w) if w == "PROP") {
            return Ok(Props::new());
        }
        self.pos += 1;
        if self.next() != Token::LParen {
            self.pos -= 1;
            return Err(self.error("expected '(' after PROP"));
        }

        let mut props = Props::new();
        loop {
            match self.next() {
                Token::RParen => return Ok(props),
                Token::Str(key) => {
                    let value = match self.next() {
                        Token::Str(s) => PropValue::Str(s),
                        Token::Number(n) => PropValue::Number(n),
                        _ => {
                            self.pos -= 1;
                            return Err(self.error(format!("bad value for property {}", key)));
                        }
                    };
                    props.insert(key, value);
                }
                Token::Eof => return Err(self.error("unterminated PROP list")),
                other => {
                    self.pos -= 1;
                    return Err(self.error(format!("unexpected {:?} in PROP list", other)));
                }
            }
        }
    }

    fn parse_types(&mut self) -> Result<IndexMap<String, TypeDef>> {
        let mut types = IndexMap::new();
        while !self.at_any_section() {
            let name = self.expect_str("a type name")?;
            let words = self.parse_type_words();
            if words.is_empty() {
                return Err(self.error(format!("type {} has no kind", name)));
            }

            let fields = if *self.peek() == Token::LParen {
                if words.last().map(String::as_str) != Some("STRUCT") {
                    return Err(self.error(format!("unexpected '(' in type {}", name)));
                }
                let fields = self.parse_struct_fields(&name)?;
                if fields.is_empty() {
                    return Err(self.error(format!("struct type {} has no fields", name)));
                }
                fields
            } else {
                Vec::new()
            };

            let kind = if !fields.is_empty() {
                None
            } else if words.iter().any(|w| w == "COMPLEX") {
                Some(ValueKind::Complex)
            } else if words.iter().any(|w| w == "FLOAT" || w == "INT") {
                Some(ValueKind::Real)
            } else {
                None
            };
            let props = self.parse_props()?;
            types.insert(
                name,
                TypeDef {
                    kind,
                    words,
                    fields,
                    props,
                },
            );
        }
        Ok(types)
    }

    /// Kind keywords of a type, up to `PROP`, `(` or the next section.
    fn parse_type_words(&mut self) -> Vec<String> {
        let mut words = Vec::new();
        while let Token::Word(w) = self.peek() {
            if w == "PROP" || SECTIONS.contains(&w.as_str()) {
                break;
            }
            words.push(w.clone());
            self.pos += 1;
        }
        words
    }

    /// `( "field" FLOAT DOUBLE [PROP(...)] ... )` of a `STRUCT` type.
    /// Nested structs contribute `outer.inner` names.
    fn parse_struct_fields(&mut self, type_name: &str) -> Result<Vec<String>> {
        self.pos += 1;
        let mut fields = Vec::new();
        loop {
            match self.next() {
                Token::RParen => return Ok(fields),
                Token::Str(field) => {
                    let words = self.parse_type_words();
                    if words.is_empty() {
                        return Err(self.error(format!(
                            "field {} of {} has no kind",
                            field, type_name
                        )));
                    }
                    if *self.peek() == Token::LParen {
                        let inner = self.parse_struct_fields(type_name)?;
                        fields.extend(inner.into_iter().map(|f| format!("{}.{}", field, f)));
                    } else {
                        fields.push(field);
                    }
                    self.parse_props()?;
                }
                Token::Eof => return Err(self.error(format!("unterminated STRUCT {}", type_name))),
                other => {
                    self.pos -= 1;
                    return Err(self.error(format!(
                        "unexpected {:?} in STRUCT {}",
                        other, type_name
                    )));
                }
            }
        }
    }

    /// One record value: a parenthesized list of numbers, flattened.
    fn parse_row(&mut self, name: &str) -> Result<Vec<f64>> {
        if self.next() != Token::LParen {
            self.pos -= 1;
            return Err(self.error(format!("expected a (...) record for {}", name)));
        }
        let mut row = Vec::new();
        let mut depth = 1;
        while depth > 0 {
            match self.next() {
                Token::Number(n) => row.push(n),
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => return Err(self.error(format!("unterminated record for {}", name))),
                other => {
                    self.pos -= 1;
                    return Err(self.error(format!(
                        "unexpected {:?} in record for {}",
                        other, name
                    )));
                }
            }
        }
        Ok(row)
    }

    /// SWEEP and TRACE entries: `"name" "type" [PROP(...)]`.
    fn parse_entries(&mut self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        while !self.at_any_section() {
            let line = self.line();
            let name = self.expect_str("a signal name")?;
            if matches!(self.peek(), Token::Word(w) if w == "GROUP") {
                return Err(Error::UnsupportedFormat(format!("trace group {}", name)));
            }
            let type_name = self.expect_str("a type name")?;
            let props = self.parse_props()?;
            entries.push(Entry {
                name,
                type_name,
                props,
                line,
            });
        }
        Ok(entries)
    }

    fn parse_values(
        &mut self,
        sweep: &Entry,
        traces: &[Entry],
        types: &IndexMap<String, TypeDef>,
    ) -> Result<(Vec<f64>, IndexMap<String, Samples>, IndexMap<String, Vec<Vec<f64>>>)> {
        let mut sweep_values = Vec::new();
        let mut trace_values = IndexMap::new();
        let mut trace_rows: IndexMap<String, Vec<Vec<f64>>> = IndexMap::new();
        for trace in traces {
            let ty = lookup_type(types, trace)?;
            if ty.is_struct() {
                trace_rows.insert(trace.name.clone(), Vec::new());
                continue;
            }
            let samples = match ty.kind {
                Some(ValueKind::Complex) => Samples::Complex(Vec::new()),
                _ => Samples::Real(Vec::new()),
            };
            trace_values.insert(trace.name.clone(), samples);
        }

        while !self.at_any_section() {
            let name = self.expect_str("a signal name")?;
            if name == sweep.name {
                sweep_values.push(self.expect_number()?);
                continue;
            }
            if let Some(rows) = trace_rows.get_mut(&name) {
                rows.push(self.parse_row(&name)?);
                continue;
            }

            let Some(samples) = trace_values.get_mut(&name) else {
                return Err(self.error(format!("value for undeclared signal {}", name)));
            };
            match samples {
                Samples::Real(values) => values.push(self.expect_number()?),
                Samples::Complex(values) => {
                    if self.next() != Token::LParen {
                        self.pos -= 1;
                        return Err(self.error(format!("expected (re im) for {}", name)));
                    }
                    let re = self.expect_number()?;
                    let im = self.expect_number()?;
                    if self.next() != Token::RParen {
                        self.pos -= 1;
                        return Err(self.error(format!("expected ')' after {} value", name)));
                    }
                    values.push(Complex64::new(re, im));
                }
            }
        }

        Ok((sweep_values, trace_values, trace_rows))
    }
}

fn lookup_type<'a>(types: &'a IndexMap<String, TypeDef>, entry: &Entry) -> Result<&'a TypeDef> {
    let ty = types.get(&entry.type_name).ok_or_else(|| Error::Parse {
        line: entry.line,
        message: format!("{} has undeclared type {}", entry.name, entry.type_name),
    })?;
    if ty.kind.is_none() && !ty.is_struct() {
        return Err(Error::UnsupportedFormat(format!(
            "{} has type {} ({})",
            entry.name,
            entry.type_name,
            ty.words.join(" ")
        )));
    }
    Ok(ty)
}

fn prop_str(props: &Props, key: &str) -> Option<String> {
    props.get(key).and_then(PropValue::as_str).map(str::to_string)
}

fn prop_scale(props: &Props) -> Option<AxisScale> {
    props
        .get("grid")
        .and_then(PropValue::as_number)
        .map(AxisScale::from_grid)
}
