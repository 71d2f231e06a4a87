//! Recursive-descent parser for parameter expressions.

use std::f64::consts::PI;

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};
use crate::units::scale_exponent;

/// Parse an arithmetic expression from a string.
pub fn parse_expression(input: &str) -> Result<Expr> {
    let mut parser = ExprParser::new(input);
    parser.parse().map_err(Error::InvalidExpression)
}

/// Cursor over the expression text.
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(&mut self) -> std::result::Result<Expr, String> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err("empty expression".to_string());
        }
        let expr = self.parse_additive()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            Err(format!(
                "unexpected text at position {}: '{}'",
                self.pos,
                &self.input[self.pos..]
            ))
        } else {
            Ok(expr)
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn check_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn parse_additive(&mut self) -> std::result::Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;

        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> std::result::Result<Expr, String> {
        let mut left = self.parse_power()?;

        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') if !self.check_str("**") => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> std::result::Result<Expr, String> {
        let base = self.parse_unary()?;

        self.skip_whitespace();
        if self.peek() == Some('^') || self.check_str("**") {
            if self.peek() == Some('*') {
                self.advance();
            }
            self.advance();
            let exp = self.parse_unary_power()?; // Right associative
            Ok(Expr::BinaryOp {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exp),
            })
        } else {
            Ok(base)
        }
    }

    /// Exponents may carry their own sign: `10**-3`.
    fn parse_unary_power(&mut self) -> std::result::Result<Expr, String> {
        self.skip_whitespace();
        if self.peek() == Some('-') {
            self.advance();
            let operand = self.parse_power()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_power()
    }

    fn parse_unary(&mut self) -> std::result::Result<Expr, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('-') => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::UnaryOp {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some('+') => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> std::result::Result<Expr, String> {
        self.skip_whitespace();

        match self.peek() {
            Some('(') => {
                self.advance();
                let expr = self.parse_additive()?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err("expected ')'".to_string());
                }
                self.advance();
                Ok(expr)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_identifier(),
            Some(c) => Err(format!("unexpected character: '{}'", c)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn parse_number(&mut self) -> std::result::Result<Expr, String> {
        let start = self.pos;
        let mut has_dot = false;
        let mut has_exp = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_dot && !has_exp {
                has_dot = true;
                self.advance();
            } else if (c == 'e' || c == 'E') && !has_exp && self.exponent_follows() {
                has_exp = true;
                self.advance();
                if self.peek() == Some('+') || self.peek() == Some('-') {
                    self.advance();
                }
            } else {
                break;
            }
        }

        let num_str = &self.input[start..self.pos];
        let mut value: f64 = num_str
            .parse()
            .map_err(|_| format!("invalid number: {}", num_str))?;

        // Optional SI scale factor, which must not run into an identifier.
        if let Some(c) = self.peek() {
            if let Some(exp) = scale_exponent(c) {
                let after = self.input[self.pos + c.len_utf8()..].chars().next();
                if after.map_or(true, |a| !a.is_alphanumeric() && a != '_') {
                    self.advance();
                    value = format!("{}e{}", num_str, exp)
                        .parse()
                        .map_err(|_| format!("invalid number: {}{}", num_str, c))?;
                }
            }
        }

        if let Some(c) = self.peek() {
            if c.is_alphabetic() || c == '_' {
                return Err(format!(
                    "unexpected units or scale factor after {}: '{}'",
                    num_str,
                    &self.input[self.pos..]
                ));
            }
        }

        Ok(Expr::Constant(value))
    }

    /// True when the `e` at the cursor starts an exponent rather than a name.
    fn exponent_follows(&self) -> bool {
        let mut rest = self.input[self.pos + 1..].chars();
        match rest.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('+') | Some('-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn parse_identifier(&mut self) -> std::result::Result<Expr, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.input[start..self.pos];
        self.skip_whitespace();

        if self.peek() == Some('(') {
            self.advance();
            let args = self.parse_function_args()?;
            return Ok(Expr::Function {
                name: ident.to_string(),
                args,
            });
        }

        if ident == "pi" {
            return Ok(Expr::Constant(PI));
        }

        Ok(Expr::Name(ident.to_string()))
    }

    fn parse_function_args(&mut self) -> std::result::Result<Vec<Expr>, String> {
        let mut args = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(args);
        }

        loop {
            let arg = self.parse_additive()?;
            args.push(arg);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(')') => {
                    self.advance();
                    break;
                }
                _ => return Err("expected ',' or ')' in function arguments".to_string()),
            }
        }

        Ok(args)
    }
}
