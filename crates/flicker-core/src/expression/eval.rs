//! Expression evaluation.

use std::collections::HashMap;

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};

/// Values that names in an expression resolve to.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    values: HashMap<String, f64>,
}

impl EvalContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name to a value.
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

impl Expr {
    /// Evaluate the expression in the given context.
    pub fn eval(&self, ctx: &EvalContext) -> Result<f64> {
        match self {
            Expr::Constant(v) => Ok(*v),
            Expr::Name(name) => ctx
                .get(name)
                .ok_or_else(|| Error::UnknownName(name.clone())),
            Expr::BinaryOp { op, left, right } => {
                let l = left.eval(ctx)?;
                let r = right.eval(ctx)?;
                Ok(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => l.powf(r),
                })
            }
            Expr::UnaryOp { op, operand } => {
                let v = operand.eval(ctx)?;
                Ok(match op {
                    UnaryOp::Neg => -v,
                })
            }
            Expr::Function { name, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(ctx))
                    .collect::<Result<Vec<f64>>>()?;
                eval_function(name, &values)
            }
        }
    }

    /// Names referenced by the expression, in order of first appearance.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Name(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_names(names),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_names(names);
                }
            }
        }
    }
}

fn eval_function(name: &str, args: &[f64]) -> Result<f64> {
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(arity_error(name, 1, args.len())),
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "exp" => unary(f64::exp),
        "ln" | "log" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "abs" => unary(f64::abs),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "pow" => match args {
            [base, exp] => Ok(base.powf(*exp)),
            _ => Err(arity_error(name, 2, args.len())),
        },
        "min" | "max" if args.is_empty() => Err(arity_error(name, 1, 0)),
        "min" => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        "max" => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        _ => Err(Error::InvalidExpression(format!("unknown function: {}", name))),
    }
}

fn arity_error(name: &str, expected: usize, got: usize) -> Error {
    Error::InvalidExpression(format!(
        "{}() takes {} argument(s), got {}",
        name, expected, got
    ))
}
