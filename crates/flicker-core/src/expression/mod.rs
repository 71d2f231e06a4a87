//! Arithmetic expressions for derived parameters.
//!
//! Supports expressions like:
//! - `2**17` - powers, also written `2^17`
//! - `1/freq` - references to previously defined parameters
//! - `ampl/sqrt(2)` - built-in functions
//! - `10k * 2` - numbers with SI scale factors

mod ast;
mod eval;
mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::EvalContext;
pub use parser::parse_expression;
