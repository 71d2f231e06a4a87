//! Error types for flicker-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A line of a parameter block does not fit the quantity grammar.
    #[error("parameter extraction error at line {line}: {message}")]
    ParameterExtraction { line: usize, message: String },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("unknown name in expression: {0}")]
    UnknownName(String),

    #[error("duplicate parameter: {0}")]
    DuplicateParameter(String),

    #[error("override names an unknown parameter: {0}")]
    UnknownOverride(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
