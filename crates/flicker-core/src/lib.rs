//! Core types for flicker noise simulations.
//!
//! This crate provides:
//! - Physical quantities with SI scale factors and display notations
//! - Arithmetic expressions for derived parameters
//! - Parameter extraction from documented parameter blocks

pub mod error;
pub mod expression;
pub mod params;
pub mod units;

pub use error::{Error, Result};
pub use params::{extract, extract_with_overrides, Overrides, Parameter, ParameterSet};
pub use units::{format_value, Notation, Quantity};
