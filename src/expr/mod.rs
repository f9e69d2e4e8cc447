//! Evaluation of `#if` / `#elif` condition expressions.
//!
//! The pipeline is tokenize, parse, evaluate. By the time a condition text
//! reaches this module it has already been through macro replacement, so
//! any identifier still present is undefined and evaluates as zero.

mod ast;
mod parser;
mod token;

pub use ast::Value;

use crate::error::ErrorKind;

/// Evaluates a condition expression down to a single [`Value`].
pub fn evaluate(input: &str) -> Result<Value, ErrorKind> {
    let tokens = token::tokenize(input).map_err(ErrorKind::Lexing)?;
    if tokens.is_empty() {
        return Err(ErrorKind::Evaluation("empty expression".to_string()));
    }
    let expr = parser::parse(&tokens)?;
    expr.eval()
}

/// Evaluates a condition expression to its boolean outcome.
pub fn evaluate_condition(input: &str) -> Result<bool, ErrorKind> {
    Ok(evaluate(input)?.truthy())
}
