//! Payoff formula engine.
//!
//! A formula is plain arithmetic over variable references:
//!
//! | Token | Resolves to |
//! |-------|-------------|
//! | `v1`, `v1_Val` | sampled value of `v1` for the requested player |
//! | `v1_weight` | declared weight of `v1` (default 0.5) |
//! | `v1_stnd` | sampled value of `v1` mapped onto [0, 1] by its bounds and desired effect |
//!
//! Suffixes and ids match case-insensitively. Only `+ - * /`, unary signs and
//! parentheses are supported.
//!
//! - [`lexer`]: allow-listed tokenizer
//! - [`parser`]: recursive-descent parser producing an [`Expr`] tree
//! - [`evaluate`]: typed reference lookup, standardization, and evaluation

pub mod evaluate;
pub mod lexer;
pub mod parser;

use std::fmt;

use crate::error::FormulaError;
use crate::types::{PlayerTag, SampledValues, VariableDefinition};

pub use evaluate::{standardize, EvalOptions};
pub use parser::{BinaryOp, Expr, RefKind, Reference};

use evaluate::Lookup;

/// A parsed formula. Parse once per run, evaluate once per scenario per trial.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = lexer::tokenize(source)?;
        let expr = parser::parse(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// All references in left-to-right order (duplicates included).
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        self.expr.for_each_reference(&mut |r| refs.push(r));
        refs
    }

    /// Fail with `UnknownVariable` if any reference names an undeclared variable.
    pub fn check_declared(&self, variables: &[VariableDefinition]) -> Result<(), FormulaError> {
        let declared = |id: &str| variables.iter().any(|v| v.id.eq_ignore_ascii_case(id));
        for r in self.references() {
            if !declared(&r.id) && !declared(&r.full_id()) {
                return Err(FormulaError::UnknownVariable {
                    name: r.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Evaluate with default options (standardized values clamped to [0, 1]).
    pub fn evaluate(
        &self,
        sampled: &SampledValues,
        player: PlayerTag,
        variables: &[VariableDefinition],
    ) -> Result<f64, FormulaError> {
        self.evaluate_with(sampled, player, variables, EvalOptions::default())
    }

    pub fn evaluate_with(
        &self,
        sampled: &SampledValues,
        player: PlayerTag,
        variables: &[VariableDefinition],
        options: EvalOptions,
    ) -> Result<f64, FormulaError> {
        Lookup::new(sampled, player, variables, options).eval(&self.expr)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate `formula` in one call.
pub fn evaluate(
    formula: &str,
    sampled: &SampledValues,
    player: PlayerTag,
    variables: &[VariableDefinition],
) -> Result<f64, FormulaError> {
    Formula::parse(formula)?.evaluate(sampled, player, variables)
}
