//! Reference resolution and arithmetic evaluation.
//!
//! A [`Lookup`] is built once per evaluation call from the sampled values that
//! carry the requested player tag and from that player's variable definitions.
//! Every reference in the tree is resolved against it directly, so there is no
//! textual substitution and no chance of `v1` matching inside `v10`.

use std::collections::HashMap;

use crate::error::FormulaError;
use crate::types::{DesiredEffect, PlayerTag, SampledValues, VariableDefinition};

use super::parser::{BinaryOp, Expr, RefKind, Reference};

/// Evaluation options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Clamp standardized values to [0, 1].
    pub clamp_standardized: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            clamp_standardized: true,
        }
    }
}

/// Map a raw value onto [0, 1] using the variable's bounds and desired effect.
///
/// - positive: `(value - min) / (max - min)`
/// - negative: `(max - value) / (max - min)`
pub fn standardize(
    value: f64,
    def: &VariableDefinition,
    clamp: bool,
) -> Result<f64, FormulaError> {
    let span = def.max - def.min;
    if span == 0.0 {
        return Err(FormulaError::DegenerateBounds {
            id: def.id.clone(),
            bound: def.min,
        });
    }
    let z = match def.desired_effect {
        DesiredEffect::Negative => (def.max - value) / span,
        DesiredEffect::Positive => (value - def.min) / span,
    };
    if !z.is_finite() {
        return Err(FormulaError::failed(format!(
            "standardized value for '{}' is not finite",
            def.id
        )));
    }
    Ok(if clamp { z.clamp(0.0, 1.0) } else { z })
}

/// Typed lookup table for one player in one scenario.
pub(crate) struct Lookup<'a> {
    values: HashMap<String, f64>,
    defs: HashMap<String, &'a VariableDefinition>,
    options: EvalOptions,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(
        sampled: &SampledValues,
        player: PlayerTag,
        variables: &'a [VariableDefinition],
        options: EvalOptions,
    ) -> Self {
        let values = sampled
            .for_player(player)
            .map(|(id, v)| (id.to_ascii_lowercase(), v))
            .collect();
        let defs = variables
            .iter()
            .map(|d| (d.id.to_ascii_lowercase(), d))
            .collect();
        Self {
            values,
            defs,
            options,
        }
    }

    fn resolve(&self, r: &Reference) -> Result<f64, FormulaError> {
        let resolved = match r.kind {
            RefKind::Raw => self.values.get(&r.id).copied().map(Ok),
            RefKind::Weight => self
                .defs
                .get(&r.id)
                .map(|d| Ok(d.effective_weight())),
            RefKind::Standardized => self.values.get(&r.id).map(|&value| {
                let def = self.defs.get(&r.id).ok_or_else(|| {
                    FormulaError::UnknownVariable {
                        name: r.id.clone(),
                    }
                })?;
                standardize(value, def, self.options.clamp_standardized)
            }),
        };
        match resolved {
            Some(result) => result,
            // A suffixed name that is itself a sampled id resolves as a raw value.
            None => self.values.get(&r.full_id()).copied().ok_or_else(|| {
                FormulaError::invalid(format!("unresolved token '{}'", r.name))
            }),
        }
    }

    pub(crate) fn eval(&self, expr: &Expr) -> Result<f64, FormulaError> {
        let value = match expr {
            Expr::Number(v) => *v,
            Expr::Ref(r) => self.resolve(r)?,
            Expr::Neg(inner) => -self.eval(inner)?,
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(FormulaError::failed("division by zero"));
                        }
                        l / r
                    }
                }
            }
        };
        if !value.is_finite() {
            return Err(FormulaError::failed("arithmetic overflow"));
        }
        Ok(value)
    }
}
