//! Requirement expressions: the constraints a permutation must satisfy.
//!
//! Requirements are written in a small boolean grammar (see [`parser`]) and
//! compiled against an [`OptionSpace`] before any permutation is tested, so
//! undefined axes are reported up front instead of during filtering. Nothing
//! here executes code; evaluation is a walk over the compiled tree.

pub mod parser;
pub mod token;

pub use parser::{CompareOp, Expr, Spanned, parse_expression};
pub use token::{Span, is_identifier};

use crate::config::OptionSpace;
use crate::error::RequirementError;
use crate::permutation::Permutation;

/// A requirement resolved against one option space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    source: String,
    condition: Condition,
}

/// Compiled form of [`Expr`]: axis names become axis indices and literals
/// become value indices.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Const(bool),
    /// Holds when the axis value is one of `values` (or isn't, if negated).
    /// Literals the axis never takes are dropped, so `values` may be empty.
    Match {
        axis: usize,
        values: Vec<usize>,
        negated: bool,
    },
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Requirement {
    /// Parse `source` and resolve it against `space`.
    pub fn compile(source: &str, space: &OptionSpace) -> Result<Self, RequirementError> {
        let expr = parse_expression(source)?;
        let condition = resolve(&expr, space, source)?;
        Ok(Self {
            source: source.to_string(),
            condition,
        })
    }

    /// The expression as written in the config.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one permutation of the space this was compiled for.
    pub fn holds(&self, permutation: &Permutation<'_>) -> bool {
        self.condition.eval(permutation.indices())
    }
}

impl Condition {
    fn eval(&self, indices: &[usize]) -> bool {
        match self {
            Condition::Const(value) => *value,
            Condition::Match {
                axis,
                values,
                negated,
            } => values.contains(&indices[*axis]) != *negated,
            Condition::Not(inner) => !inner.eval(indices),
            Condition::And(lhs, rhs) => lhs.eval(indices) && rhs.eval(indices),
            Condition::Or(lhs, rhs) => lhs.eval(indices) || rhs.eval(indices),
        }
    }
}

fn resolve(expr: &Expr, space: &OptionSpace, source: &str) -> Result<Condition, RequirementError> {
    Ok(match expr {
        Expr::Bool(value) => Condition::Const(*value),
        Expr::Compare { axis, op, value } => {
            resolve_match(axis, std::slice::from_ref(value), *op == CompareOp::Ne, space, source)?
        }
        Expr::Member {
            axis,
            values,
            negated,
        } => resolve_match(axis, values, *negated, space, source)?,
        Expr::Not(inner) => Condition::Not(Box::new(resolve(inner, space, source)?)),
        Expr::And(lhs, rhs) => Condition::And(
            Box::new(resolve(lhs, space, source)?),
            Box::new(resolve(rhs, space, source)?),
        ),
        Expr::Or(lhs, rhs) => Condition::Or(
            Box::new(resolve(lhs, space, source)?),
            Box::new(resolve(rhs, space, source)?),
        ),
    })
}

fn resolve_match(
    axis: &Spanned,
    literals: &[Spanned],
    negated: bool,
    space: &OptionSpace,
    source: &str,
) -> Result<Condition, RequirementError> {
    let Some(axis_index) = space.axis_index(&axis.text) else {
        return Err(RequirementError::UnknownAxis {
            name: axis.text.clone(),
            span: axis.span,
        });
    };
    let declared = &space.axes()[axis_index];

    let mut values = Vec::with_capacity(literals.len());
    for literal in literals {
        match declared.value_index(&literal.text) {
            Some(index) => values.push(index),
            None => tracing::warn!(
                "requirement `{}` compares {} with '{}', which is not one of its values",
                source,
                declared.name,
                literal.text
            ),
        }
    }

    Ok(Condition::Match {
        axis: axis_index,
        values,
        negated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::Permutations;

    fn space() -> OptionSpace {
        OptionSpace::from_pairs([("A", &["1", "2"][..]), ("B", &["x", "y", "z"][..])]).unwrap()
    }

    /// Evaluate `source` for every permutation, returning the output names that pass.
    fn passing(source: &str) -> Vec<String> {
        let space = space();
        let requirement = Requirement::compile(source, &space).unwrap();
        Permutations::new(&space)
            .filter(|p| requirement.holds(p))
            .map(|p| p.output_name())
            .collect()
    }

    #[test]
    fn test_equality_and_or() {
        assert_eq!(
            passing("A == '1' or B == 'x'"),
            ["A1_Bx", "A1_By", "A1_Bz", "A2_Bx"]
        );
    }

    #[test]
    fn test_inequality_and_not() {
        assert_eq!(passing("A != '1' and not B == 'y'"), ["A2_Bx", "A2_Bz"]);
    }

    #[test]
    fn test_membership() {
        assert_eq!(passing("B in ('x', 'z') && A == '2'"), ["A2_Bx", "A2_Bz"]);
        assert_eq!(passing("B not in ['x', 'z']"), ["A1_By", "A2_By"]);
    }

    #[test]
    fn test_constants() {
        assert_eq!(passing("True").len(), 6);
        assert!(passing("false").is_empty());
    }

    #[test]
    fn test_undeclared_literal_never_matches() {
        assert!(passing("B == 'w'").is_empty());
        assert_eq!(passing("B != 'w'").len(), 6);
    }

    #[test]
    fn test_unknown_axis_is_reported_with_span() {
        let err = Requirement::compile("A == '1' or C == 'x'", &space()).unwrap_err();
        assert_eq!(
            err,
            RequirementError::UnknownAxis {
                name: "C".to_string(),
                span: Span::new(12, 13),
            }
        );
    }

    #[test]
    fn test_unknown_axis_in_unreached_branch_still_fails() {
        // `or` would short-circuit at evaluation time; resolution must not.
        assert!(Requirement::compile("True or MISSING == 'x'", &space()).is_err());
    }

    #[test]
    fn test_deeply_nested_expression_fails_to_compile() {
        let source = format!("{}A == '1'{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = Requirement::compile(&source, &space()).unwrap_err();
        assert!(matches!(err, RequirementError::Syntax { .. }), "{err:?}");
    }

    #[test]
    fn test_source_is_kept() {
        let requirement = Requirement::compile("A == '2'", &space()).unwrap();
        assert_eq!(requirement.source(), "A == '2'");
    }
}
