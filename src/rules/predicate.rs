use crate::error::CheckError;
use crate::rules::{mismatch, RuleContext, RuleFailure, RuleResult};
use crate::syntax::expression::{match_instantiation, BinaryOp, Expression, NaryOp, Quantifier};
use crate::tracker::VariableRole;

/// From an instance P(y), conclude forall x P(x). The generalized variable
/// must be arbitrary: never bound earlier in the proof, and not still free
/// in the conclusion.
pub fn universal_generalization(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    let Expression::Quantified(Quantifier::Forall, var, body) = ctx.conclusion else {
        return Err(mismatch("the conclusion must be universally quantified"));
    };
    match match_instantiation(body, var, antecedent) {
        None => Err(mismatch(
            "the referenced sentence is not an instance of the conclusion's body",
        )),
        Some(None) => Ok(()),
        Some(Some(Expression::Ident(name))) => {
            let witness = Expression::Ident(name.clone());
            if !body.free_for(var, &witness) {
                return Err(mismatch("the generalized variable would be captured"));
            }
            if ctx.conclusion.has_free(&name) {
                return Err(mismatch(format!(
                    "'{}' still occurs free in the conclusion",
                    name
                )));
            }
            if ctx.tracker.is_consistent(&name, VariableRole::Arbitrary) {
                Ok(())
            } else {
                Err(RuleFailure::Error(CheckError::InvalidVariableUse {
                    name,
                    prior: VariableRole::Bound,
                }))
            }
        }
        Some(Some(other)) => Err(mismatch(format!(
            "can only generalize over a variable, not {}",
            other
        ))),
    }
}

/// From forall x P(x), conclude P(t) for any admissible term t.
pub fn universal_instantiation(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    let Expression::Quantified(Quantifier::Forall, var, body) = antecedent else {
        return Err(mismatch(
            "the referenced sentence must be universally quantified",
        ));
    };
    match match_instantiation(body, var, ctx.conclusion) {
        Some(None) => Ok(()),
        Some(Some(term)) => {
            if body.free_for(var, &term) {
                Ok(())
            } else {
                Err(mismatch(
                    "the substitution would capture a variable of the term",
                ))
            }
        }
        None => Err(mismatch(
            "the conclusion is not an instance of the quantified sentence",
        )),
    }
}

/// From an instance P(t), conclude exists x P(x).
pub fn existential_generalization(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    let Expression::Quantified(Quantifier::Exists, var, body) = ctx.conclusion else {
        return Err(mismatch("the conclusion must be existentially quantified"));
    };
    match match_instantiation(body, var, antecedent) {
        Some(None) => Ok(()),
        Some(Some(term)) => {
            if body.free_for(var, &term) {
                Ok(())
            } else {
                Err(mismatch(
                    "the substitution would capture a variable of the term",
                ))
            }
        }
        None => Err(mismatch(
            "the referenced sentence is not an instance of the conclusion's body",
        )),
    }
}

/// From exists x P(x), conclude P(y) for a variable y the proof has never
/// used. Reusing a seen name is a variable-use error, not a mere mismatch.
pub fn existential_instantiation(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    let Expression::Quantified(Quantifier::Exists, var, body) = antecedent else {
        return Err(mismatch(
            "the referenced sentence must be existentially quantified",
        ));
    };
    match match_instantiation(body, var, ctx.conclusion) {
        Some(None) => Ok(()),
        Some(Some(Expression::Ident(name))) => {
            if ctx.tracker.is_fresh(&name) {
                Ok(())
            } else {
                let prior = ctx
                    .tracker
                    .any_role(&name)
                    .unwrap_or(VariableRole::Arbitrary);
                Err(RuleFailure::Error(CheckError::InvalidVariableUse {
                    name,
                    prior,
                }))
            }
        }
        Some(Some(_)) => Err(mismatch("must instantiate to a new variable")),
        None => Err(mismatch(
            "the conclusion is not an instance of the quantified sentence",
        )),
    }
}

/// Renaming bound variables: the sentences must be alpha-equivalent.
pub fn bound_variable(ctx: &RuleContext) -> RuleResult {
    if ctx.antecedents[0].alpha_eq(ctx.conclusion) {
        Ok(())
    } else {
        Err(mismatch(
            "the sentences do not differ only in bound variable names",
        ))
    }
}

/// Dropping (or adding) a quantifier whose variable never occurs in its
/// scope. Schema form, applied at any depth by the equivalence walker.
pub fn null_quantifier(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Quantified(_, var, body) = a else {
        return false;
    };
    !body.has_free(var) && eq(b, body)
}

/// Moving a quantifier across a conjunction or disjunction it does not
/// bind into: forall x (P(x) & Q) to (forall x P(x)) & Q. Schema form.
pub fn prenex(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Quantified(quant, var, qbody) = a else {
        return false;
    };
    let Expression::Nary(op, inner) = qbody.as_ref() else {
        return false;
    };
    if !matches!(op, NaryOp::And | NaryOp::Or) {
        return false;
    }
    let Expression::Nary(ob, ds) = b else {
        return false;
    };
    if ob != op || ds.len() != inner.len() {
        return false;
    }
    // Exactly one child keeps the quantifier; the others leave its scope,
    // which is only sound if they never mention the variable.
    let mut kept = false;
    for (c, d) in inner.iter().zip(ds) {
        let requantified = Expression::Quantified(*quant, var.clone(), Box::new(c.clone()));
        if !kept && eq(d, &requantified) {
            kept = true;
        } else if !c.has_free(var) && eq(d, c) {
            continue;
        } else {
            return false;
        }
    }
    kept
}

/// t = t, from nothing.
pub fn identity(ctx: &RuleContext) -> RuleResult {
    if let Expression::Binary(BinaryOp::Equals, lhs, rhs) = ctx.conclusion {
        if lhs == rhs || lhs.fold_numerals() == rhs.fold_numerals() {
            return Ok(());
        }
    }
    Err(mismatch(
        "the conclusion must equate a term with itself",
    ))
}

/// Renaming one free variable uniformly across the sentence.
pub fn free_variable(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    if antecedent == ctx.conclusion {
        return Ok(());
    }
    for var in antecedent.free_variables() {
        let Some(Some(Expression::Ident(name))) =
            match_instantiation(antecedent, &var, ctx.conclusion)
        else {
            continue;
        };
        if !antecedent.free_for(&var, &Expression::Ident(name.clone())) {
            continue;
        }
        if ctx.tracker.is_consistent(&name, VariableRole::Arbitrary) {
            return Ok(());
        }
        return Err(RuleFailure::Error(CheckError::InvalidVariableUse {
            name,
            prior: VariableRole::Bound,
        }));
    }
    Err(mismatch(
        "the conclusion must substitute one free variable uniformly by another",
    ))
}
