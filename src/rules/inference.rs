use crate::rules::{mismatch, RuleContext, RuleResult};
use crate::syntax::expression::{BinaryOp, Expression, NaryOp};

/// True if one expression is the negation of the other.
fn negates(a: &Expression, b: &Expression) -> bool {
    match (a, b) {
        (Expression::Not(inner), _) if inner.as_ref() == b => true,
        (_, Expression::Not(inner)) if inner.as_ref() == a => true,
        _ => false,
    }
}

/// Order-independent containment: every element of `needles` matches a
/// distinct element of `haystack`.
fn each_has_match(needles: &[&Expression], haystack: &[&Expression]) -> bool {
    let mut used = vec![false; haystack.len()];
    for needle in needles {
        let found = haystack.iter().enumerate().position(|(i, candidate)| {
            !used[i] && *candidate == *needle
        });
        match found {
            Some(i) => used[i] = true,
            None => return false,
        }
    }
    true
}

pub fn modus_ponens(ctx: &RuleContext) -> RuleResult {
    let (a, b) = (ctx.antecedents[0], ctx.antecedents[1]);
    for (implication, minor) in [(a, b), (b, a)] {
        if let Expression::Binary(BinaryOp::Implies, lhs, rhs) = implication {
            if minor == lhs.as_ref() && ctx.conclusion == rhs.as_ref() {
                return Ok(());
            }
        }
    }
    Err(mismatch(
        "needs an implication and its antecedent, concluding its consequent",
    ))
}

pub fn addition(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    match ctx.conclusion {
        Expression::Nary(NaryOp::Or, _) => {
            let disjuncts = ctx.conclusion.disjuncts();
            if disjuncts.contains(&antecedent)
                || each_has_match(&antecedent.disjuncts(), &disjuncts)
            {
                Ok(())
            } else {
                Err(mismatch(
                    "the referenced sentence must be one of the conclusion's disjuncts",
                ))
            }
        }
        _ => Err(mismatch("the conclusion must be a disjunction")),
    }
}

pub fn simplification(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    match antecedent {
        Expression::Nary(NaryOp::And, _) => {
            if each_has_match(&ctx.conclusion.conjuncts(), &antecedent.conjuncts()) {
                Ok(())
            } else {
                Err(mismatch(
                    "the conclusion must consist of conjuncts of the referenced sentence",
                ))
            }
        }
        _ => Err(mismatch("the referenced sentence must be a conjunction")),
    }
}

pub fn conjunction(ctx: &RuleContext) -> RuleResult {
    match ctx.conclusion {
        Expression::Nary(NaryOp::And, _) => {
            let conjuncts = ctx.conclusion.conjuncts();
            if each_has_match(&conjuncts, &ctx.antecedents)
                && each_has_match(&ctx.antecedents, &conjuncts)
            {
                Ok(())
            } else {
                Err(mismatch(
                    "the conclusion must be exactly the conjunction of the referenced sentences",
                ))
            }
        }
        _ => Err(mismatch("the conclusion must be a conjunction")),
    }
}

pub fn hypothetical_syllogism(ctx: &RuleContext) -> RuleResult {
    let (a, b) = (ctx.antecedents[0], ctx.antecedents[1]);
    let Expression::Binary(BinaryOp::Implies, goal_lhs, goal_rhs) = ctx.conclusion else {
        return Err(mismatch("the conclusion must be an implication"));
    };
    for (first, second) in [(a, b), (b, a)] {
        if let (
            Expression::Binary(BinaryOp::Implies, p, q1),
            Expression::Binary(BinaryOp::Implies, q2, r),
        ) = (first, second)
        {
            if q1 == q2 && p == goal_lhs && r == goal_rhs {
                return Ok(());
            }
        }
    }
    Err(mismatch(
        "needs implications A -> B and B -> C, concluding A -> C",
    ))
}

pub fn disjunctive_syllogism(ctx: &RuleContext) -> RuleResult {
    let (a, b) = (ctx.antecedents[0], ctx.antecedents[1]);
    for (disjunction, denial) in [(a, b), (b, a)] {
        let Expression::Nary(NaryOp::Or, children) = disjunction else {
            continue;
        };
        for (i, disjunct) in children.iter().enumerate() {
            if !negates(disjunct, denial) {
                continue;
            }
            let rest: Vec<Expression> = children
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, c)| c.clone())
                .collect();
            if !rest.is_empty() && *ctx.conclusion == Expression::or(rest) {
                return Ok(());
            }
        }
    }
    Err(mismatch(
        "needs a disjunction and the negation of one disjunct, concluding the rest",
    ))
}

pub fn excluded_middle(ctx: &RuleContext) -> RuleResult {
    if let Expression::Nary(NaryOp::Or, children) = ctx.conclusion {
        if children.len() == 2 && negates(&children[0], &children[1]) {
            return Ok(());
        }
    }
    Err(mismatch("the conclusion must have the form A | ~A"))
}

pub fn constructive_dilemma(ctx: &RuleContext) -> RuleResult {
    // One reference is the disjunction; each remaining reference is an
    // implication discharging one disjunct.
    let disjunction = ctx
        .antecedents
        .iter()
        .find(|a| matches!(a, Expression::Nary(NaryOp::Or, _)));
    let Some(disjunction) = disjunction else {
        return Err(mismatch("one referenced sentence must be a disjunction"));
    };
    let implications: Vec<(&Expression, &Expression)> = ctx
        .antecedents
        .iter()
        .filter_map(|a| match a {
            Expression::Binary(BinaryOp::Implies, lhs, rhs) => Some((lhs.as_ref(), rhs.as_ref())),
            _ => None,
        })
        .collect();

    let mut consequents: Vec<&Expression> = Vec::new();
    for disjunct in disjunction.disjuncts() {
        match implications.iter().find(|(lhs, _)| *lhs == disjunct) {
            Some((_, rhs)) => consequents.push(*rhs),
            None => {
                return Err(mismatch(format!(
                    "no referenced implication discharges the disjunct {}",
                    disjunct
                )));
            }
        }
    }
    let disjuncts = ctx.conclusion.disjuncts();
    if each_has_match(&disjuncts, &consequents) && each_has_match(&consequents, &disjuncts) {
        Ok(())
    } else {
        Err(mismatch(
            "the conclusion must be the disjunction of the implications' consequents",
        ))
    }
}
