use std::collections::BTreeSet;

use crate::error::CheckError;
use crate::rules::{mismatch, RuleContext, RuleFailure, RuleResult};
use crate::syntax::expression::{BinaryOp, Expression, NaryOp, Quantifier};

/// What the Lemma rule sees of a linked proof: its premises and the
/// sentences it validly concluded. The evaluator builds this by
/// recursively evaluating the imported document, so a summary only exists
/// for imports that themselves check out.
#[derive(Clone, Debug)]
pub struct ImportSummary {
    pub premises: Vec<Expression>,
    pub conclusions: Vec<Expression>,
}

/// The conclusion must match a conclusion of the linked proof, and every
/// premise of the linked proof must already be established by a line
/// visible here.
pub fn lemma(ctx: &RuleContext) -> RuleResult {
    let Some(import) = ctx.import else {
        return Err(RuleFailure::Error(CheckError::ImportResolutionFailure {
            name: "<none>".to_string(),
            reason: "no linked proof is attached to this line".to_string(),
        }));
    };
    if !import.conclusions.iter().any(|c| c == ctx.conclusion) {
        return Err(mismatch(
            "the conclusion does not match any conclusion of the linked proof",
        ));
    }
    for premise in &import.premises {
        if !ctx.visible.iter().any(|(_, expr)| *expr == premise) {
            return Err(mismatch(format!(
                "the linked proof's premise {} is not established by a visible line",
                premise
            )));
        }
    }
    Ok(())
}

/// Discharging a subproof: citing its assumption A and a line B inside it
/// justifies A -> B. The evaluator has already checked that the two cited
/// lines bracket a closed subproof directly below this line's scope.
pub fn subproof(ctx: &RuleContext) -> RuleResult {
    let (assumption, inner) = (ctx.antecedents[0], ctx.antecedents[1]);
    if let Expression::Binary(BinaryOp::Implies, lhs, rhs) = ctx.conclusion {
        if lhs.as_ref() == assumption && rhs.as_ref() == inner {
            return Ok(());
        }
    }
    Err(mismatch(
        "the conclusion must be the subproof's assumption implying the cited line",
    ))
}

/// Instantiating a sequence identity at a numeral: from a sentence with a
/// free variable, conclude the sentence with a number substituted for it,
/// judged after folding closed numeric subterms.
pub fn sequence_instantiation(ctx: &RuleContext) -> RuleResult {
    let antecedent = ctx.antecedents[0];
    let target = ctx.conclusion.fold_numerals();

    // Candidate instantiation values: every numeral in the conclusion and
    // its neighbors, since the substituted value may only appear shifted,
    // as in s(n + 1) becoming s(4) for n = 3.
    let mut candidates: BTreeSet<i64> = BTreeSet::new();
    candidates.insert(0);
    target.walk(&mut |e| {
        if let Expression::Number(n) = e {
            candidates.insert(*n);
            candidates.insert(n - 1);
            candidates.insert(n + 1);
        }
    });

    for var in antecedent.free_variables() {
        for k in &candidates {
            let instance = antecedent
                .substitute(&var, &Expression::Number(*k))
                .fold_numerals();
            if instance == target {
                return Ok(());
            }
        }
    }
    Err(mismatch(
        "the conclusion is not a numeric instance of the referenced sentence",
    ))
}

/// Mathematical induction: forall n P(n) from the base case P(0) and the
/// step forall n (P(n) -> P(n + 1)). The two references may come in either
/// order; numerals are folded before comparison.
pub fn induction(ctx: &RuleContext) -> RuleResult {
    let Expression::Quantified(Quantifier::Forall, var, body) = ctx.conclusion else {
        return Err(mismatch("the conclusion must be universally quantified"));
    };
    let base_expected = body.substitute(var, &Expression::Number(0)).fold_numerals();
    let successor = Expression::Nary(
        NaryOp::Add,
        vec![Expression::Ident(var.clone()), Expression::Number(1)],
    );
    let step_expected = Expression::Quantified(
        Quantifier::Forall,
        var.clone(),
        Box::new(Expression::implies(
            (**body).clone(),
            body.substitute(var, &successor),
        )),
    )
    .fold_numerals();

    let (a, b) = (ctx.antecedents[0], ctx.antecedents[1]);
    for (base, step) in [(a, b), (b, a)] {
        if base.fold_numerals() == base_expected
            && step.fold_numerals().alpha_eq(&step_expected)
        {
            return Ok(());
        }
    }
    Err(mismatch(
        "needs the base case and the inductive step for the conclusion",
    ))
}
