//! The equivalence-rule checker.
//!
//! Each equivalence rule is a local schema: a pattern pair that justifies a
//! rewrite at one position. Two sentences are related by the rule when they
//! are equal up to applying the schema, in either direction, at any set of
//! positions. The walker below recurses structurally and asks the schema at
//! every node, so one citation can justify several disjoint rewrites (and
//! rewrites inside rewrites), which is how the original program behaves.

use crate::rules::{mismatch, RuleContext, RuleResult};
use crate::syntax::expression::{BinaryOp, Expression, NaryOp};

/// A local rewrite schema. The third argument is the full equivalence
/// relation, so a schema can compare subparts up to further applications
/// of itself.
pub type Schema = fn(&Expression, &Expression, &dyn Fn(&Expression, &Expression) -> bool) -> bool;

/// Whether `a` and `b` are equal up to the schema.
pub fn equivalent(schema: Schema, a: &Expression, b: &Expression) -> bool {
    if a == b {
        return true;
    }
    let eq = |x: &Expression, y: &Expression| equivalent(schema, x, y);
    if schema(a, b, &eq) || schema(b, a, &eq) {
        return true;
    }
    match (a, b) {
        (Expression::Not(x), Expression::Not(y)) => equivalent(schema, x, y),
        (Expression::Nary(oa, ca), Expression::Nary(ob, cb)) => {
            oa == ob
                && ca.len() == cb.len()
                && ca.iter().zip(cb).all(|(x, y)| equivalent(schema, x, y))
        }
        (Expression::Binary(oa, la, ra), Expression::Binary(ob, lb, rb)) => {
            oa == ob && equivalent(schema, la, lb) && equivalent(schema, ra, rb)
        }
        (Expression::Quantified(qa, va, ba), Expression::Quantified(qb, vb, bb)) => {
            qa == qb && va == vb && equivalent(schema, ba, bb)
        }
        (Expression::Predicate(na, aa), Expression::Predicate(nb, ab)) => {
            na == nb
                && aa.len() == ab.len()
                && aa.iter().zip(ab).all(|(x, y)| equivalent(schema, x, y))
        }
        _ => false,
    }
}

/// Runs an equivalence-category rule: one antecedent, equal to the
/// conclusion up to the rule's schema.
pub fn check(ctx: &RuleContext, schema: Schema, name: &'static str) -> RuleResult {
    if equivalent(schema, ctx.antecedents[0], ctx.conclusion) {
        Ok(())
    } else {
        Err(mismatch(format!(
            "the sentences do not differ by {}",
            name
        )))
    }
}

/// ~(A & B) to ~A | ~B, and ~(A | B) to ~A & ~B, for any arity.
pub fn de_morgan(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Not(inner) = a else {
        return false;
    };
    let (children, dual) = match inner.as_ref() {
        Expression::Nary(NaryOp::And, cs) => (cs, NaryOp::Or),
        Expression::Nary(NaryOp::Or, cs) => (cs, NaryOp::And),
        _ => return false,
    };
    let Expression::Nary(op, ds) = b else {
        return false;
    };
    *op == dual
        && ds.len() == children.len()
        && children
            .iter()
            .zip(ds)
            .all(|(c, d)| eq(d, &Expression::not(c.clone())))
}

/// Reordering the children of a conjunction or disjunction, or swapping
/// the sides of a biconditional.
pub fn commutativity(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    match (a, b) {
        (Expression::Nary(oa, ca), Expression::Nary(ob, cb)) => {
            if oa != ob || ca.len() != cb.len() {
                return false;
            }
            let mut used = vec![false; cb.len()];
            ca.iter().all(|x| {
                match cb
                    .iter()
                    .enumerate()
                    .position(|(i, y)| !used[i] && eq(x, y))
                {
                    Some(i) => {
                        used[i] = true;
                        true
                    }
                    None => false,
                }
            })
        }
        (
            Expression::Binary(BinaryOp::Iff, la, ra),
            Expression::Binary(BinaryOp::Iff, lb, rb),
        ) => eq(la, rb) && eq(ra, lb),
        _ => false,
    }
}

/// A & A to A, or dropping repeated children generally.
pub fn idempotence(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Nary(op, cs) = a else {
        return false;
    };
    if !matches!(op, NaryOp::And | NaryOp::Or) {
        return false;
    }
    // All children equal: the whole node collapses to one of them.
    if cs.iter().all(|c| eq(c, b)) {
        return true;
    }
    // Duplicates dropped but the node survives.
    if let Expression::Nary(ob, ds) = b {
        if ob == op && ds.len() < cs.len() {
            return cs.iter().all(|c| ds.iter().any(|d| eq(c, d)))
                && ds.iter().all(|d| cs.iter().any(|c| eq(c, d)));
        }
    }
    false
}

/// Regrouping a chain: (A & B) & C, A & (B & C), and A & B & C are all
/// related. Flattens both sides one operator deep and compares in order.
pub fn association(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let (Expression::Nary(oa, _), Expression::Nary(ob, _)) = (a, b) else {
        return false;
    };
    if oa != ob || !matches!(oa, NaryOp::And | NaryOp::Or | NaryOp::Add | NaryOp::Mul) {
        return false;
    }
    let mut fa = Vec::new();
    let mut fb = Vec::new();
    flatten(*oa, a, &mut fa);
    flatten(*ob, b, &mut fb);
    fa.len() == fb.len() && fa.iter().zip(fb).all(|(x, y)| eq(x, y))
}

fn flatten<'a>(op: NaryOp, expr: &'a Expression, out: &mut Vec<&'a Expression>) {
    match expr {
        Expression::Nary(o, children) if *o == op => {
            for child in children {
                flatten(op, child, out);
            }
        }
        other => out.push(other),
    }
}

/// A -> B to ~A | B.
pub fn implication(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Binary(BinaryOp::Implies, lhs, rhs) = a else {
        return false;
    };
    let Expression::Nary(NaryOp::Or, ds) = b else {
        return false;
    };
    if ds.len() != 2 {
        return false;
    }
    let neg = Expression::not((**lhs).clone());
    (eq(&ds[0], &neg) && eq(&ds[1], rhs)) || (eq(&ds[1], &neg) && eq(&ds[0], rhs))
}

/// A & (B | C) to (A & B) | (A & C), and the dual.
pub fn distribution(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    distributes(NaryOp::And, NaryOp::Or, a, b, eq) || distributes(NaryOp::Or, NaryOp::And, a, b, eq)
}

fn distributes(
    outer: NaryOp,
    inner: NaryOp,
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Nary(oa, cs) = a else {
        return false;
    };
    if *oa != outer || cs.len() != 2 {
        return false;
    }
    for (inner_idx, single_idx) in [(0, 1), (1, 0)] {
        let single = &cs[single_idx];
        let Expression::Nary(oi, qs) = &cs[inner_idx] else {
            continue;
        };
        if *oi != inner {
            continue;
        }
        let Expression::Nary(ob, ds) = b else {
            continue;
        };
        if *ob != inner || ds.len() != qs.len() {
            continue;
        }
        let all_match = qs.iter().zip(ds).all(|(q, d)| {
            let forward = Expression::Nary(outer, vec![(*single).clone(), q.clone()]);
            let backward = Expression::Nary(outer, vec![q.clone(), (*single).clone()]);
            eq(d, &forward) || eq(d, &backward)
        });
        if all_match {
            return true;
        }
    }
    false
}

/// A <-> B to (A -> B) & (B -> A), or to (A & B) | (~A & ~B).
pub fn biconditional(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Binary(BinaryOp::Iff, l, r) = a else {
        return false;
    };
    match b {
        Expression::Nary(NaryOp::And, ds) if ds.len() == 2 => {
            let fwd = Expression::implies((**l).clone(), (**r).clone());
            let bwd = Expression::implies((**r).clone(), (**l).clone());
            (eq(&ds[0], &fwd) && eq(&ds[1], &bwd)) || (eq(&ds[1], &fwd) && eq(&ds[0], &bwd))
        }
        Expression::Nary(NaryOp::Or, ds) if ds.len() == 2 => {
            let both = Expression::Nary(NaryOp::And, vec![(**l).clone(), (**r).clone()]);
            let neither = Expression::Nary(
                NaryOp::And,
                vec![
                    Expression::not((**l).clone()),
                    Expression::not((**r).clone()),
                ],
            );
            (eq(&ds[0], &both) && eq(&ds[1], &neither))
                || (eq(&ds[1], &both) && eq(&ds[0], &neither))
        }
        _ => false,
    }
}

/// A to ~~A.
pub fn double_negation(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    if let Expression::Not(outer) = b {
        if let Expression::Not(inner) = outer.as_ref() {
            return eq(a, inner);
        }
    }
    false
}

/// (A & B) -> C to A -> (B -> C).
pub fn exportation(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Binary(BinaryOp::Implies, ante, concl) = a else {
        return false;
    };
    let Expression::Nary(NaryOp::And, cs) = ante.as_ref() else {
        return false;
    };
    if cs.len() < 2 {
        return false;
    }
    let first = &cs[0];
    let rest = Expression::and(cs[1..].to_vec());
    let Expression::Binary(BinaryOp::Implies, p, nested) = b else {
        return false;
    };
    let Expression::Binary(BinaryOp::Implies, q, r) = nested.as_ref() else {
        return false;
    };
    eq(p, first) && eq(q, &rest) && eq(r, concl)
}

/// A | (A & B) to A, and A & (A | B) to A.
pub fn subsumption(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    absorbs(NaryOp::Or, NaryOp::And, a, b, eq) || absorbs(NaryOp::And, NaryOp::Or, a, b, eq)
}

fn absorbs(
    outer: NaryOp,
    inner: NaryOp,
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Nary(oa, cs) = a else {
        return false;
    };
    if *oa != outer || cs.len() != 2 {
        return false;
    }
    for (keep_idx, drop_idx) in [(0, 1), (1, 0)] {
        let kept = &cs[keep_idx];
        if let Expression::Nary(oi, ys) = &cs[drop_idx] {
            if *oi == inner && ys.iter().any(|y| eq(y, kept)) && eq(b, kept) {
                return true;
            }
        }
    }
    false
}
