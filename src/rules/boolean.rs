//! The Boolean-algebra rule group. These are equivalence-style schemas
//! over the constants 0 and 1, run through the same walker as the
//! equivalence rules so they apply at any depth.

use crate::syntax::expression::{Expression, NaryOp};

fn rebuild(op: NaryOp, mut children: Vec<Expression>) -> Expression {
    if children.len() == 1 {
        children.pop().unwrap()
    } else {
        Expression::Nary(op, children)
    }
}

/// A & 1 to A, and A | 0 to A.
pub fn bool_identity(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Nary(op, children) = a else {
        return false;
    };
    let unit = match op {
        NaryOp::And => 1,
        NaryOp::Or => 0,
        _ => return false,
    };
    let remaining: Vec<Expression> = children
        .iter()
        .filter(|c| **c != Expression::Number(unit))
        .cloned()
        .collect();
    if remaining.len() == children.len() || remaining.is_empty() {
        return false;
    }
    eq(b, &rebuild(*op, remaining))
}

/// A & ~A to 0, and A | ~A to 1.
pub fn bool_negation(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Nary(op, children) = a else {
        return false;
    };
    let constant = match op {
        NaryOp::And => 0,
        NaryOp::Or => 1,
        _ => return false,
    };
    if children.len() != 2 {
        return false;
    }
    let complementary = eq(&children[0], &Expression::not(children[1].clone()))
        || eq(&children[1], &Expression::not(children[0].clone()));
    complementary && eq(b, &Expression::Number(constant))
}

/// A & 0 to 0, and A | 1 to 1.
pub fn bool_dominance(
    a: &Expression,
    b: &Expression,
    eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    let Expression::Nary(op, children) = a else {
        return false;
    };
    let dominant = match op {
        NaryOp::And => 0,
        NaryOp::Or => 1,
        _ => return false,
    };
    children.contains(&Expression::Number(dominant)) && eq(b, &Expression::Number(dominant))
}

/// ~0 to 1, and ~1 to 0.
pub fn symbol_negation(
    a: &Expression,
    b: &Expression,
    _eq: &dyn Fn(&Expression, &Expression) -> bool,
) -> bool {
    match a {
        Expression::Not(inner) => match inner.as_ref() {
            Expression::Number(0) => *b == Expression::Number(1),
            Expression::Number(1) => *b == Expression::Number(0),
            _ => false,
        },
        _ => false,
    }
}
