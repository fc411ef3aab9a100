use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Operators whose chains collapse into a single n-ary node.
///
/// Keeping conjunction and disjunction flat matters for rule checking:
/// membership tests against "one of the conjuncts" read the child list
/// directly instead of walking a nested binary spine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NaryOp {
    And,
    Or,
    Add,
    Mul,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Implies,
    Iff,
    Equals,
    LessThan,
    Minus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// A parsed sentence: a finite, acyclic tree.
///
/// Equality is structural. A sentence is parsed once per line and cached on
/// the line; editing the line's text drops the cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// A predicate applied to terms, like P(x, y), or a bare propositional
    /// letter, like P. Also covers term-level function application.
    Predicate(String, Vec<Expression>),

    /// A term identifier. Whether it acts as a variable or a constant
    /// depends on the quantifiers in scope around it.
    Ident(String),

    /// A numeral, for the arithmetic-sequence dialect and the Boolean
    /// constants 0 and 1.
    Number(i64),

    Not(Box<Expression>),

    Nary(NaryOp, Vec<Expression>),

    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// A quantifier binding exactly one variable.
    Quantified(Quantifier, String, Box<Expression>),
}

impl fmt::Display for NaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            NaryOp::And => "&",
            NaryOp::Or => "|",
            NaryOp::Add => "+",
            NaryOp::Mul => "*",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinaryOp::Implies => "->",
            BinaryOp::Iff => "<->",
            BinaryOp::Equals => "=",
            BinaryOp::LessThan => "<",
            BinaryOp::Minus => "-",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Quantifier::Forall => write!(f, "forall"),
            Quantifier::Exists => write!(f, "exists"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

impl Expression {
    /// Binding strength, used to decide where the canonical form needs
    /// parentheses. Formula operators are below 7, term operators above.
    fn prec(&self) -> u8 {
        match self {
            Expression::Binary(BinaryOp::Iff, _, _) => 1,
            Expression::Binary(BinaryOp::Implies, _, _) => 2,
            Expression::Nary(NaryOp::Or, _) => 3,
            Expression::Nary(NaryOp::And, _) => 4,
            Expression::Not(_) | Expression::Quantified(_, _, _) => 5,
            Expression::Binary(BinaryOp::Equals, _, _)
            | Expression::Binary(BinaryOp::LessThan, _, _) => 6,
            Expression::Nary(NaryOp::Add, _) | Expression::Binary(BinaryOp::Minus, _, _) => 8,
            Expression::Nary(NaryOp::Mul, _) => 9,
            Expression::Predicate(_, _) | Expression::Ident(_) | Expression::Number(_) => 10,
        }
    }

    /// Writes the canonical form, parenthesizing when this node binds more
    /// loosely than the context requires. Reparsing the result yields a
    /// structurally equal tree.
    fn fmt_prec(&self, f: &mut fmt::Formatter, min_prec: u8) -> fmt::Result {
        if self.prec() < min_prec {
            write!(f, "(")?;
            self.fmt_prec(f, 0)?;
            return write!(f, ")");
        }
        match self {
            Expression::Predicate(name, args) => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        arg.fmt_prec(f, 0)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Expression::Ident(name) => write!(f, "{}", name),
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Not(inner) => {
                write!(f, "~")?;
                inner.fmt_prec(f, 5)
            }
            Expression::Nary(op, children) => {
                let child_min = self.prec() + 1;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op)?;
                    }
                    child.fmt_prec(f, child_min)?;
                }
                Ok(())
            }
            Expression::Binary(op, lhs, rhs) => {
                let (lhs_min, rhs_min) = match op {
                    // Implication is right-associative.
                    BinaryOp::Implies => (3, 2),
                    BinaryOp::Iff => (1, 2),
                    BinaryOp::Equals | BinaryOp::LessThan => (8, 8),
                    BinaryOp::Minus => (8, 9),
                };
                lhs.fmt_prec(f, lhs_min)?;
                write!(f, " {} ", op)?;
                rhs.fmt_prec(f, rhs_min)
            }
            Expression::Quantified(quant, var, body) => {
                write!(f, "{} {} ", quant, var)?;
                body.fmt_prec(f, 5)
            }
        }
    }

    /// Builds a conjunction, collapsing the single-element case.
    pub fn and(mut children: Vec<Expression>) -> Expression {
        if children.len() == 1 {
            children.pop().unwrap()
        } else {
            Expression::Nary(NaryOp::And, children)
        }
    }

    /// Builds a disjunction, collapsing the single-element case.
    pub fn or(mut children: Vec<Expression>) -> Expression {
        if children.len() == 1 {
            children.pop().unwrap()
        } else {
            Expression::Nary(NaryOp::Or, children)
        }
    }

    pub fn not(inner: Expression) -> Expression {
        Expression::Not(Box::new(inner))
    }

    pub fn implies(lhs: Expression, rhs: Expression) -> Expression {
        Expression::Binary(BinaryOp::Implies, Box::new(lhs), Box::new(rhs))
    }

    /// The conjuncts of a conjunction, or the expression itself.
    pub fn conjuncts(&self) -> Vec<&Expression> {
        match self {
            Expression::Nary(NaryOp::And, children) => children.iter().collect(),
            other => vec![other],
        }
    }

    /// The disjuncts of a disjunction, or the expression itself.
    pub fn disjuncts(&self) -> Vec<&Expression> {
        match self {
            Expression::Nary(NaryOp::Or, children) => children.iter().collect(),
            other => vec![other],
        }
    }

    /// All identifier names occurring free, with quantifier bindings
    /// respected. Constants show up here too; the tracker treats any name
    /// that appears unbound as used.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut bound = Vec::new();
        self.collect_free(&mut bound, &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
        match self {
            Expression::Ident(name) => {
                if !bound.iter().any(|b| b == name) {
                    out.insert(name.clone());
                }
            }
            Expression::Number(_) => {}
            Expression::Predicate(_, args) => {
                for arg in args {
                    arg.collect_free(bound, out);
                }
            }
            Expression::Not(inner) => inner.collect_free(bound, out),
            Expression::Nary(_, children) => {
                for child in children {
                    child.collect_free(bound, out);
                }
            }
            Expression::Binary(_, lhs, rhs) => {
                lhs.collect_free(bound, out);
                rhs.collect_free(bound, out);
            }
            Expression::Quantified(_, var, body) => {
                bound.push(var.clone());
                body.collect_free(bound, out);
                bound.pop();
            }
        }
    }

    /// All names bound by a quantifier anywhere in the tree.
    pub fn bound_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk(&mut |e| {
            if let Expression::Quantified(_, var, _) = e {
                out.insert(var.clone());
            }
        });
        out
    }

    /// Calls the visitor on every node, preorder.
    pub fn walk(&self, visit: &mut impl FnMut(&Expression)) {
        visit(self);
        match self {
            Expression::Predicate(_, args) => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expression::Not(inner) => inner.walk(visit),
            Expression::Nary(_, children) => {
                for child in children {
                    child.walk(visit);
                }
            }
            Expression::Binary(_, lhs, rhs) => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            Expression::Quantified(_, _, body) => body.walk(visit),
            Expression::Ident(_) | Expression::Number(_) => {}
        }
    }

    pub fn has_free(&self, name: &str) -> bool {
        self.free_variables().contains(name)
    }

    /// Replaces every free occurrence of `var` with `replacement`.
    ///
    /// This does not rename to avoid capture; callers that substitute a
    /// term with variables must check admissibility with `free_for` first.
    pub fn substitute(&self, var: &str, replacement: &Expression) -> Expression {
        match self {
            Expression::Ident(name) => {
                if name == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Expression::Number(_) => self.clone(),
            Expression::Predicate(name, args) => Expression::Predicate(
                name.clone(),
                args.iter().map(|a| a.substitute(var, replacement)).collect(),
            ),
            Expression::Not(inner) => Expression::not(inner.substitute(var, replacement)),
            Expression::Nary(op, children) => Expression::Nary(
                *op,
                children
                    .iter()
                    .map(|c| c.substitute(var, replacement))
                    .collect(),
            ),
            Expression::Binary(op, lhs, rhs) => Expression::Binary(
                *op,
                Box::new(lhs.substitute(var, replacement)),
                Box::new(rhs.substitute(var, replacement)),
            ),
            Expression::Quantified(quant, bound, body) => {
                if bound == var {
                    // The occurrences below here are not free.
                    self.clone()
                } else {
                    Expression::Quantified(
                        *quant,
                        bound.clone(),
                        Box::new(body.substitute(var, replacement)),
                    )
                }
            }
        }
    }

    /// True if substituting `term` for free occurrences of `var` would not
    /// capture any of the term's variables under a quantifier.
    pub fn free_for(&self, var: &str, term: &Expression) -> bool {
        let term_vars = term.free_variables();
        self.free_for_inner(var, &term_vars)
    }

    fn free_for_inner(&self, var: &str, term_vars: &BTreeSet<String>) -> bool {
        match self {
            Expression::Ident(_) | Expression::Number(_) => true,
            Expression::Predicate(_, args) => {
                args.iter().all(|a| a.free_for_inner(var, term_vars))
            }
            Expression::Not(inner) => inner.free_for_inner(var, term_vars),
            Expression::Nary(_, children) => {
                children.iter().all(|c| c.free_for_inner(var, term_vars))
            }
            Expression::Binary(_, lhs, rhs) => {
                lhs.free_for_inner(var, term_vars) && rhs.free_for_inner(var, term_vars)
            }
            Expression::Quantified(_, bound, body) => {
                if bound == var {
                    true
                } else if term_vars.contains(bound) && body.has_free(var) {
                    false
                } else {
                    body.free_for_inner(var, term_vars)
                }
            }
        }
    }

    /// Structural equality up to renaming of bound variables.
    pub fn alpha_eq(&self, other: &Expression) -> bool {
        self.alpha_eq_inner(other, &mut Vec::new())
    }

    fn alpha_eq_inner(&self, other: &Expression, pairs: &mut Vec<(String, String)>) -> bool {
        match (self, other) {
            (Expression::Ident(a), Expression::Ident(b)) => {
                // The innermost binding for either name decides.
                for (pa, pb) in pairs.iter().rev() {
                    if pa == a || pb == b {
                        return pa == a && pb == b;
                    }
                }
                a == b
            }
            (Expression::Number(a), Expression::Number(b)) => a == b,
            (Expression::Predicate(na, aa), Expression::Predicate(nb, ab)) => {
                na == nb
                    && aa.len() == ab.len()
                    && aa
                        .iter()
                        .zip(ab.iter())
                        .all(|(x, y)| x.alpha_eq_inner(y, pairs))
            }
            (Expression::Not(a), Expression::Not(b)) => a.alpha_eq_inner(b, pairs),
            (Expression::Nary(oa, ca), Expression::Nary(ob, cb)) => {
                oa == ob
                    && ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb.iter())
                        .all(|(x, y)| x.alpha_eq_inner(y, pairs))
            }
            (Expression::Binary(oa, la, ra), Expression::Binary(ob, lb, rb)) => {
                oa == ob && la.alpha_eq_inner(lb, pairs) && ra.alpha_eq_inner(rb, pairs)
            }
            (Expression::Quantified(qa, va, ba), Expression::Quantified(qb, vb, bb)) => {
                if qa != qb {
                    return false;
                }
                pairs.push((va.clone(), vb.clone()));
                let result = ba.alpha_eq_inner(bb, pairs);
                pairs.pop();
                result
            }
            _ => false,
        }
    }

    /// Normalizes arithmetic: flattens nested sums and products, folds
    /// their numeric parts, and drops neutral constants, so that 1 + 2
    /// compares equal to 3 and (n + 1) + 1 compares equal to n + 2. Used
    /// by the arithmetic-sequence rules. Logical operators are untouched.
    pub fn fold_numerals(&self) -> Expression {
        match self {
            Expression::Ident(_) | Expression::Number(_) => self.clone(),
            Expression::Predicate(name, args) => Expression::Predicate(
                name.clone(),
                args.iter().map(|a| a.fold_numerals()).collect(),
            ),
            Expression::Not(inner) => Expression::not(inner.fold_numerals()),
            Expression::Nary(op, children) => {
                let arithmetic = matches!(op, NaryOp::Add | NaryOp::Mul);
                let mut flat: Vec<Expression> = Vec::new();
                for child in children {
                    match child.fold_numerals() {
                        Expression::Nary(o2, cs) if arithmetic && o2 == *op => flat.extend(cs),
                        other => flat.push(other),
                    }
                }
                if !arithmetic {
                    return Expression::Nary(*op, flat);
                }
                let neutral: i64 = if *op == NaryOp::Add { 0 } else { 1 };
                let mut acc = neutral;
                let mut rest: Vec<Expression> = Vec::new();
                for c in flat {
                    match c {
                        Expression::Number(n) if *op == NaryOp::Add => acc += n,
                        Expression::Number(n) => acc *= n,
                        other => rest.push(other),
                    }
                }
                if rest.is_empty() {
                    return Expression::Number(acc);
                }
                if acc != neutral {
                    rest.push(Expression::Number(acc));
                }
                if rest.len() == 1 {
                    rest.pop().unwrap()
                } else {
                    Expression::Nary(*op, rest)
                }
            }
            Expression::Binary(op, lhs, rhs) => {
                let lhs = lhs.fold_numerals();
                let rhs = rhs.fold_numerals();
                if let (BinaryOp::Minus, Expression::Number(a), Expression::Number(b)) =
                    (op, &lhs, &rhs)
                {
                    return Expression::Number(a - b);
                }
                Expression::Binary(*op, Box::new(lhs), Box::new(rhs))
            }
            Expression::Quantified(quant, var, body) => {
                Expression::Quantified(*quant, var.clone(), Box::new(body.fold_numerals()))
            }
        }
    }
}

/// Checks whether `candidate` is `body` with every free occurrence of `var`
/// replaced by one consistent term, and returns that term.
///
/// Returns None on a structural mismatch. Returns Some(None) when the two
/// sides match exactly and `var` never occurs free, so any instantiating
/// term would do.
pub fn match_instantiation(
    body: &Expression,
    var: &str,
    candidate: &Expression,
) -> Option<Option<Expression>> {
    let mut witness: Option<Expression> = None;
    if match_inst_inner(body, var, candidate, false, &mut witness) {
        Some(witness)
    } else {
        None
    }
}

fn match_inst_inner(
    body: &Expression,
    var: &str,
    candidate: &Expression,
    shadowed: bool,
    witness: &mut Option<Expression>,
) -> bool {
    if !shadowed {
        if let Expression::Ident(name) = body {
            if name == var {
                return match witness {
                    Some(seen) => seen == candidate,
                    None => {
                        *witness = Some(candidate.clone());
                        true
                    }
                };
            }
        }
    }
    match (body, candidate) {
        (Expression::Ident(a), Expression::Ident(b)) => a == b,
        (Expression::Number(a), Expression::Number(b)) => a == b,
        (Expression::Predicate(na, aa), Expression::Predicate(nb, ab)) => {
            na == nb
                && aa.len() == ab.len()
                && aa
                    .iter()
                    .zip(ab.iter())
                    .all(|(x, y)| match_inst_inner(x, var, y, shadowed, witness))
        }
        (Expression::Not(a), Expression::Not(b)) => match_inst_inner(a, var, b, shadowed, witness),
        (Expression::Nary(oa, ca), Expression::Nary(ob, cb)) => {
            oa == ob
                && ca.len() == cb.len()
                && ca
                    .iter()
                    .zip(cb.iter())
                    .all(|(x, y)| match_inst_inner(x, var, y, shadowed, witness))
        }
        (Expression::Binary(oa, la, ra), Expression::Binary(ob, lb, rb)) => {
            oa == ob
                && match_inst_inner(la, var, lb, shadowed, witness)
                && match_inst_inner(ra, var, rb, shadowed, witness)
        }
        (Expression::Quantified(qa, va, ba), Expression::Quantified(qb, vb, bb)) => {
            qa == qb
                && va == vb
                && match_inst_inner(ba, var, bb, shadowed || va == var, witness)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expression {
        Expression::Ident(name.to_string())
    }

    fn pred(name: &str, args: Vec<Expression>) -> Expression {
        Expression::Predicate(name.to_string(), args)
    }

    #[test]
    fn test_substitute_respects_binding() {
        // forall x P(x) & Q(x): only the Q occurrence of x is free
        let expr = Expression::and(vec![
            Expression::Quantified(
                Quantifier::Forall,
                "x".to_string(),
                Box::new(pred("P", vec![ident("x")])),
            ),
            pred("Q", vec![ident("x")]),
        ]);
        let result = expr.substitute("x", &ident("a"));
        let expected = Expression::and(vec![
            Expression::Quantified(
                Quantifier::Forall,
                "x".to_string(),
                Box::new(pred("P", vec![ident("x")])),
            ),
            pred("Q", vec![ident("a")]),
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_free_variables() {
        let expr = Expression::Quantified(
            Quantifier::Forall,
            "x".to_string(),
            Box::new(pred("P", vec![ident("x"), ident("y")])),
        );
        let free = expr.free_variables();
        assert!(!free.contains("x"));
        assert!(free.contains("y"));
    }

    #[test]
    fn test_alpha_eq() {
        let a = Expression::Quantified(
            Quantifier::Forall,
            "x".to_string(),
            Box::new(pred("P", vec![ident("x")])),
        );
        let b = Expression::Quantified(
            Quantifier::Forall,
            "y".to_string(),
            Box::new(pred("P", vec![ident("y")])),
        );
        let c = Expression::Quantified(
            Quantifier::Forall,
            "y".to_string(),
            Box::new(pred("P", vec![ident("z")])),
        );
        assert!(a.alpha_eq(&b));
        assert!(!a.alpha_eq(&c));
    }

    #[test]
    fn test_free_for_detects_capture() {
        // exists y P(x, y): substituting y for x would capture
        let expr = Expression::Quantified(
            Quantifier::Exists,
            "y".to_string(),
            Box::new(pred("P", vec![ident("x"), ident("y")])),
        );
        assert!(!expr.free_for("x", &ident("y")));
        assert!(expr.free_for("x", &ident("z")));
    }

    #[test]
    fn test_match_instantiation_consistent() {
        let body = Expression::and(vec![
            pred("P", vec![ident("x")]),
            pred("Q", vec![ident("x")]),
        ]);
        let good = Expression::and(vec![
            pred("P", vec![ident("a")]),
            pred("Q", vec![ident("a")]),
        ]);
        let bad = Expression::and(vec![
            pred("P", vec![ident("a")]),
            pred("Q", vec![ident("b")]),
        ]);
        assert_eq!(match_instantiation(&body, "x", &good), Some(Some(ident("a"))));
        assert_eq!(match_instantiation(&body, "x", &bad), None);
    }

    #[test]
    fn test_fold_numerals() {
        // 1 + 2 folds to 3, n + 1 does not fold
        let sum = Expression::Nary(
            NaryOp::Add,
            vec![Expression::Number(1), Expression::Number(2)],
        );
        assert_eq!(sum.fold_numerals(), Expression::Number(3));
        let open = Expression::Nary(NaryOp::Add, vec![ident("n"), Expression::Number(1)]);
        assert_eq!(open.fold_numerals(), open);
    }
}
