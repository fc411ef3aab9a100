use serde::{Deserialize, Serialize};

use crate::error::CheckError;
use crate::syntax::expression::{BinaryOp, Expression, NaryOp, Quantifier};
use crate::syntax::token::{tokenize, TokenIter, TokenType};

/// Which grammar a sentence is parsed under.
///
/// The Boolean dialect is a strict subset of the predicate dialect: no
/// quantifiers, no implication or biconditional arrows. The constants 0
/// and 1 are ordinary numerals in both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    Predicate,
    Boolean,
}

/// Parses sentence text into its symbolic form.
///
/// Precedence, loosest first: IFF, IMPLIES, OR, AND, NOT. Chains of `&` and
/// `|` (and `+`, `*` in terms) collapse into one n-ary node. Quantifiers
/// bind one variable and scope over the unary expression that follows.
pub fn parse_sentence(text: &str, dialect: Dialect) -> Result<Expression, CheckError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(CheckError::MalformedSentence("empty sentence".to_string()));
    }
    let mut iter = TokenIter::new(tokens);
    let expr = parse_iff(&mut iter, dialect)?;
    if let Some(extra) = iter.peek() {
        return Err(CheckError::MalformedSentence(format!(
            "unexpected '{}' at position {}",
            extra.text, extra.pos
        )));
    }
    Ok(expr)
}

fn reject_in_boolean(dialect: Dialect, symbol: &str) -> Result<(), CheckError> {
    if dialect == Dialect::Boolean {
        Err(CheckError::UnknownSymbol(symbol.to_string()))
    } else {
        Ok(())
    }
}

fn parse_iff(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    let mut lhs = parse_implies(iter, dialect)?;
    while iter.peek_type() == Some(TokenType::Iff) {
        reject_in_boolean(dialect, "<->")?;
        iter.next();
        let rhs = parse_implies(iter, dialect)?;
        lhs = Expression::Binary(BinaryOp::Iff, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_implies(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    let lhs = parse_or(iter, dialect)?;
    if iter.peek_type() == Some(TokenType::Implies) {
        reject_in_boolean(dialect, "->")?;
        iter.next();
        // Right-associative: A -> B -> C is A -> (B -> C).
        let rhs = parse_implies(iter, dialect)?;
        return Ok(Expression::implies(lhs, rhs));
    }
    Ok(lhs)
}

fn parse_or(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    let mut children = vec![parse_and(iter, dialect)?];
    while iter.consume(TokenType::Or) {
        children.push(parse_and(iter, dialect)?);
    }
    Ok(Expression::or(children))
}

fn parse_and(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    let mut children = vec![parse_unary(iter, dialect)?];
    while iter.consume(TokenType::And) {
        children.push(parse_unary(iter, dialect)?);
    }
    Ok(Expression::and(children))
}

fn parse_unary(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    match iter.peek_type() {
        Some(TokenType::Not) => {
            iter.next();
            Ok(Expression::not(parse_unary(iter, dialect)?))
        }
        Some(TokenType::Forall) | Some(TokenType::Exists) => {
            let token = iter.next().unwrap();
            reject_in_boolean(dialect, &token.text)?;
            let quant = if token.token_type == TokenType::Forall {
                Quantifier::Forall
            } else {
                Quantifier::Exists
            };
            let var = iter.expect(TokenType::Identifier)?;
            let body = parse_unary(iter, dialect)?;
            Ok(Expression::Quantified(quant, var.text, Box::new(body)))
        }
        _ => parse_atom(iter, dialect),
    }
}

fn parse_atom(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    match iter.peek_type() {
        Some(TokenType::LeftParen) => {
            iter.next();
            let expr = parse_iff(iter, dialect)?;
            iter.expect(TokenType::RightParen)?;
            Ok(expr)
        }
        Some(TokenType::Identifier) => {
            let name = iter.next().unwrap().text;
            let head = if iter.peek_type() == Some(TokenType::LeftParen) {
                parse_application(iter, dialect, name)?
            } else {
                match iter.peek_type() {
                    // A bare identifier followed by a term operator or a
                    // relation starts an arithmetic sentence.
                    Some(TokenType::Plus)
                    | Some(TokenType::Minus)
                    | Some(TokenType::Times)
                    | Some(TokenType::Equals)
                    | Some(TokenType::LessThan) => Expression::Ident(name),
                    // Otherwise it is an atomic predicate.
                    _ => return Ok(Expression::Predicate(name, vec![])),
                }
            };
            if starts_term_continuation(iter) {
                parse_relation_after(iter, dialect, head)
            } else {
                Ok(head)
            }
        }
        Some(TokenType::Number) => {
            let primary = parse_number(iter)?;
            if starts_term_continuation(iter) {
                parse_relation_after(iter, dialect, primary)
            } else {
                // A bare numeral: the Boolean constants 0 and 1.
                Ok(primary)
            }
        }
        Some(_) => {
            let token = iter.next().unwrap();
            Err(CheckError::MalformedSentence(format!(
                "expected a sentence but found '{}' at position {}",
                token.text, token.pos
            )))
        }
        None => Err(CheckError::MalformedSentence(
            "expected a sentence but the text ended".to_string(),
        )),
    }
}

/// Parses `name(term, term, ...)` with the name already consumed.
fn parse_application(
    iter: &mut TokenIter,
    dialect: Dialect,
    name: String,
) -> Result<Expression, CheckError> {
    iter.expect(TokenType::LeftParen)?;
    let mut args = vec![parse_term(iter, dialect)?];
    while iter.consume(TokenType::Comma) {
        args.push(parse_term(iter, dialect)?);
    }
    iter.expect(TokenType::RightParen)?;
    Ok(Expression::Predicate(name, args))
}

fn starts_term_continuation(iter: &TokenIter) -> bool {
    matches!(
        iter.peek_type(),
        Some(TokenType::Plus)
            | Some(TokenType::Minus)
            | Some(TokenType::Times)
            | Some(TokenType::Equals)
            | Some(TokenType::LessThan)
    )
}

/// With the left-hand primary already parsed, finishes the term and then
/// requires a relation and a right-hand term.
fn parse_relation_after(
    iter: &mut TokenIter,
    dialect: Dialect,
    primary: Expression,
) -> Result<Expression, CheckError> {
    let lhs = continue_term(iter, dialect, primary)?;
    let op = match iter.peek_type() {
        Some(TokenType::Equals) => BinaryOp::Equals,
        Some(TokenType::LessThan) => BinaryOp::LessThan,
        _ => {
            return Err(CheckError::MalformedSentence(
                "expected '=' or '<' after an arithmetic term".to_string(),
            ));
        }
    };
    iter.next();
    let rhs = parse_term(iter, dialect)?;
    Ok(Expression::Binary(op, Box::new(lhs), Box::new(rhs)))
}

fn parse_term(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    let primary = parse_term_primary(iter, dialect)?;
    continue_term(iter, dialect, primary)
}

/// Finishes multiplicative then additive continuations of a term whose
/// first primary is already parsed. Chains of + and * flatten.
fn continue_term(
    iter: &mut TokenIter,
    dialect: Dialect,
    primary: Expression,
) -> Result<Expression, CheckError> {
    let mut expr = continue_factor(iter, dialect, primary)?;
    loop {
        if iter.consume(TokenType::Plus) {
            let rhs = parse_term_factor(iter, dialect)?;
            expr = match expr {
                Expression::Nary(NaryOp::Add, mut children) => {
                    children.push(rhs);
                    Expression::Nary(NaryOp::Add, children)
                }
                other => Expression::Nary(NaryOp::Add, vec![other, rhs]),
            };
        } else if iter.consume(TokenType::Minus) {
            let rhs = parse_term_factor(iter, dialect)?;
            expr = Expression::Binary(BinaryOp::Minus, Box::new(expr), Box::new(rhs));
        } else {
            return Ok(expr);
        }
    }
}

fn parse_term_factor(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    let primary = parse_term_primary(iter, dialect)?;
    continue_factor(iter, dialect, primary)
}

fn continue_factor(
    iter: &mut TokenIter,
    dialect: Dialect,
    primary: Expression,
) -> Result<Expression, CheckError> {
    let mut expr = primary;
    while iter.consume(TokenType::Times) {
        let rhs = parse_term_primary(iter, dialect)?;
        expr = match expr {
            Expression::Nary(NaryOp::Mul, mut children) => {
                children.push(rhs);
                Expression::Nary(NaryOp::Mul, children)
            }
            other => Expression::Nary(NaryOp::Mul, vec![other, rhs]),
        };
    }
    Ok(expr)
}

fn parse_term_primary(iter: &mut TokenIter, dialect: Dialect) -> Result<Expression, CheckError> {
    match iter.peek_type() {
        Some(TokenType::Number) => parse_number(iter),
        Some(TokenType::Identifier) => {
            let name = iter.next().unwrap().text;
            if iter.peek_type() == Some(TokenType::LeftParen) {
                parse_application(iter, dialect, name)
            } else {
                Ok(Expression::Ident(name))
            }
        }
        Some(TokenType::LeftParen) => {
            iter.next();
            let term = parse_term(iter, dialect)?;
            iter.expect(TokenType::RightParen)?;
            Ok(term)
        }
        Some(_) => {
            let token = iter.next().unwrap();
            Err(CheckError::MalformedSentence(format!(
                "expected a term but found '{}' at position {}",
                token.text, token.pos
            )))
        }
        None => Err(CheckError::MalformedSentence(
            "expected a term but the text ended".to_string(),
        )),
    }
}

fn parse_number(iter: &mut TokenIter) -> Result<Expression, CheckError> {
    let token = iter.expect(TokenType::Number)?;
    let value: i64 = token.text.parse().map_err(|_| {
        CheckError::MalformedSentence(format!("numeral '{}' is out of range", token.text))
    })?;
    Ok(Expression::Number(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Expression {
        parse_sentence(text, Dialect::Predicate).unwrap()
    }

    #[test]
    fn test_precedence() {
        // NOT binds tighter than AND, AND tighter than OR, OR tighter than IMPLIES
        let expr = parse("~P & Q | R -> S");
        let expected = Expression::implies(
            Expression::or(vec![
                Expression::and(vec![
                    Expression::not(Expression::Predicate("P".to_string(), vec![])),
                    Expression::Predicate("Q".to_string(), vec![]),
                ]),
                Expression::Predicate("R".to_string(), vec![]),
            ]),
            Expression::Predicate("S".to_string(), vec![]),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_and_chain_flattens() {
        let expr = parse("P & Q & R");
        match expr {
            Expression::Nary(NaryOp::And, children) => assert_eq!(children.len(), 3),
            other => panic!("expected a flat conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_group_stays_nested() {
        let flat = parse("P & Q & R");
        let nested = parse("(P & Q) & R");
        assert_ne!(flat, nested);
    }

    #[test]
    fn test_nested_quantifiers() {
        let expr = parse("forall x exists y Likes(x, y)");
        match expr {
            Expression::Quantified(Quantifier::Forall, x, body) => {
                assert_eq!(x, "x");
                match *body {
                    Expression::Quantified(Quantifier::Exists, y, _) => assert_eq!(y, "y"),
                    other => panic!("expected nested quantifier, got {:?}", other),
                }
            }
            other => panic!("expected quantifier, got {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_relation() {
        let expr = parse("n + 1 = 2 * n");
        match expr {
            Expression::Binary(BinaryOp::Equals, lhs, rhs) => {
                assert!(matches!(*lhs, Expression::Nary(NaryOp::Add, _)));
                assert!(matches!(*rhs, Expression::Nary(NaryOp::Mul, _)));
            }
            other => panic!("expected equation, got {:?}", other),
        }
    }

    #[test]
    fn test_boolean_dialect_rejects_arrows() {
        assert_eq!(
            parse_sentence("P -> Q", Dialect::Boolean),
            Err(CheckError::UnknownSymbol("->".to_string()))
        );
        assert_eq!(
            parse_sentence("P <-> Q", Dialect::Boolean),
            Err(CheckError::UnknownSymbol("<->".to_string()))
        );
        assert_eq!(
            parse_sentence("forall x P(x)", Dialect::Boolean),
            Err(CheckError::UnknownSymbol("forall".to_string()))
        );
    }

    #[test]
    fn test_boolean_dialect_accepts_constants() {
        let expr = parse_sentence("P & 1 | 0", Dialect::Boolean).unwrap();
        let expected = Expression::or(vec![
            Expression::and(vec![
                Expression::Predicate("P".to_string(), vec![]),
                Expression::Number(1),
            ]),
            Expression::Number(0),
        ]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_malformed_sentences() {
        assert!(matches!(
            parse_sentence("", Dialect::Predicate),
            Err(CheckError::MalformedSentence(_))
        ));
        assert!(matches!(
            parse_sentence("P &", Dialect::Predicate),
            Err(CheckError::MalformedSentence(_))
        ));
        assert!(matches!(
            parse_sentence("(P & Q", Dialect::Predicate),
            Err(CheckError::MalformedSentence(_))
        ));
        assert!(matches!(
            parse_sentence("P Q", Dialect::Predicate),
            Err(CheckError::MalformedSentence(_))
        ));
    }

    #[test]
    fn test_round_trip_is_stable() {
        for text in [
            "P -> Q",
            "~(P | Q) <-> ~P & ~Q",
            "(P & Q) & R",
            "forall x (P(x) -> exists y Likes(x, y))",
            "n + 1 = 2 * n - 1",
            "P & Q & (R | S)",
        ] {
            let once = parse(text);
            let again = parse(&once.to_string());
            assert_eq!(once, again, "round trip changed {}", text);
        }
    }
}
