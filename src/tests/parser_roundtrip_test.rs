// Round-trip and normalization properties of the sentence parser.

use crate::syntax::parser::{parse_sentence, Dialect};
use crate::syntax::token::validate;

const SENTENCES: &[&str] = &[
    "P",
    "~P",
    "~~P",
    "P & Q",
    "P & Q & R",
    "(P & Q) & R",
    "P | Q | (R & S)",
    "P -> Q -> R",
    "(P -> Q) -> R",
    "~(P | Q) <-> ~P & ~Q",
    "P <-> Q <-> R",
    "Likes(a, b)",
    "forall x P(x)",
    "forall x (P(x) -> exists y Likes(x, y))",
    "exists x forall y (Knows(x, y) | ~Knows(y, x))",
    "n + 1 = 2 * n",
    "s(n + 1) = s(n) + 2",
    "1 + 2 + 3 = 2 * 3",
    "n - 1 < n",
];

#[test]
fn test_round_trip_stability() {
    for text in SENTENCES {
        let once = parse_sentence(text, Dialect::Predicate).unwrap();
        let formatted = once.to_string();
        let again = parse_sentence(&formatted, Dialect::Predicate)
            .unwrap_or_else(|e| panic!("reparsing '{}' failed: {}", formatted, e));
        assert_eq!(once, again, "round trip changed '{}' via '{}'", text, formatted);
    }
}

#[test]
fn test_whitespace_is_insignificant() {
    for (a, b) in [
        ("P&Q", "P   &   Q"),
        ("forall x P(x)", "forall  x  P( x )"),
        ("n+1=2", "n + 1 = 2"),
    ] {
        let left = parse_sentence(a, Dialect::Predicate).unwrap();
        let right = parse_sentence(b, Dialect::Predicate).unwrap();
        assert_eq!(left, right);
    }
}

#[test]
fn test_unicode_spellings_parse_alike() {
    for (ascii, unicode) in [
        ("~P & Q", "¬P ∧ Q"),
        ("P | Q -> R", "P ∨ Q → R"),
        ("P <-> Q", "P ↔ Q"),
        ("forall x exists y Likes(x, y)", "∀x ∃y Likes(x, y)"),
    ] {
        let left = parse_sentence(ascii, Dialect::Predicate).unwrap();
        let right = parse_sentence(unicode, Dialect::Predicate).unwrap();
        assert_eq!(left, right);
    }
}

#[test]
fn test_validate_agrees_with_parsing() {
    // Everything parseable passes the cheap check.
    for text in SENTENCES {
        assert!(validate(text), "validate rejected parseable '{}'", text);
    }
    // The cheap check catches what it promises to catch.
    for text in ["(P & Q", "P))", "P @ Q", "P # Q"] {
        assert!(!validate(text));
        assert!(parse_sentence(text, Dialect::Predicate).is_err());
    }
    // But it is weaker than the parser by design.
    assert!(validate("P &"));
    assert!(parse_sentence("P &", Dialect::Predicate).is_err());
}
