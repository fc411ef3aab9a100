// End-to-end checks of Boolean-mode proofs: the restricted grammar and
// the Boolean rule group.

use crate::error::CheckError;
use crate::evaluator::evaluate_proof;
use crate::project::NoImports;
use crate::proof::{Proof, Verdict};
use crate::rules::Rule;
use crate::tests::common::{evaluate, verify_succeeds};

fn boolean_proof() -> Proof {
    let mut proof = Proof::new();
    proof.boolean_mode = true;
    proof
}

#[test]
fn test_boolean_simplification_chain() {
    let mut proof = boolean_proof();
    proof.add_premise("P & (Q | ~Q)");
    proof.add_line("P & 1", Rule::BooleanNegation, vec![1]);
    proof.add_line("P", Rule::BooleanIdentity, vec![2]);
    verify_succeeds(&mut proof);
}

#[test]
fn test_boolean_dominance_and_symbol_negation() {
    let mut proof = boolean_proof();
    proof.add_premise("Q | (P & 0)");
    proof.add_line("Q | 0", Rule::BooleanDominance, vec![1]);
    proof.add_line("Q", Rule::BooleanIdentity, vec![2]);
    proof.add_line("Q | ~1", Rule::SymbolNegation, vec![2]);
    verify_succeeds(&mut proof);
}

#[test]
fn test_shared_equivalence_rules_still_work() {
    let mut proof = boolean_proof();
    proof.add_premise("~(P & Q)");
    proof.add_line("~P | ~Q", Rule::DeMorgan, vec![1]);
    proof.add_line("~Q | ~P", Rule::Commutativity, vec![2]);
    verify_succeeds(&mut proof);
}

#[test]
fn test_boolean_grammar_rejects_arrows() {
    let mut proof = boolean_proof();
    proof.add_premise("P -> Q");
    let err = evaluate_proof(&mut proof, &NoImports).unwrap_err();
    match err {
        CheckError::ParseError { line, cause } => {
            assert_eq!(line, 1);
            assert_eq!(*cause, CheckError::UnknownSymbol("->".to_string()));
        }
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_boolean_constants_compare_structurally() {
    let mut proof = boolean_proof();
    proof.add_premise("P & 0");
    proof.add_line("0", Rule::BooleanDominance, vec![1]);
    proof.add_line("1", Rule::SymbolNegation, vec![2]);
    evaluate(&mut proof);
    assert_eq!(proof.lines[1].verdict, Verdict::Valid);
    // ~0 is 1, but 0 is not: the citation is 0 itself, not its negation.
    assert!(matches!(proof.lines[2].verdict, Verdict::Invalid(_)));
}
