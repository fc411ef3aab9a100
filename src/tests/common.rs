use crate::evaluator::{evaluate_proof, ProofSummary};
use crate::project::NoImports;
use crate::proof::{Proof, Verdict};

/// Evaluates the whole proof with no imports available, panicking on a
/// parse abort.
pub fn evaluate(proof: &mut Proof) -> ProofSummary {
    evaluate_proof(proof, &NoImports).expect("evaluation aborted")
}

/// Expects every line of the proof to check out.
pub fn verify_succeeds(proof: &mut Proof) {
    let summary = evaluate(proof);
    if !summary.is_success() {
        let lines: Vec<String> = proof
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| format!("line {}: {} -- {}", i + 1, l.text, l.verdict))
            .collect();
        panic!(
            "expected the proof to verify, but it did not:\n{}",
            lines.join("\n")
        );
    }
}

/// Expects the given 1-based line to fail, with every earlier line fine.
pub fn verify_fails_at(proof: &mut Proof, line_number: usize) {
    evaluate(proof);
    for (i, line) in proof.lines.iter().enumerate() {
        if line.is_blank() {
            continue;
        }
        let ok = line.verdict == Verdict::Valid;
        if i + 1 < line_number {
            assert!(ok, "line {} should be valid: {}", i + 1, line.verdict);
        } else if i + 1 == line_number {
            assert!(!ok, "line {} should not be valid", line_number);
        }
    }
}
