use tracing::debug;

use crate::context::{context_for, parse_pending, ScopeTree};
use crate::error::CheckError;
use crate::project::ProofLoader;
use crate::proof::{LineRef, Proof, Verdict};
use crate::rules::{verify, ImportSummary, Rule, RuleContext, RuleFailure};
use crate::syntax::expression::Expression;
use crate::syntax::parser::parse_sentence;
use crate::tracker::VariableTracker;

/// Counts from a whole-proof evaluation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProofSummary {
    pub evaluated: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
}

impl ProofSummary {
    pub fn is_success(&self) -> bool {
        self.invalid == 0 && self.errors == 0
    }
}

/// Whether a goal sentence has been reached by a valid top-level line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalStatus {
    pub text: String,
    pub met: bool,
}

/// Evaluates a single line, returning its verdict and recording it on the
/// line. Parse failures on other lines do not block this; lines that fail
/// to parse simply are not usable as justification.
///
/// Taking the proof by `&mut` is what enforces the one-evaluation-at-a-time
/// rule: two concurrent passes over the same document cannot be expressed.
/// Separate documents share nothing and may be evaluated in parallel.
pub fn evaluate_line(proof: &mut Proof, index: usize, loader: &dyn ProofLoader) -> Verdict {
    if index >= proof.lines.len() {
        return Verdict::Unevaluated;
    }
    // Lenient pass: parse what parses, leave the rest uncached.
    let dialect = proof.dialect();
    for j in 0..=index {
        let line = &mut proof.lines[j];
        if line.expression.is_none() && !line.is_blank() {
            if let Ok(expr) = parse_sentence(&line.text, dialect) {
                line.expression = Some(expr);
            }
        }
    }
    let tree = ScopeTree::build(proof);
    let mut active = Vec::new();
    let verdict = evaluate_at(proof, &tree, index, loader, &mut active);
    proof.lines[index].verdict = verdict.clone();
    verdict
}

/// Evaluates every line in document order, aborting at the first line
/// whose text is non-empty and unparseable. On abort the offending line
/// and everything after it stay unevaluated, and the error names the
/// 1-based line number.
pub fn evaluate_proof(
    proof: &mut Proof,
    loader: &dyn ProofLoader,
) -> Result<ProofSummary, CheckError> {
    let mut active = Vec::new();
    evaluate_proof_inner(proof, loader, &mut active)
}

fn evaluate_proof_inner(
    proof: &mut Proof,
    loader: &dyn ProofLoader,
    active: &mut Vec<String>,
) -> Result<ProofSummary, CheckError> {
    for line in &mut proof.lines {
        line.verdict = Verdict::Unevaluated;
    }
    let tree = ScopeTree::build(proof);
    let mut summary = ProofSummary::default();

    for index in 0..proof.lines.len() {
        if proof.lines[index].is_blank() {
            continue;
        }
        // Fail fast: a line that cannot be parsed stops the whole run.
        parse_pending(proof, index + 1)?;

        let verdict = evaluate_at(proof, &tree, index, loader, active);
        summary.evaluated += 1;
        match &verdict {
            Verdict::Valid => summary.valid += 1,
            Verdict::Invalid(_) => summary.invalid += 1,
            Verdict::Error(_) => summary.errors += 1,
            Verdict::Unevaluated => {}
        }
        proof.lines[index].verdict = verdict;
    }
    Ok(summary)
}

/// The per-line check. Lines before `index` are parsed as far as they can
/// be; the scope tree is the caller's, built once per pass.
fn evaluate_at(
    proof: &Proof,
    tree: &ScopeTree,
    index: usize,
    loader: &dyn ProofLoader,
    active: &mut Vec<String>,
) -> Verdict {
    let line = &proof.lines[index];

    let Some(conclusion) = line.expression.as_ref() else {
        return match parse_sentence(&line.text, proof.dialect()) {
            Err(e) => Verdict::Error(e),
            // Unreachable when callers parse first; be safe anyway.
            Ok(_) => Verdict::Unevaluated,
        };
    };

    // Assumptions are accepted as given.
    if line.is_assumption() {
        return Verdict::Valid;
    }

    let Some(rule) = line.rule else {
        return Verdict::Invalid("no rule selected".to_string());
    };

    debug!(line = index + 1, rule = rule.id(), "checking line");

    // The tracker sees every parsed line before this one, visible or not.
    let mut tracker = VariableTracker::new();
    for prior in proof.lines.iter().take(index) {
        if let Some(expr) = &prior.expression {
            tracker.observe_expression(expr);
        }
    }

    let visible = context_for(proof, tree, index);

    // Resolve the cited lines.
    let mut cited: Vec<usize> = Vec::new();
    for r in &line.refs {
        match r {
            LineRef::Line(n) => match proof.line_index(*n) {
                Some(j) if j < index => cited.push(j),
                _ => {
                    return Verdict::Invalid(format!(
                        "cited line {} does not precede this line",
                        r
                    ));
                }
            },
            LineRef::Import => {}
        }
    }
    cited.sort_unstable();

    // The Subproof rule cites a closed subproof, which ordinary visibility
    // forbids; it gets its own scoping check instead.
    if rule == Rule::Subproof {
        if cited.len() == 2 && !tree.cites_closed_child(cited[0], cited[1], index) {
            return Verdict::Invalid(
                "must cite the assumption and a line of a subproof closed directly below this line"
                    .to_string(),
            );
        }
    } else {
        for &j in &cited {
            if !tree.is_visible(j, index) {
                return Verdict::Invalid(format!(
                    "line {} is inside a subproof closed before this line",
                    j + 1
                ));
            }
        }
    }

    let mut antecedents: Vec<&Expression> = Vec::new();
    for &j in &cited {
        let cited_line = &proof.lines[j];
        if cited_line.is_blank() {
            return Verdict::Invalid(format!("cited line {} is blank", j + 1));
        }
        match cited_line.expression.as_ref() {
            Some(expr) => antecedents.push(expr),
            None => {
                // The cited line failed to parse; surface its error.
                return match parse_sentence(&cited_line.text, proof.dialect()) {
                    Err(e) => Verdict::Error(e.at_line(j + 1)),
                    Ok(_) => Verdict::Unevaluated,
                };
            }
        }
    }

    // Resolve the linked proof for the Lemma rule.
    let import = if rule == Rule::Lemma {
        let Some(name) = line.linked.as_deref() else {
            return Verdict::Error(CheckError::ImportResolutionFailure {
                name: "<none>".to_string(),
                reason: "no linked proof is attached to this line".to_string(),
            });
        };
        match resolve_import(name, loader, active) {
            Ok(summary) => Some(summary),
            Err(e) => return Verdict::Error(e),
        }
    } else {
        None
    };

    let ctx = RuleContext {
        conclusion,
        antecedents,
        visible: &visible,
        tracker: &tracker,
        import: import.as_ref(),
    };
    match verify(rule, &ctx) {
        Ok(()) => Verdict::Valid,
        Err(RuleFailure::NotSatisfied(message)) => Verdict::Invalid(message),
        Err(RuleFailure::Error(e)) => Verdict::Error(e),
    }
}

/// Loads and recursively evaluates a linked proof, producing the premises
/// and conclusions the Lemma rule matches against. A linked proof that
/// does not verify, or that links back into a proof currently being
/// evaluated, is an import failure.
fn resolve_import(
    name: &str,
    loader: &dyn ProofLoader,
    active: &mut Vec<String>,
) -> Result<ImportSummary, CheckError> {
    if active.iter().any(|n| n == name) {
        return Err(CheckError::ImportResolutionFailure {
            name: name.to_string(),
            reason: "circular import".to_string(),
        });
    }
    let mut imported = loader.load(name)?;
    debug!(name, lines = imported.lines.len(), "evaluating linked proof");

    active.push(name.to_string());
    let result = evaluate_proof_inner(&mut imported, loader, active);
    active.pop();

    let summary = result.map_err(|e| CheckError::ImportResolutionFailure {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    if !summary.is_success() {
        return Err(CheckError::ImportResolutionFailure {
            name: name.to_string(),
            reason: "the linked proof does not verify".to_string(),
        });
    }

    let mut premises = Vec::new();
    let mut conclusions = Vec::new();
    for line in &imported.lines {
        if line.depth != 0 || line.is_blank() {
            continue;
        }
        let Some(expr) = &line.expression else {
            continue;
        };
        if line.premise {
            premises.push(expr.clone());
        } else if line.verdict.is_valid() {
            conclusions.push(expr.clone());
        }
    }
    Ok(ImportSummary {
        premises,
        conclusions,
    })
}

/// Checks each goal sentence against the evaluated proof: a goal is met
/// when some valid top-level line states it.
pub fn check_goals(proof: &mut Proof) -> Result<Vec<GoalStatus>, CheckError> {
    let dialect = proof.dialect();
    parse_pending(proof, proof.lines.len())?;
    let mut statuses = Vec::new();
    for goal in &proof.goals {
        let goal_expr = parse_sentence(goal, dialect)?;
        let met = proof.lines.iter().any(|line| {
            line.depth == 0
                && (line.is_assumption() || line.verdict.is_valid())
                && line.expression.as_ref() == Some(&goal_expr)
        });
        statuses.push(GoalStatus {
            text: goal.clone(),
            met,
        });
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::NoImports;
    use crate::rules::Rule;

    #[test]
    fn test_modus_ponens_proof() {
        let mut proof = Proof::new();
        proof.add_premise("P -> Q");
        proof.add_premise("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);

        let summary = evaluate_proof(&mut proof, &NoImports).unwrap();
        assert_eq!(summary.valid, 3);
        assert!(summary.is_success());
        assert_eq!(proof.lines[2].verdict, Verdict::Valid);
    }

    #[test]
    fn test_idempotent_re_evaluation() {
        let mut proof = Proof::new();
        proof.add_premise("P -> Q");
        proof.add_premise("Q");
        proof.add_line("P", Rule::ModusPonens, vec![1, 2]);

        let first = evaluate_line(&mut proof, 2, &NoImports);
        let second = evaluate_line(&mut proof, 2, &NoImports);
        assert_eq!(first, second);
        assert!(matches!(first, Verdict::Invalid(_)));
    }

    #[test]
    fn test_whole_proof_aborts_on_parse_error() {
        let mut proof = Proof::new();
        proof.add_premise("P");
        proof.add_premise("Q");
        proof.add_line("R & ", Rule::Conjunction, vec![1, 2]);
        proof.add_line("P & Q", Rule::Conjunction, vec![1, 2]);

        let err = evaluate_proof(&mut proof, &NoImports).unwrap_err();
        match err {
            CheckError::ParseError { line, .. } => assert_eq!(line, 3),
            other => panic!("expected ParseError, got {:?}", other),
        }
        // Lines after the failure stay unevaluated.
        assert_eq!(proof.lines[3].verdict, Verdict::Unevaluated);
        // Lines before it were evaluated normally.
        assert_eq!(proof.lines[0].verdict, Verdict::Valid);
    }

    #[test]
    fn test_no_rule_selected() {
        let mut proof = Proof::new();
        proof.add_premise("P");
        let mut line = crate::proof::ProofLine::new("P | Q");
        line.refs = vec![LineRef::Line(1)];
        proof.lines.push(line);

        let verdict = evaluate_line(&mut proof, 1, &NoImports);
        assert_eq!(verdict, Verdict::Invalid("no rule selected".to_string()));
    }

    #[test]
    fn test_variable_conflict_across_lines() {
        // Line 2 generalizes over y; line 4 then tries to instantiate the
        // existential with y, which is no longer fresh.
        let mut proof = Proof::new();
        proof.add_premise("P(y)");
        proof.add_line("forall x P(x)", Rule::UniversalGeneralization, vec![1]);
        proof.add_premise("exists x Q(x)");
        proof.add_line("Q(y)", Rule::ExistentialInstantiation, vec![3]);

        let summary = evaluate_proof(&mut proof, &NoImports).unwrap();
        assert_eq!(summary.errors, 1);
        match &proof.lines[3].verdict {
            Verdict::Error(CheckError::InvalidVariableUse { name, .. }) => {
                assert_eq!(name, "y");
            }
            other => panic!("expected InvalidVariableUse, got {:?}", other),
        }
    }

    #[test]
    fn test_subproof_discharge() {
        let mut proof = Proof::new();
        proof.add_premise("P -> Q");
        proof.begin_subproof("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);
        proof.end_subproof();
        proof.add_line("P -> Q", Rule::Subproof, vec![2, 3]);

        let summary = evaluate_proof(&mut proof, &NoImports).unwrap();
        assert!(summary.is_success(), "{:?}", proof.lines);
    }

    #[test]
    fn test_closed_subproof_lines_are_not_citable() {
        let mut proof = Proof::new();
        proof.add_premise("P -> Q");
        proof.begin_subproof("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);
        proof.end_subproof();
        // Tries to reuse the subproof's conclusion directly outside it.
        proof.add_line("Q | R", Rule::Addition, vec![3]);

        evaluate_proof(&mut proof, &NoImports).unwrap();
        assert!(matches!(proof.lines[3].verdict, Verdict::Invalid(_)));
    }

    #[test]
    fn test_goal_checking() {
        let mut proof = Proof::new();
        proof.goals.push("Q".to_string());
        proof.goals.push("R".to_string());
        proof.add_premise("P -> Q");
        proof.add_premise("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);

        evaluate_proof(&mut proof, &NoImports).unwrap();
        let goals = check_goals(&mut proof).unwrap();
        assert_eq!(goals[0].met, true);
        assert_eq!(goals[1].met, false);
    }
}
