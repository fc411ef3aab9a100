use std::path::PathBuf;

use crate::error::CheckError;
use crate::evaluator::{check_goals, evaluate_proof, GoalStatus, ProofSummary};
use crate::project::{read_proof, Project};
use crate::proof::Verdict;

/// The overall result of a verification run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyStatus {
    /// Every line checked out.
    Good,

    /// At least one line was invalid or errored.
    Bad,

    /// Evaluation could not finish: a line failed to parse.
    Aborted,
}

/// One line's outcome, for display.
#[derive(Clone, Debug)]
pub struct LineReport {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    pub verdict: Verdict,
}

/// Output from running the verifier.
#[derive(Debug)]
pub struct VerifierOutput {
    /// The overall status of the run.
    pub status: VerifyStatus,

    /// Per-line outcomes, in document order.
    pub events: Vec<LineReport>,

    /// Goal statuses, when goal checking was requested.
    pub goals: Vec<GoalStatus>,

    /// Counts from the evaluation pass, when it finished.
    pub summary: Option<ProofSummary>,

    /// The abort error, when the run did not finish.
    pub abort: Option<CheckError>,
}

impl VerifierOutput {
    pub fn is_success(&self) -> bool {
        self.status == VerifyStatus::Good
    }
}

/// The Verifier runs whole-proof evaluation over one saved proof file.
pub struct Verifier {
    /// The proof file to check.
    path: PathBuf,

    /// Whether to also check the proof's goal list.
    pub include_goals: bool,
}

impl Verifier {
    pub fn new(path: PathBuf) -> Verifier {
        Verifier {
            path,
            include_goals: true,
        }
    }

    /// Returns VerifierOutput, or an error string if the file could not
    /// be loaded at all.
    pub fn run(&self) -> Result<VerifierOutput, String> {
        let mut proof = read_proof(&self.path)?;

        // Imports resolve relative to the proof file's directory.
        let root = self
            .path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let project = Project::new_local(root);

        match evaluate_proof(&mut proof, &project) {
            Ok(summary) => {
                let events = collect_events(&proof);
                let goals = if self.include_goals {
                    check_goals(&mut proof).unwrap_or_default()
                } else {
                    Vec::new()
                };
                let all_goals_met = goals.iter().all(|g| g.met);
                let status = if summary.is_success() && all_goals_met {
                    VerifyStatus::Good
                } else {
                    VerifyStatus::Bad
                };
                Ok(VerifierOutput {
                    status,
                    events,
                    goals,
                    summary: Some(summary),
                    abort: None,
                })
            }
            Err(e) => Ok(VerifierOutput {
                status: VerifyStatus::Aborted,
                events: collect_events(&proof),
                goals: Vec::new(),
                summary: None,
                abort: Some(e),
            }),
        }
    }
}

fn collect_events(proof: &crate::proof::Proof) -> Vec<LineReport> {
    proof
        .lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_blank())
        .map(|(i, line)| LineReport {
            line: i + 1,
            text: line.text.clone(),
            verdict: line.verdict.clone(),
        })
        .collect()
}
