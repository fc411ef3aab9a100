use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CheckError;
use crate::rules::Rule;
use crate::syntax::expression::Expression;
use crate::syntax::parser::Dialect;

/// A justification a line cites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineRef {
    /// A 1-based line number, as the user sees it.
    Line(usize),

    /// The line's linked proof, for the Lemma rule.
    Import,
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LineRef::Line(n) => write!(f, "{}", n),
            LineRef::Import => write!(f, "import"),
        }
    }
}

/// The outcome of evaluating one line.
///
/// `Unevaluated` is the state before any evaluation and after any edit.
/// Rule failures that mean "the rule doesn't apply" are `Invalid` with an
/// explanation; conditions the front end should present differently
/// (bad reference counts, variable misuse, parse failures, import
/// problems) are `Error`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Verdict {
    #[default]
    Unevaluated,
    Valid,
    Invalid(String),
    Error(CheckError),
}

impl Verdict {
    /// The tri-state computed value: None before evaluation, true for a
    /// valid line, false otherwise.
    pub fn value(&self) -> Option<bool> {
        match self {
            Verdict::Unevaluated => None,
            Verdict::Valid => Some(true),
            Verdict::Invalid(_) | Verdict::Error(_) => Some(false),
        }
    }

    pub fn is_valid(&self) -> bool {
        *self == Verdict::Valid
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Unevaluated => write!(f, "not evaluated"),
            Verdict::Valid => write!(f, "valid"),
            Verdict::Invalid(msg) => write!(f, "invalid: {}", msg),
            Verdict::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// One sentence in a proof.
///
/// The parsed expression and the verdict are derived state: they are never
/// persisted, and any text edit clears them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofLine {
    pub text: String,

    /// Cache of the parsed form, filled in lazily by the context builder.
    #[serde(skip)]
    pub expression: Option<Expression>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,

    #[serde(default)]
    pub premise: bool,

    /// Subproof nesting depth; top level is 0.
    #[serde(default)]
    pub depth: u16,

    /// True on the first line of a subproof, the one stating its assumption.
    #[serde(default)]
    pub subproof_start: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<LineRef>,

    /// The name of the proof this line imports, for the Lemma rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<String>,

    #[serde(skip)]
    pub verdict: Verdict,
}

impl ProofLine {
    pub fn new(text: impl Into<String>) -> ProofLine {
        ProofLine {
            text: text.into(),
            expression: None,
            rule: None,
            premise: false,
            depth: 0,
            subproof_start: false,
            refs: Vec::new(),
            linked: None,
            verdict: Verdict::Unevaluated,
        }
    }

    /// Replaces the line's text, dropping the cached expression and the
    /// verdict. This is the invalidation contract the document layer must
    /// honor on every text mutation.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.invalidate();
    }

    pub fn set_rule(&mut self, rule: Option<Rule>) {
        self.rule = rule;
        self.verdict = Verdict::Unevaluated;
    }

    /// Clears derived state without touching the text.
    pub fn invalidate(&mut self) {
        self.expression = None;
        self.verdict = Verdict::Unevaluated;
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// An assumption: a top-level premise or the first line of a subproof.
    /// Assumptions are accepted without a rule.
    pub fn is_assumption(&self) -> bool {
        self.premise || self.subproof_start
    }
}

/// A proof document: the ordered lines, the goals the proof is trying to
/// reach, and the mode flag selecting the Boolean-algebra rule set and
/// grammar.
///
/// The engine reads this model and writes derived fields (expression
/// caches and verdicts); structural edits belong to the document's owner.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Proof {
    pub lines: Vec<ProofLine>,

    /// Target sentences, by text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<String>,

    #[serde(default)]
    pub boolean_mode: bool,

    // Where the next added line goes after an explicit end_subproof.
    // Builder state, not part of the document.
    #[serde(skip)]
    pending_depth: Option<u16>,
}

impl Proof {
    pub fn new() -> Proof {
        Proof::default()
    }

    pub fn dialect(&self) -> Dialect {
        if self.boolean_mode {
            Dialect::Boolean
        } else {
            Dialect::Predicate
        }
    }

    /// Appends a premise at the top level.
    pub fn add_premise(&mut self, text: impl Into<String>) -> &mut ProofLine {
        let mut line = ProofLine::new(text);
        line.premise = true;
        self.pending_depth = None;
        self.lines.push(line);
        self.lines.last_mut().unwrap()
    }

    /// Appends a conclusion at the current depth with its rule and cited
    /// line numbers.
    pub fn add_line(
        &mut self,
        text: impl Into<String>,
        rule: Rule,
        refs: Vec<usize>,
    ) -> &mut ProofLine {
        let depth = self.take_depth();
        let mut line = ProofLine::new(text);
        line.rule = Some(rule);
        line.refs = refs.into_iter().map(LineRef::Line).collect();
        line.depth = depth;
        self.lines.push(line);
        self.lines.last_mut().unwrap()
    }

    /// Opens a subproof whose assumption is the given sentence.
    pub fn begin_subproof(&mut self, assumption: impl Into<String>) -> &mut ProofLine {
        let depth = self.take_depth() + 1;
        let mut line = ProofLine::new(assumption);
        line.subproof_start = true;
        line.depth = depth;
        self.lines.push(line);
        self.lines.last_mut().unwrap()
    }

    /// Closes the innermost open subproof. Does nothing at the top level.
    pub fn end_subproof(&mut self) {
        let depth = self.take_depth();
        if depth > 0 {
            self.pending_depth = Some(depth - 1);
        }
    }

    fn take_depth(&mut self) -> u16 {
        match self.pending_depth.take() {
            Some(d) => d,
            None => self.lines.last().map(|l| l.depth).unwrap_or(0),
        }
    }

    /// The 1-based number of a line, as shown to the user.
    pub fn line_number(&self, index: usize) -> usize {
        index + 1
    }

    /// Looks up a 1-based line number.
    pub fn line_index(&self, number: usize) -> Option<usize> {
        if number >= 1 && number <= self.lines.len() {
            Some(number - 1)
        } else {
            None
        }
    }

    /// Removes a line. Later line numbers shift down; the caller is
    /// responsible for renumbering any references it handed out.
    pub fn kill_line(&mut self, index: usize) {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
    }

    /// Drops all derived state, forcing reparse and re-evaluation.
    pub fn invalidate_all(&mut self) {
        for line in &mut self.lines {
            line.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::expression::Expression;

    #[test]
    fn test_set_text_invalidates() {
        let mut proof = Proof::new();
        proof.add_premise("P");
        proof.lines[0].expression = Some(Expression::Predicate("P".to_string(), vec![]));
        proof.lines[0].verdict = Verdict::Valid;
        proof.lines[0].set_text("Q");
        assert!(proof.lines[0].expression.is_none());
        assert_eq!(proof.lines[0].verdict, Verdict::Unevaluated);
    }

    #[test]
    fn test_subproof_depth_tracking() {
        let mut proof = Proof::new();
        proof.add_premise("P -> Q");
        proof.begin_subproof("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);
        proof.end_subproof();
        proof.add_line("P -> Q", Rule::Subproof, vec![2, 3]);
        assert_eq!(proof.lines[1].depth, 1);
        assert_eq!(proof.lines[2].depth, 1);
        assert_eq!(proof.lines[3].depth, 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut proof = Proof::new();
        proof.goals.push("Q".to_string());
        proof.add_premise("P -> Q");
        proof.add_premise("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);

        let json = serde_json::to_string(&proof).unwrap();
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lines.len(), 3);
        assert_eq!(back.lines[2].rule, Some(Rule::ModusPonens));
        assert_eq!(back.lines[2].refs, vec![LineRef::Line(1), LineRef::Line(2)]);
        assert_eq!(back.goals, vec!["Q".to_string()]);
        // Derived state is not persisted.
        assert!(back.lines[2].expression.is_none());
        assert_eq!(back.lines[2].verdict, Verdict::Unevaluated);
    }
}
