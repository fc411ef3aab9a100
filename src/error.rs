use thiserror::Error;

use crate::tracker::VariableRole;

/// Everything that can go wrong while evaluating a line or a proof.
///
/// Rule failures that just mean "the rule doesn't apply here" are not errors;
/// they become an ordinary invalid verdict with an explanation. The variants
/// here are the conditions a front end wants to present differently from
/// "rule doesn't apply".
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The sentence text could not be read at all: unbalanced parentheses,
    /// an illegal character, or an operator missing an operand.
    #[error("malformed sentence: {0}")]
    MalformedSentence(String),

    /// A token that is not part of the active grammar, like an implication
    /// arrow in a Boolean-mode proof.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    /// The rule was cited with the wrong number of justification lines.
    /// Distinct from a structural mismatch so the front end can say
    /// "select another reference" instead of "this rule doesn't apply".
    #[error("{rule} requires {expected} references, but {actual} were cited")]
    WrongReferenceCount {
        rule: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// A quantifier rule tried to introduce a variable that was already
    /// used in a conflicting role earlier in the proof.
    #[error("variable '{name}' was already used as {prior} earlier in the proof")]
    InvalidVariableUse { name: String, prior: VariableRole },

    /// A linked proof could not be loaded or was itself unusable.
    #[error("could not resolve linked proof '{name}': {reason}")]
    ImportResolutionFailure { name: String, reason: String },

    /// Whole-proof evaluation hit an unparseable line and stopped.
    /// The line number is 1-based, matching what the user sees.
    #[error("line {line}: {cause}")]
    ParseError { line: usize, cause: Box<CheckError> },
}

impl CheckError {
    /// Wraps a parse failure with the 1-based line number it happened on.
    pub fn at_line(self, line: usize) -> CheckError {
        CheckError::ParseError {
            line,
            cause: Box::new(self),
        }
    }
}
