mod boolean;
mod equivalence;
mod inference;
mod misc;
mod predicate;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CheckError;
use crate::syntax::expression::Expression;
use crate::tracker::VariableTracker;

pub use misc::ImportSummary;

/// The rule groups, matching the five panels of the rules table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCategory {
    Inference,
    Equivalence,
    Predicate,
    Miscellaneous,
    Boolean,
}

/// The thirty-five inference, equivalence, predicate, miscellaneous, and
/// Boolean rules. Immutable and defined once; the short serde ids are the
/// identifiers used in saved proof files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    // Inference
    #[serde(rename = "mp")]
    ModusPonens,
    #[serde(rename = "ad")]
    Addition,
    #[serde(rename = "sm")]
    Simplification,
    #[serde(rename = "cn")]
    Conjunction,
    #[serde(rename = "hs")]
    HypotheticalSyllogism,
    #[serde(rename = "ds")]
    DisjunctiveSyllogism,
    #[serde(rename = "em")]
    ExcludedMiddle,
    #[serde(rename = "cd")]
    ConstructiveDilemma,

    // Equivalence
    #[serde(rename = "dm")]
    DeMorgan,
    #[serde(rename = "co")]
    Commutativity,
    #[serde(rename = "id")]
    Idempotence,
    #[serde(rename = "as")]
    Association,
    #[serde(rename = "im")]
    Implication,
    #[serde(rename = "dt")]
    Distribution,
    #[serde(rename = "eq")]
    Equivalence,
    #[serde(rename = "dn")]
    DoubleNegation,
    #[serde(rename = "ep")]
    Exportation,
    #[serde(rename = "sb")]
    Subsumption,

    // Predicate
    #[serde(rename = "ug")]
    UniversalGeneralization,
    #[serde(rename = "ui")]
    UniversalInstantiation,
    #[serde(rename = "eg")]
    ExistentialGeneralization,
    #[serde(rename = "ei")]
    ExistentialInstantiation,
    #[serde(rename = "bv")]
    BoundVariable,
    #[serde(rename = "nq")]
    NullQuantifier,
    #[serde(rename = "pr")]
    Prenex,
    #[serde(rename = "ii")]
    Identity,
    #[serde(rename = "fv")]
    FreeVariable,

    // Miscellaneous
    #[serde(rename = "lm")]
    Lemma,
    #[serde(rename = "sp")]
    Subproof,
    #[serde(rename = "sq")]
    SequenceInstantiation,
    #[serde(rename = "in")]
    Induction,

    // Boolean
    #[serde(rename = "bi")]
    BooleanIdentity,
    #[serde(rename = "bn")]
    BooleanNegation,
    #[serde(rename = "bd")]
    BooleanDominance,
    #[serde(rename = "sn")]
    SymbolNegation,
}

impl Rule {
    pub fn all() -> &'static [Rule] {
        use Rule::*;
        &[
            ModusPonens,
            Addition,
            Simplification,
            Conjunction,
            HypotheticalSyllogism,
            DisjunctiveSyllogism,
            ExcludedMiddle,
            ConstructiveDilemma,
            DeMorgan,
            Commutativity,
            Idempotence,
            Association,
            Implication,
            Distribution,
            Equivalence,
            DoubleNegation,
            Exportation,
            Subsumption,
            UniversalGeneralization,
            UniversalInstantiation,
            ExistentialGeneralization,
            ExistentialInstantiation,
            BoundVariable,
            NullQuantifier,
            Prenex,
            Identity,
            FreeVariable,
            Lemma,
            Subproof,
            SequenceInstantiation,
            Induction,
            BooleanIdentity,
            BooleanNegation,
            BooleanDominance,
            SymbolNegation,
        ]
    }

    /// The identifier used in saved proof files.
    pub fn id(&self) -> &'static str {
        use Rule::*;
        match self {
            ModusPonens => "mp",
            Addition => "ad",
            Simplification => "sm",
            Conjunction => "cn",
            HypotheticalSyllogism => "hs",
            DisjunctiveSyllogism => "ds",
            ExcludedMiddle => "em",
            ConstructiveDilemma => "cd",
            DeMorgan => "dm",
            Commutativity => "co",
            Idempotence => "id",
            Association => "as",
            Implication => "im",
            Distribution => "dt",
            Equivalence => "eq",
            DoubleNegation => "dn",
            Exportation => "ep",
            Subsumption => "sb",
            UniversalGeneralization => "ug",
            UniversalInstantiation => "ui",
            ExistentialGeneralization => "eg",
            ExistentialInstantiation => "ei",
            BoundVariable => "bv",
            NullQuantifier => "nq",
            Prenex => "pr",
            Identity => "ii",
            FreeVariable => "fv",
            Lemma => "lm",
            Subproof => "sp",
            SequenceInstantiation => "sq",
            Induction => "in",
            BooleanIdentity => "bi",
            BooleanNegation => "bn",
            BooleanDominance => "bd",
            SymbolNegation => "sn",
        }
    }

    pub fn from_id(id: &str) -> Option<Rule> {
        Rule::all().iter().copied().find(|r| r.id() == id)
    }

    pub fn display_name(&self) -> &'static str {
        use Rule::*;
        match self {
            ModusPonens => "Modus Ponens",
            Addition => "Addition",
            Simplification => "Simplification",
            Conjunction => "Conjunction",
            HypotheticalSyllogism => "Hypothetical Syllogism",
            DisjunctiveSyllogism => "Disjunctive Syllogism",
            ExcludedMiddle => "Excluded Middle",
            ConstructiveDilemma => "Constructive Dilemma",
            DeMorgan => "DeMorgan",
            Commutativity => "Commutativity",
            Idempotence => "Idempotence",
            Association => "Association",
            Implication => "Implication",
            Distribution => "Distribution",
            Equivalence => "Equivalence",
            DoubleNegation => "Double Negation",
            Exportation => "Exportation",
            Subsumption => "Subsumption",
            UniversalGeneralization => "Universal Generalization",
            UniversalInstantiation => "Universal Instantiation",
            ExistentialGeneralization => "Existential Generalization",
            ExistentialInstantiation => "Existential Instantiation",
            BoundVariable => "Bound Variable Substitution",
            NullQuantifier => "Null Quantifier",
            Prenex => "Prenex",
            Identity => "Identity",
            FreeVariable => "Free Variable Substitution",
            Lemma => "Lemma",
            Subproof => "Subproof",
            SequenceInstantiation => "Sequence Instantiation",
            Induction => "Induction",
            BooleanIdentity => "Boolean Identity",
            BooleanNegation => "Boolean Negation",
            BooleanDominance => "Boolean Dominance",
            SymbolNegation => "Symbol Negation",
        }
    }

    pub fn category(&self) -> RuleCategory {
        use Rule::*;
        match self {
            ModusPonens | Addition | Simplification | Conjunction | HypotheticalSyllogism
            | DisjunctiveSyllogism | ExcludedMiddle | ConstructiveDilemma => {
                RuleCategory::Inference
            }
            DeMorgan | Commutativity | Idempotence | Association | Implication | Distribution
            | Equivalence | DoubleNegation | Exportation | Subsumption => {
                RuleCategory::Equivalence
            }
            UniversalGeneralization | UniversalInstantiation | ExistentialGeneralization
            | ExistentialInstantiation | BoundVariable | NullQuantifier | Prenex | Identity
            | FreeVariable => RuleCategory::Predicate,
            Lemma | Subproof | SequenceInstantiation | Induction => RuleCategory::Miscellaneous,
            BooleanIdentity | BooleanNegation | BooleanDominance | SymbolNegation => {
                RuleCategory::Boolean
            }
        }
    }

    /// Whether a Boolean-mode proof may use this rule. The caller enforces
    /// this at rule-selection time; `verify` itself assumes it holds.
    ///
    /// Boolean mode keeps the Boolean group and the equivalence rules that
    /// do not involve an arrow; everything else is disabled.
    pub fn boolean_legal(&self) -> bool {
        use Rule::*;
        match self.category() {
            RuleCategory::Boolean => true,
            RuleCategory::Equivalence => !matches!(self, Implication | Equivalence | Exportation),
            _ => false,
        }
    }

    /// Minimum and maximum number of cited lines; None means unbounded.
    fn reference_bounds(&self) -> (usize, Option<usize>) {
        use Rule::*;
        match self {
            ExcludedMiddle | Identity => (0, Some(0)),
            ModusPonens | HypotheticalSyllogism | DisjunctiveSyllogism | Subproof | Induction => {
                (2, Some(2))
            }
            Conjunction | ConstructiveDilemma => (2, None),
            // The Lemma rule's justification is the linked proof, not
            // cited lines.
            Lemma => (0, None),
            _ => (1, Some(1)),
        }
    }

    fn expected_refs(&self) -> &'static str {
        match self.reference_bounds() {
            (0, Some(0)) => "no",
            (1, Some(1)) => "exactly 1",
            (2, Some(2)) => "exactly 2",
            (2, None) => "at least 2",
            _ => "any number of",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Why a rule check did not produce a valid line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleFailure {
    /// The rule is simply not applicable to these sentences; the normal
    /// "invalid" outcome, with an explanation for the user.
    NotSatisfied(String),

    /// A condition the front end should present differently: wrong
    /// reference count, inadmissible variable, import trouble.
    Error(CheckError),
}

pub type RuleResult = Result<(), RuleFailure>;

pub(crate) fn mismatch(message: impl Into<String>) -> RuleFailure {
    RuleFailure::NotSatisfied(message.into())
}

/// Everything a rule check gets to look at. Rules are pure functions over
/// this: no document access, no global state.
pub struct RuleContext<'a> {
    /// The sentence being justified.
    pub conclusion: &'a Expression,

    /// The cited lines' expressions, in document order.
    pub antecedents: Vec<&'a Expression>,

    /// The full visible context, for rules that scan beyond the citations
    /// (the Lemma rule's premise matching).
    pub visible: &'a [(usize, &'a Expression)],

    /// Variable bookkeeping accumulated from the lines before this one.
    pub tracker: &'a VariableTracker,

    /// The recursively evaluated linked proof, when the line has one.
    pub import: Option<&'a ImportSummary>,
}

/// Checks whether the rule justifies the conclusion from the antecedents.
///
/// The caller is responsible for rule availability (Boolean-mode gating
/// happens at selection time, see `Rule::boolean_legal`); this function
/// assumes the rule may be used and answers only whether it applies.
pub fn verify(rule: Rule, ctx: &RuleContext) -> RuleResult {
    let (min, max) = rule.reference_bounds();
    let actual = ctx.antecedents.len();
    if actual < min || max.is_some_and(|m| actual > m) {
        return Err(RuleFailure::Error(CheckError::WrongReferenceCount {
            rule: rule.display_name(),
            expected: rule.expected_refs(),
            actual,
        }));
    }

    use Rule::*;
    match rule {
        ModusPonens => inference::modus_ponens(ctx),
        Addition => inference::addition(ctx),
        Simplification => inference::simplification(ctx),
        Conjunction => inference::conjunction(ctx),
        HypotheticalSyllogism => inference::hypothetical_syllogism(ctx),
        DisjunctiveSyllogism => inference::disjunctive_syllogism(ctx),
        ExcludedMiddle => inference::excluded_middle(ctx),
        ConstructiveDilemma => inference::constructive_dilemma(ctx),

        DeMorgan => equivalence::check(ctx, equivalence::de_morgan, "DeMorgan"),
        Commutativity => equivalence::check(ctx, equivalence::commutativity, "Commutativity"),
        Idempotence => equivalence::check(ctx, equivalence::idempotence, "Idempotence"),
        Association => equivalence::check(ctx, equivalence::association, "Association"),
        Implication => equivalence::check(ctx, equivalence::implication, "Implication"),
        Distribution => equivalence::check(ctx, equivalence::distribution, "Distribution"),
        Equivalence => equivalence::check(ctx, equivalence::biconditional, "Equivalence"),
        DoubleNegation => equivalence::check(ctx, equivalence::double_negation, "Double Negation"),
        Exportation => equivalence::check(ctx, equivalence::exportation, "Exportation"),
        Subsumption => equivalence::check(ctx, equivalence::subsumption, "Subsumption"),

        UniversalGeneralization => predicate::universal_generalization(ctx),
        UniversalInstantiation => predicate::universal_instantiation(ctx),
        ExistentialGeneralization => predicate::existential_generalization(ctx),
        ExistentialInstantiation => predicate::existential_instantiation(ctx),
        BoundVariable => predicate::bound_variable(ctx),
        NullQuantifier => equivalence::check(ctx, predicate::null_quantifier, "Null Quantifier"),
        Prenex => equivalence::check(ctx, predicate::prenex, "Prenex"),
        Identity => predicate::identity(ctx),
        FreeVariable => predicate::free_variable(ctx),

        Lemma => misc::lemma(ctx),
        Subproof => misc::subproof(ctx),
        SequenceInstantiation => misc::sequence_instantiation(ctx),
        Induction => misc::induction(ctx),

        BooleanIdentity => equivalence::check(ctx, boolean::bool_identity, "Boolean Identity"),
        BooleanNegation => equivalence::check(ctx, boolean::bool_negation, "Boolean Negation"),
        BooleanDominance => equivalence::check(ctx, boolean::bool_dominance, "Boolean Dominance"),
        SymbolNegation => equivalence::check(ctx, boolean::symbol_negation, "Symbol Negation"),
    }
}
