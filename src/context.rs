use crate::error::CheckError;
use crate::proof::Proof;
use crate::syntax::expression::Expression;
use crate::syntax::parser::parse_sentence;

/// One subproof scope. Scope 0 is the whole proof.
#[derive(Clone, Debug)]
struct Scope {
    parent: Option<usize>,
    /// Index of the assumption line that opens the scope. The root scope
    /// starts at 0.
    start: usize,
    /// Exclusive index of the first line after the scope closes.
    end: usize,
}

/// The subproof bracketing of a proof, computed in one pass over the lines.
///
/// Whole-proof evaluation builds this once and reuses it for every line;
/// per-line visibility queries are then a short ancestor walk instead of a
/// rescan of the document.
#[derive(Clone, Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    line_scope: Vec<usize>,
}

impl ScopeTree {
    /// Builds the scope tree from the lines' depth and start markers.
    ///
    /// Malformed nesting is tolerated rather than rejected: a depth jump
    /// without a start marker opens implicit scopes, and scopes left open
    /// at the end extend to the last line.
    pub fn build(proof: &Proof) -> ScopeTree {
        let line_count = proof.lines.len();
        let mut scopes = vec![Scope {
            parent: None,
            start: 0,
            end: line_count,
        }];
        let mut stack = vec![0usize];
        let mut line_scope = Vec::with_capacity(line_count);

        for (i, line) in proof.lines.iter().enumerate() {
            let depth = line.depth as usize;

            if line.subproof_start {
                // Close down to the parent depth, then open the new scope.
                while stack.len() > depth.max(1) {
                    let closed = stack.pop().unwrap();
                    scopes[closed].end = i;
                }
                let scope = Scope {
                    parent: Some(*stack.last().unwrap()),
                    start: i,
                    end: line_count,
                };
                scopes.push(scope);
                stack.push(scopes.len() - 1);
            } else {
                while stack.len() > depth + 1 {
                    let closed = stack.pop().unwrap();
                    scopes[closed].end = i;
                }
                // A deeper line with no start marker: open implicit scopes.
                while stack.len() < depth + 1 {
                    let scope = Scope {
                        parent: Some(*stack.last().unwrap()),
                        start: i,
                        end: line_count,
                    };
                    scopes.push(scope);
                    stack.push(scopes.len() - 1);
                }
            }
            line_scope.push(*stack.last().unwrap());
        }

        ScopeTree { scopes, line_scope }
    }

    pub fn scope_of(&self, line: usize) -> usize {
        self.line_scope.get(line).copied().unwrap_or(0)
    }

    fn is_ancestor_or_self(&self, candidate: usize, scope: usize) -> bool {
        let mut current = Some(scope);
        while let Some(s) = current {
            if s == candidate {
                return true;
            }
            current = self.scopes[s].parent;
        }
        false
    }

    /// Whether `antecedent` may be cited by `line`: it comes strictly
    /// earlier and does not sit inside a subproof that closed before
    /// `line`.
    pub fn is_visible(&self, antecedent: usize, line: usize) -> bool {
        antecedent < line && self.is_ancestor_or_self(self.scope_of(antecedent), self.scope_of(line))
    }

    /// Whether the lines `assumption` and `inner` bracket a subproof the
    /// Subproof rule may cite from `line`: `assumption` opens a scope that
    /// is an immediate child of `line`'s scope, closed before `line`, and
    /// `inner` lies within it.
    pub fn cites_closed_child(&self, assumption: usize, inner: usize, line: usize) -> bool {
        let scope = match self
            .scopes
            .iter()
            .position(|s| s.start == assumption && s.parent.is_some())
        {
            Some(s) => s,
            None => return false,
        };
        self.scopes[scope].parent == Some(self.scope_of(line))
            && self.scopes[scope].end <= line
            && inner >= assumption
            && inner < self.scopes[scope].end
            && self.is_ancestor_or_self(scope, self.scope_of(inner))
    }
}

/// Parses every non-blank, not-yet-parsed line before `limit` (exclusive),
/// caching the result on the line. The first failure is returned tagged
/// with its 1-based line number.
pub fn parse_pending(proof: &mut Proof, limit: usize) -> Result<(), CheckError> {
    let dialect = proof.dialect();
    for i in 0..limit.min(proof.lines.len()) {
        let line = &mut proof.lines[i];
        if line.expression.is_some() || line.is_blank() {
            continue;
        }
        match parse_sentence(&line.text, dialect) {
            Ok(expr) => line.expression = Some(expr),
            Err(e) => return Err(e.at_line(i + 1)),
        }
    }
    Ok(())
}

/// The lines visible as justification for the line at `index`, in document
/// order, as (1-based line number, parsed expression) pairs. Blank lines
/// are skipped. Call `parse_pending` first; unparsed lines are skipped
/// here.
pub fn context_for<'a>(
    proof: &'a Proof,
    tree: &ScopeTree,
    index: usize,
) -> Vec<(usize, &'a Expression)> {
    let mut visible = Vec::new();
    for (j, line) in proof.lines.iter().enumerate().take(index) {
        if line.is_blank() {
            continue;
        }
        if !tree.is_visible(j, index) {
            continue;
        }
        if let Some(expr) = &line.expression {
            visible.push((j + 1, expr));
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn build_proof_with_subproof() -> Proof {
        // 1: P -> Q        premise
        // 2: | P           subproof assumption
        // 3: | Q           mp 1, 2
        // 4: P -> Q        subproof 2, 3 (sibling after close)
        let mut proof = Proof::new();
        proof.add_premise("P -> Q");
        proof.begin_subproof("P");
        proof.add_line("Q", Rule::ModusPonens, vec![1, 2]);
        proof.end_subproof();
        proof.add_line("P -> Q", Rule::Subproof, vec![2, 3]);
        proof
    }

    #[test]
    fn test_visibility_inside_open_subproof() {
        let proof = build_proof_with_subproof();
        let tree = ScopeTree::build(&proof);
        // Line 3 (index 2) can see the assumption and the outer premise.
        assert!(tree.is_visible(0, 2));
        assert!(tree.is_visible(1, 2));
    }

    #[test]
    fn test_closed_subproof_is_invisible_to_siblings() {
        let proof = build_proof_with_subproof();
        let tree = ScopeTree::build(&proof);
        // Line 4 (index 3) must not see lines 2 and 3.
        assert!(!tree.is_visible(1, 3));
        assert!(!tree.is_visible(2, 3));
        assert!(tree.is_visible(0, 3));
    }

    #[test]
    fn test_cites_closed_child() {
        let proof = build_proof_with_subproof();
        let tree = ScopeTree::build(&proof);
        assert!(tree.cites_closed_child(1, 2, 3));
        // The assumption line itself is a valid inner line.
        assert!(tree.cites_closed_child(1, 1, 3));
        // An outer line is not inside the subproof.
        assert!(!tree.cites_closed_child(0, 2, 3));
    }

    #[test]
    fn test_context_skips_blank_and_unparsed() {
        let mut proof = Proof::new();
        proof.add_premise("P");
        proof.add_premise("");
        proof.add_premise("Q");
        proof.add_line("P & Q", Rule::Conjunction, vec![1, 3]);
        parse_pending(&mut proof, 3).unwrap();
        let tree = ScopeTree::build(&proof);
        let ctx = context_for(&proof, &tree, 3);
        let numbers: Vec<usize> = ctx.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_parse_pending_reports_line_number() {
        let mut proof = Proof::new();
        proof.add_premise("P");
        proof.add_premise("Q &");
        let err = parse_pending(&mut proof, 2).unwrap_err();
        match err {
            CheckError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_nesting_is_tolerated() {
        // A depth jump with no start marker must not panic and must keep
        // later visibility sane.
        let mut proof = Proof::new();
        proof.add_premise("P");
        let line = proof.add_line("Q", Rule::Addition, vec![1]);
        line.depth = 3;
        proof.add_line("R", Rule::Addition, vec![1]).depth = 0;
        let tree = ScopeTree::build(&proof);
        assert!(tree.is_visible(0, 2));
        assert!(!tree.is_visible(1, 2));
    }
}
