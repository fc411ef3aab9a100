use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CheckError;
use crate::proof::Proof;

/// The extension for saved proof files. The content is the JSON form of
/// [`Proof`].
pub const PROOF_EXTENSION: &str = "sq";

/// Resolves a linked-proof reference to a parsed document.
///
/// The engine only ever asks for a document by name; where it comes from
/// (disk, memory, an editor buffer) is the implementor's business.
pub trait ProofLoader {
    fn load(&self, name: &str) -> Result<Proof, CheckError>;
}

/// A loader for proofs that use no imports. Any lookup fails.
pub struct NoImports;

impl ProofLoader for NoImports {
    fn load(&self, name: &str) -> Result<Proof, CheckError> {
        Err(CheckError::ImportResolutionFailure {
            name: name.to_string(),
            reason: "imports are not available here".to_string(),
        })
    }
}

/// Reads and deserializes one proof file.
pub fn read_proof(path: &Path) -> Result<Proof, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("could not parse {}: {}", path.display(), e))
}

/// Serializes a proof to its file form.
pub fn write_proof(path: &Path, proof: &Proof) -> Result<(), String> {
    let content = serde_json::to_string_pretty(proof)
        .map_err(|e| format!("could not serialize proof: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("could not write {}: {}", path.display(), e))
}

/// Resolves proof names against a root directory, with an in-memory layer
/// for tests and unsaved documents. Mocked names shadow the filesystem.
pub struct Project {
    root: PathBuf,
    mocks: HashMap<String, Proof>,
    use_filesystem: bool,
}

impl Project {
    /// A project rooted at a directory on disk.
    pub fn new_local(root: impl Into<PathBuf>) -> Project {
        Project {
            root: root.into(),
            mocks: HashMap::new(),
            use_filesystem: true,
        }
    }

    /// A project that resolves only mocked documents.
    pub fn new_mock() -> Project {
        Project {
            root: PathBuf::new(),
            mocks: HashMap::new(),
            use_filesystem: false,
        }
    }

    /// Registers an in-memory document under a name.
    pub fn mock(&mut self, name: &str, proof: Proof) {
        self.mocks.insert(name.to_string(), proof);
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.root.join(name);
        if path.extension().is_none() {
            path.set_extension(PROOF_EXTENSION);
        }
        path
    }
}

impl ProofLoader for Project {
    fn load(&self, name: &str) -> Result<Proof, CheckError> {
        if let Some(proof) = self.mocks.get(name) {
            debug!(name, "resolved import from mock");
            return Ok(proof.clone());
        }
        if !self.use_filesystem {
            return Err(CheckError::ImportResolutionFailure {
                name: name.to_string(),
                reason: "no such document".to_string(),
            });
        }
        let path = self.path_for(name);
        debug!(name, path = %path.display(), "resolving import from disk");
        read_proof(&path).map_err(|reason| CheckError::ImportResolutionFailure {
            name: name.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{evaluate_line, evaluate_proof};
    use crate::proof::{LineRef, ProofLine, Verdict};
    use crate::rules::Rule;

    fn lemma_proof() -> Proof {
        // The imported document: P and P -> Q give Q.
        let mut imported = Proof::new();
        imported.add_premise("P");
        imported.add_premise("P -> Q");
        imported.add_line("Q", Rule::ModusPonens, vec![1, 2]);
        imported
    }

    #[test]
    fn test_lemma_through_project() {
        let mut project = Project::new_mock();
        project.mock("helper", lemma_proof());

        let mut proof = Proof::new();
        proof.add_premise("P");
        proof.add_premise("P -> Q");
        let mut line = ProofLine::new("Q");
        line.rule = Some(Rule::Lemma);
        line.linked = Some("helper".to_string());
        line.refs = vec![LineRef::Import];
        proof.lines.push(line);

        let summary = evaluate_proof(&mut proof, &project).unwrap();
        assert!(summary.is_success(), "{:?}", proof.lines[2].verdict);
    }

    #[test]
    fn test_lemma_with_unsatisfied_premise() {
        let mut project = Project::new_mock();
        project.mock("helper", lemma_proof());

        // The citing proof never establishes P -> Q.
        let mut proof = Proof::new();
        proof.add_premise("P");
        let mut line = ProofLine::new("Q");
        line.rule = Some(Rule::Lemma);
        line.linked = Some("helper".to_string());
        proof.lines.push(line);

        evaluate_proof(&mut proof, &project).unwrap();
        assert!(matches!(proof.lines[1].verdict, Verdict::Invalid(_)));
    }

    #[test]
    fn test_circular_import_fails() {
        // "a" links to itself through its only conclusion line.
        let mut circular = Proof::new();
        circular.add_premise("P");
        let mut line = ProofLine::new("Q");
        line.rule = Some(Rule::Lemma);
        line.linked = Some("a".to_string());
        circular.lines.push(line);

        let mut project = Project::new_mock();
        project.mock("a", circular.clone());

        let verdict = evaluate_line(&mut circular, 1, &project);
        match verdict {
            Verdict::Error(CheckError::ImportResolutionFailure { reason, .. }) => {
                assert!(
                    reason.contains("circular") || reason.contains("does not verify"),
                    "unexpected reason: {}",
                    reason
                );
            }
            other => panic!("expected import failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_import() {
        let project = Project::new_mock();
        let mut proof = Proof::new();
        let mut line = ProofLine::new("Q");
        line.rule = Some(Rule::Lemma);
        line.linked = Some("nowhere".to_string());
        proof.lines.push(line);

        let verdict = evaluate_line(&mut proof, 0, &project);
        assert!(matches!(
            verdict,
            Verdict::Error(CheckError::ImportResolutionFailure { .. })
        ));
    }
}
