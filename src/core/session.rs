//! Persisted analysis results, the hand-off between `analyze` and `apply`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::core::aggregate::{ApprovalError, CandidateSet, ExternalCandidate};
use crate::core::model::Category;
use crate::infra::io::write_atomic;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(
        "session was created for a different version of {} (fingerprint {expected}, document is {actual})",
        .document.display()
    )]
    Stale { document: PathBuf, expected: String, actual: String },

    #[error("{}: candidate ids are not dense", .path.display())]
    Corrupt { path: PathBuf },

    #[error("invalid id list: '{0}'")]
    IdList(String),

    #[error(transparent)]
    Approval(#[from] ApprovalError),
}

/// xxh64 of the file bytes, as 16 hex digits
pub fn fingerprint(path: &Path) -> Result<String, SessionError> {
    let bytes =
        fs::read(path).map_err(|source| SessionError::Read { path: path.to_path_buf(), source })?;
    Ok(format!("{:016x}", xxh64(&bytes, 0)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub document: PathBuf,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub candidates: CandidateSet,
}

impl AnalysisSession {
    pub fn new(document: &Path, candidates: CandidateSet) -> Result<Self, SessionError> {
        Ok(Self {
            document: document.to_path_buf(),
            fingerprint: fingerprint(document)?,
            created_at: Utc::now(),
            candidates,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let data = fs::read_to_string(path)
            .map_err(|source| SessionError::Read { path: path.to_path_buf(), source })?;
        let session: Self = serde_json::from_str(&data)
            .map_err(|source| SessionError::Parse { path: path.to_path_buf(), source })?;
        if !session.candidates.is_consistent() {
            return Err(SessionError::Corrupt { path: path.to_path_buf() });
        }
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let write_err = |source| SessionError::Write { path: path.to_path_buf(), source };
        let json = serde_json::to_vec_pretty(self).map_err(|e| write_err(e.into()))?;
        write_atomic(path, &json).map_err(write_err)
    }

    /// Fail unless `document` has the fingerprint recorded at analysis time
    pub fn verify(&self, document: &Path) -> Result<(), SessionError> {
        let actual = fingerprint(document)?;
        if actual != self.fingerprint {
            return Err(SessionError::Stale {
                document: document.to_path_buf(),
                expected: self.fingerprint.clone(),
                actual,
            });
        }
        Ok(())
    }

    pub fn counts(&self) -> IndexMap<Category, usize> {
        self.candidates.counts()
    }
}

/// Parse `"0,3 5-7"` into ids; ranges are inclusive
pub fn parse_id_list(input: &str) -> Result<Vec<u32>, SessionError> {
    let bad = || SessionError::IdList(input.trim().to_string());
    let mut ids = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = lo.trim().parse().map_err(|_| bad())?;
                let hi: u32 = hi.trim().parse().map_err(|_| bad())?;
                if lo > hi {
                    return Err(bad());
                }
                ids.extend(lo..=hi);
            }
            None => ids.push(token.parse().map_err(|_| bad())?),
        }
    }
    Ok(ids)
}

/// Read a JSON array of externally produced candidates
pub fn load_external(path: &Path) -> Result<Vec<ExternalCandidate>, SessionError> {
    let data = fs::read_to_string(path)
        .map_err(|source| SessionError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&data).map_err(|source| SessionError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("0,3 5-7").unwrap(), [0, 3, 5, 6, 7]);
        assert_eq!(parse_id_list("  ").unwrap(), Vec::<u32>::new());
        assert!(matches!(parse_id_list("1,x"), Err(SessionError::IdList(_))));
        assert!(matches!(parse_id_list("7-2"), Err(SessionError::IdList(_))));
    }

    #[test]
    fn test_round_trip_and_stale_detection() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("a.docx");
        fs::write(&doc, b"contenido").unwrap();

        let session = AnalysisSession::new(&doc, CandidateSet::default()).unwrap();
        let file = dir.path().join("a.json");
        session.save(&file).unwrap();

        let loaded = AnalysisSession::load(&file).unwrap();
        assert_eq!(loaded, session);
        loaded.verify(&doc).unwrap();

        fs::write(&doc, b"otro contenido").unwrap();
        assert!(matches!(loaded.verify(&doc), Err(SessionError::Stale { .. })));
    }

    #[test]
    fn test_corrupt_session_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("s.json");
        let json = r#"{
            "document": "x.docx",
            "fingerprint": "00",
            "created_at": "2024-05-01T10:00:00Z",
            "candidates": [{
                "id": 4, "category": "typography", "original_span": "a", "replacement_span": "b",
                "explanation": "", "confidence": 0.9, "paragraph_index": 0
            }]
        }"#;
        fs::write(&file, json).unwrap();
        assert!(matches!(AnalysisSession::load(&file), Err(SessionError::Corrupt { .. })));
    }

    #[test]
    fn test_load_external() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ext.json");
        fs::write(
            &file,
            r#"[{"paragraph_index": 2, "original": "haiga", "replacement": "haya", "category": "spelling"}]"#,
        )
        .unwrap();
        let ext = load_external(&file).unwrap();
        assert_eq!(ext[0].paragraph_index, 2);
        assert_eq!(ext[0].category, Some(Category::Spelling));
        assert!(ext[0].explanation.is_empty());
    }
}
