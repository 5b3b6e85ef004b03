//! Collect rule findings into one identified, categorized candidate set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::model::{Category, Correction, Paragraph};
use crate::core::rules::{Finding, RuleEngine};

/// Confidence given to externally supplied candidates
pub const EXTERNAL_CONFIDENCE: f32 = 0.85;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("unknown candidate ids: {}", format_ids(.0))]
    UnknownIds(Vec<u32>),
}

fn format_ids(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

/// A candidate produced outside the rule engine (spell checkers, reviewers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCandidate {
    pub paragraph_index: usize,
    pub original: String,
    pub replacement: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub category: Option<Category>,
}

/// Ordered candidates with dense ids matching their position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateSet {
    items: Vec<Correction>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.items.iter()
    }

    pub fn get(&self, id: u32) -> Option<&Correction> {
        self.items.get(id as usize)
    }

    fn next_id(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    pub fn push_finding(&mut self, paragraph_index: usize, finding: Finding) -> u32 {
        let id = self.next_id();
        self.items.push(Correction {
            id,
            category: finding.category,
            original_span: finding.original,
            replacement_span: finding.replacement,
            explanation: finding.explanation,
            confidence: finding.confidence,
            paragraph_index,
            approved: false,
        });
        id
    }

    /// Append external candidates, continuing the id sequence
    pub fn extend_external(&mut self, external: impl IntoIterator<Item = ExternalCandidate>) -> usize {
        let before = self.items.len();
        for candidate in external {
            if candidate.original.is_empty() {
                continue;
            }
            let explanation = if candidate.explanation.is_empty() {
                format!("«{}» → «{}»", candidate.original, candidate.replacement)
            } else {
                candidate.explanation
            };
            self.push_finding(
                candidate.paragraph_index,
                Finding {
                    category: candidate.category.unwrap_or(Category::Spelling),
                    original: candidate.original,
                    replacement: candidate.replacement,
                    explanation,
                    confidence: EXTERNAL_CONFIDENCE,
                },
            );
        }
        self.items.len() - before
    }

    /// Ids are dense and match positions; anything else is a corrupt set
    pub fn is_consistent(&self) -> bool {
        self.items.iter().enumerate().all(|(i, c)| c.id as usize == i)
    }

    /// Mark ids approved; nothing changes if any id is unknown
    pub fn approve(&mut self, ids: &[u32]) -> Result<usize, ApprovalError> {
        let mut unknown: Vec<u32> = ids.iter().copied().filter(|&id| self.get(id).is_none()).collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            unknown.dedup();
            return Err(ApprovalError::UnknownIds(unknown));
        }
        let mut count = 0;
        for &id in ids {
            if let Some(c) = self.items.get_mut(id as usize) {
                if !c.approved {
                    c.approved = true;
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    pub fn approve_all(&mut self) -> usize {
        let mut count = 0;
        for c in self.items.iter_mut().filter(|c| !c.approved) {
            c.approved = true;
            count += 1;
        }
        count
    }

    pub fn approved(&self) -> impl Iterator<Item = &Correction> {
        self.items.iter().filter(|c| c.approved)
    }

    /// Candidate count per category, in category order, omitting zeros
    pub fn counts(&self) -> IndexMap<Category, usize> {
        let mut counts = IndexMap::new();
        for category in Category::ALL {
            let n = self.items.iter().filter(|c| c.category == category).count();
            if n > 0 {
                counts.insert(category, n);
            }
        }
        counts
    }

    pub fn by_category(&self) -> IndexMap<Category, Vec<&Correction>> {
        let mut groups: IndexMap<Category, Vec<&Correction>> = IndexMap::new();
        for category in Category::ALL {
            let members: Vec<&Correction> =
                self.items.iter().filter(|c| c.category == category).collect();
            if !members.is_empty() {
                groups.insert(category, members);
            }
        }
        groups
    }
}

/// Runs the engine over paragraphs, assigning ids in emission order
#[derive(Debug)]
pub struct Aggregator {
    engine: RuleEngine,
}

impl Aggregator {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    #[instrument(level = "debug", skip_all, fields(paragraphs = paragraphs.len()))]
    pub fn analyze(&self, paragraphs: &[Paragraph]) -> CandidateSet {
        let mut set = CandidateSet::default();
        for paragraph in paragraphs {
            self.analyze_text(&mut set, paragraph.index, &paragraph.text());
        }
        debug!(candidates = set.len(), "analysis finished");
        set
    }

    /// Add the findings for one paragraph's text to `set`
    pub fn analyze_text(&self, set: &mut CandidateSet, paragraph_index: usize, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let outcome = self.engine.run(text);
        for finding in outcome.findings {
            set.push_finding(paragraph_index, finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Run;
    use crate::core::rules::NeighborCapitalGuard;
    use crate::core::tables::RuleTables;

    fn paragraph(index: usize, text: &str) -> Paragraph {
        Paragraph { index, runs: vec![Run { text: text.into(), format: Default::default() }] }
    }

    fn aggregator() -> Aggregator {
        let engine =
            RuleEngine::standard(&RuleTables::default(), Box::new(NeighborCapitalGuard)).unwrap();
        Aggregator::new(engine)
    }

    #[test]
    fn test_ids_dense_and_stable() {
        let paragraphs = vec![
            paragraph(0, "Cuesta 25 %  más"),
            paragraph(1, "   "),
            paragraph(2, "La O.N.U. pero el software"),
        ];
        let first = aggregator().analyze(&paragraphs);
        let second = aggregator().analyze(&paragraphs);
        assert_eq!(first, second);
        assert!(first.is_consistent());
        assert!(first.iter().all(|c| c.paragraph_index != 1));
        let ids: Vec<u32> = first.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..first.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_counts_and_grouping() {
        let set = aggregator().analyze(&[paragraph(0, "El  email llegó el Martes por la tarde")]);
        let counts = set.counts();
        assert_eq!(counts.get(&Category::Typography), Some(&1));
        assert_eq!(counts.get(&Category::ForeignWord), Some(&1));
        assert_eq!(counts.get(&Category::Capitalization), Some(&1));
        assert!(!counts.contains_key(&Category::Numbers));
        assert_eq!(set.by_category().values().map(Vec::len).sum::<usize>(), set.len());
    }

    #[test]
    fn test_external_candidates_continue_ids() {
        let mut set = aggregator().analyze(&[paragraph(0, "Cuesta 25 % más")]);
        let added = set.extend_external(vec![ExternalCandidate {
            paragraph_index: 0,
            original: "Cuesta".into(),
            replacement: "Costó".into(),
            explanation: String::new(),
            category: None,
        }]);
        assert_eq!(added, 1);
        let last = set.get(set.len() as u32 - 1).unwrap();
        assert_eq!(last.category, Category::Spelling);
        assert_eq!(last.confidence, EXTERNAL_CONFIDENCE);
        assert!(set.is_consistent());
    }

    #[test]
    fn test_approval() {
        let mut set = aggregator().analyze(&[paragraph(0, "a  b  c")]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.approve(&[1, 7, 9]), Err(ApprovalError::UnknownIds(vec![7, 9])));
        assert_eq!(set.approved().count(), 0);
        assert_eq!(set.approve(&[1, 1]), Ok(1));
        assert_eq!(set.approve_all(), 1);
        assert_eq!(set.approved().count(), 2);
    }
}
