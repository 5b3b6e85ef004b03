//! Compose approved corrections per paragraph and write them as revisions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::core::aggregate::CandidateSet;
use crate::core::cleanup::accept_all_revisions;
use crate::core::container::{DocxPackage, max_revision_id};
use crate::core::encode::{
    DEFAULT_AUTHOR, EncodeMode, InsertStyle, MarkupEncoder, RevisionStamp,
};
use crate::core::model::{Correction, Paragraph, RevisionKind};

/// How a correction's original span is located in the paragraph text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacePolicy {
    /// Replace the first occurrence only
    #[default]
    FirstOccurrence,
    /// Replace every occurrence
    AllOccurrences,
}

/// Result of composing one paragraph's corrections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub text: String,
    pub applied: Vec<u32>,
    pub unmatched: Vec<u32>,
}

/// Apply corrections in order by textual replacement
pub fn compose(original: &str, corrections: &[&Correction], policy: ReplacePolicy) -> Composition {
    let mut text = original.to_string();
    let mut applied = Vec::new();
    let mut unmatched = Vec::new();

    for c in corrections {
        if c.original_span.is_empty() || !text.contains(&c.original_span) {
            unmatched.push(c.id);
            continue;
        }
        text = match policy {
            ReplacePolicy::FirstOccurrence => text.replacen(&c.original_span, &c.replacement_span, 1),
            ReplacePolicy::AllOccurrences => text.replace(&c.original_span, &c.replacement_span),
        };
        applied.push(c.id);
    }
    Composition { text, applied, unmatched }
}

/// Target text for one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphPlan {
    pub index: usize,
    pub original: String,
    pub corrected: String,
    pub applied: Vec<u32>,
    pub unmatched: Vec<u32>,
}

impl ParagraphPlan {
    pub fn is_change(&self) -> bool {
        self.original != self.corrected
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// In paragraph order
    pub paragraphs: Vec<ParagraphPlan>,
    pub advisory_skipped: Vec<u32>,
    /// Corrections pointing past the last paragraph
    pub out_of_range: Vec<u32>,
}

/// Group corrections by paragraph and compose each group
pub fn plan_corrections(
    paragraphs: &[Paragraph],
    corrections: &[&Correction],
    policy: ReplacePolicy,
) -> Plan {
    let mut plan = Plan::default();
    let mut groups: IndexMap<usize, Vec<&Correction>> = IndexMap::new();

    for &c in corrections {
        if c.is_advisory() {
            plan.advisory_skipped.push(c.id);
        } else if c.paragraph_index >= paragraphs.len() {
            plan.out_of_range.push(c.id);
        } else {
            groups.entry(c.paragraph_index).or_default().push(c);
        }
    }
    groups.sort_keys();

    for (index, group) in groups {
        let original = paragraphs[index].text();
        let composed = compose(&original, &group, policy);
        plan.paragraphs.push(ParagraphPlan {
            index,
            original,
            corrected: composed.text,
            applied: composed.applied,
            unmatched: composed.unmatched,
        });
    }
    plan
}

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub author: String,
    pub insert_style: InsertStyle,
    pub mode: EncodeMode,
    pub policy: ReplacePolicy,
    /// Fixed revision date; the current time when `None`
    pub timestamp: Option<String>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            insert_style: InsertStyle::default(),
            mode: EncodeMode::default(),
            policy: ReplacePolicy::default(),
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkRecord {
    pub paragraph_index: usize,
    pub kind: RevisionKind,
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingFailure {
    pub paragraph_index: usize,
    pub error: String,
}

/// What one apply pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub revisions_accepted: usize,
    pub paragraphs_modified: usize,
    pub corrections_applied: Vec<u32>,
    pub corrections_unmatched: Vec<u32>,
    pub advisory_skipped: Vec<u32>,
    pub out_of_range: Vec<u32>,
    pub revision_marks: Vec<MarkRecord>,
    pub encoding_failures: Vec<EncodingFailure>,
}

/// Accept existing revisions, then write `corrections` into the package.
///
/// Paragraph indexes refer to the cleaned document, which is also what
/// analysis sees.
#[instrument(level = "debug", skip_all, fields(corrections = corrections.len()))]
pub fn apply_corrections(
    package: &mut DocxPackage,
    corrections: &[&Correction],
    options: &ApplyOptions,
) -> ApplyReport {
    let mut report = ApplyReport {
        revisions_accepted: accept_all_revisions(package),
        ..ApplyReport::default()
    };

    let plan = plan_corrections(&package.paragraphs(), corrections, options.policy);
    report.advisory_skipped = plan.advisory_skipped;
    report.out_of_range = plan.out_of_range;
    for id in &report.out_of_range {
        warn!(id, "correction points past the last paragraph");
    }

    let (ns, body) = package.parts_mut();
    let first_id = max_revision_id(ns, body) + 1;
    let stamp = match &options.timestamp {
        Some(date) => RevisionStamp::new(options.author.as_str(), date.as_str(), first_id),
        None => RevisionStamp::now(options.author.as_str(), first_id),
    };
    let mut encoder =
        MarkupEncoder::new(ns.clone(), stamp, options.insert_style.clone(), options.mode);

    let mut pending = plan.paragraphs.into_iter().peekable();
    for (index, paragraph) in body.elements_mut().filter(|e| ns.is(e, "p")).enumerate() {
        let Some(step) = pending.next_if(|p| p.index == index) else { continue };
        report.corrections_unmatched.extend(&step.unmatched);
        if !step.is_change() {
            continue;
        }
        match encoder.rewrite_paragraph(paragraph, &step.original, &step.corrected) {
            Ok(marks) => {
                report.paragraphs_modified += 1;
                report.corrections_applied.extend(&step.applied);
                report.revision_marks.extend(marks.into_iter().map(|m| MarkRecord {
                    paragraph_index: index,
                    kind: m.kind,
                    id: m.id,
                    text: m.text,
                }));
            }
            Err(err) => {
                warn!(paragraph = index, error = %err, "paragraph left unmodified");
                report.corrections_unmatched.extend(&step.applied);
                report
                    .encoding_failures
                    .push(EncodingFailure { paragraph_index: index, error: err.to_string() });
            }
        }
    }

    info!(
        paragraphs = report.paragraphs_modified,
        applied = report.corrections_applied.len(),
        unmatched = report.corrections_unmatched.len(),
        "corrections written"
    );
    report
}

/// Write every approved candidate of `set`
pub fn apply_approved(
    package: &mut DocxPackage,
    set: &CandidateSet,
    options: &ApplyOptions,
) -> ApplyReport {
    let approved: Vec<&Correction> = set.approved().collect();
    apply_corrections(package, &approved, options)
}
