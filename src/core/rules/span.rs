//! Edits proposed by rules and their conversion into localized findings.
//!
//! A rule describes its changes as byte-range edits on its input. The edits
//! are spliced to produce the rule output, and grouped into token-aligned
//! spans so each finding names a short fragment that can be found again by
//! plain textual search.

use std::ops::Range;

use super::{Finding, RuleError, RuleOutput};
use crate::core::model::Category;

/// One change on a rule's input text
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
    /// Region that must appear whole in the finding (defaults to `range`)
    pub anchor: Range<usize>,
    pub note: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>, note: impl Into<String>) -> Self {
        Self { anchor: range.clone(), range, replacement: replacement.into(), note: note.into() }
    }

    pub fn anchored(mut self, anchor: Range<usize>) -> Self {
        self.anchor = anchor;
        self
    }

    fn reach(&self) -> Range<usize> {
        self.anchor.start.min(self.range.start)..self.anchor.end.max(self.range.end)
    }
}

/// How edits become findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Edits whose spans overlap share one finding
    Merge,
    /// One finding per edit, even when spans overlap
    PerEdit,
}

/// Splice sorted, non-overlapping edits into `source`
pub(crate) fn splice(rule: &'static str, source: &str, edits: &[&Edit]) -> Result<String, RuleError> {
    let mut out = String::with_capacity(source.len() + 16);
    let mut cursor = 0;
    for edit in edits {
        let Range { start, end } = edit.range;
        if start < cursor || end < start || end > source.len() {
            return Err(RuleError::Malformed {
                rule,
                detail: format!("edit {start}..{end} overlaps or leaves the text"),
            });
        }
        if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(RuleError::Malformed {
                rule,
                detail: format!("edit {start}..{end} splits a character"),
            });
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Widen a byte range to the whitespace-delimited tokens around it
pub(crate) fn token_span(text: &str, range: Range<usize>) -> Range<usize> {
    let start = text[..range.start]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let end = text[range.end..]
        .find(char::is_whitespace)
        .map_or(text.len(), |i| range.end + i);
    start..end
}

/// Build a rule's output from its edits.
///
/// Edits must not overlap each other; anchors may.
pub(crate) fn localize(
    rule: &'static str,
    category: Category,
    confidence: f32,
    source: &str,
    mut edits: Vec<Edit>,
    grouping: Grouping,
) -> Result<RuleOutput, RuleError> {
    if edits.is_empty() {
        return Ok(RuleOutput::unchanged(source));
    }
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    let all: Vec<&Edit> = edits.iter().collect();
    let text = splice(rule, source, &all)?;

    let mut groups: Vec<(Range<usize>, Vec<&Edit>)> = Vec::new();
    for edit in &edits {
        let span = token_span(source, edit.reach());
        match groups.last_mut() {
            Some((current, members))
                if grouping == Grouping::Merge && span.start < current.end =>
            {
                current.start = current.start.min(span.start);
                current.end = current.end.max(span.end);
                members.push(edit);
            }
            _ => groups.push((span, vec![edit])),
        }
    }

    let mut findings = Vec::with_capacity(groups.len());
    for (span, members) in groups {
        let shifted: Vec<Edit> = members
            .iter()
            .map(|e| Edit {
                range: e.range.start - span.start..e.range.end - span.start,
                ..(*e).clone()
            })
            .collect();
        let refs: Vec<&Edit> = shifted.iter().collect();
        let original = &source[span.clone()];
        let replacement = splice(rule, original, &refs)?;
        if replacement == original {
            continue;
        }

        let mut notes: Vec<&str> = Vec::new();
        for edit in &members {
            if !notes.contains(&edit.note.as_str()) {
                notes.push(&edit.note);
            }
        }

        findings.push(Finding {
            category,
            original: original.to_string(),
            replacement,
            explanation: notes.join("; "),
            confidence,
        });
    }

    Ok(RuleOutput { text, findings })
}

/// Give `replacement` the case of the first letter of `original`
pub(crate) fn match_case(original: &str, replacement: &str) -> String {
    let upper = original.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if upper => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}

/// Previous and next characters around a byte range
pub(crate) fn neighbours(text: &str, range: &Range<usize>) -> (Option<char>, Option<char>) {
    (text[..range.start].chars().next_back(), text[range.end..].chars().next())
}
