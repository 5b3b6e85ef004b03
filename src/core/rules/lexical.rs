//! Table-driven word rules: abbreviations, acronyms and loanwords.

use aho_corasick::{AhoCorasick, MatchKind};
use indexmap::IndexMap;
use regex::Regex;

use super::span::{Edit, Grouping, localize, match_case, neighbours};
use super::{Finding, Rule, RuleError, RuleOutput, compile};
use crate::core::model::Category;

fn longest_first(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.filter(|k| !k.is_empty()).collect();
    keys.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    keys
}

fn standalone(text: &str, start: usize, end: usize) -> bool {
    let (before, after) = neighbours(text, &(start..end));
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Known abbreviations written without their period
#[derive(Debug)]
pub struct Abbreviations {
    pattern: Option<Regex>,
    table: IndexMap<String, String>,
}

impl Abbreviations {
    pub fn new(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        let keys = longest_first(table.keys().cloned());
        if keys.is_empty() {
            return Ok(Self { pattern: None, table: table.clone() });
        }
        let alternation: Vec<String> = keys.iter().map(|k| regex::escape(k)).collect();
        let pattern = format!(r"\b(?:{})\b", alternation.join("|"));
        Ok(Self { pattern: Some(compile("abbreviations", &pattern)?), table: table.clone() })
    }
}

impl Rule for Abbreviations {
    fn name(&self) -> &'static str {
        "abbreviations"
    }

    fn category(&self) -> Category {
        Category::Abbreviation
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let Some(pattern) = &self.pattern else {
            return Ok(RuleOutput::unchanged(text));
        };
        let mut edits = Vec::new();
        for m in pattern.find_iter(text) {
            if text[m.end()..].starts_with('.') {
                continue;
            }
            let Some(fixed) = self.table.get(m.as_str()) else { continue };
            if fixed == m.as_str() {
                continue;
            }
            edits.push(Edit::new(m.range(), fixed.clone(), format!("Abreviatura: «{fixed}»")));
        }
        localize(self.name(), self.category(), 0.95, text, edits, Grouping::Merge)
    }
}

/// Malformed acronyms from an exact lookup table
#[derive(Debug)]
pub struct Acronyms {
    matcher: Option<AhoCorasick>,
    replacements: Vec<String>,
}

impl Acronyms {
    pub fn new(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        let keys = longest_first(table.keys().cloned());
        if keys.is_empty() {
            return Ok(Self { matcher: None, replacements: Vec::new() });
        }
        let replacements = keys.iter().map(|k| table[k].clone()).collect();
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&keys)
            .map_err(|source| RuleError::Matcher { rule: "acronyms", source })?;
        Ok(Self { matcher: Some(matcher), replacements })
    }
}

impl Rule for Acronyms {
    fn name(&self) -> &'static str {
        "acronyms"
    }

    fn category(&self) -> Category {
        Category::Acronym
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let Some(matcher) = &self.matcher else {
            return Ok(RuleOutput::unchanged(text));
        };
        let mut edits = Vec::new();
        for m in matcher.find_iter(text) {
            if !standalone(text, m.start(), m.end()) {
                continue;
            }
            let fixed = &self.replacements[m.pattern().as_usize()];
            if *fixed == text[m.start()..m.end()] {
                continue;
            }
            edits.push(Edit::new(m.start()..m.end(), fixed.clone(), format!("Sigla: «{fixed}»")));
        }
        localize(self.name(), self.category(), 0.95, text, edits, Grouping::Merge)
    }
}

/// Loanwords with a native alternative; reported, never rewritten
#[derive(Debug)]
pub struct ForeignWords {
    matcher: Option<AhoCorasick>,
    alternatives: Vec<String>,
}

impl ForeignWords {
    pub fn new(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        // Entries already adapted to Spanish carry no advice
        let keys = longest_first(
            table.iter().filter(|(k, v)| !k.eq_ignore_ascii_case(v)).map(|(k, _)| k.clone()),
        );
        if keys.is_empty() {
            return Ok(Self { matcher: None, alternatives: Vec::new() });
        }
        let alternatives = keys.iter().map(|k| table[k].clone()).collect();
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&keys)
            .map_err(|source| RuleError::Matcher { rule: "foreign-words", source })?;
        Ok(Self { matcher: Some(matcher), alternatives })
    }
}

impl Rule for ForeignWords {
    fn name(&self) -> &'static str {
        "foreign-words"
    }

    fn category(&self) -> Category {
        Category::ForeignWord
    }

    fn rewrites(&self) -> bool {
        false
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut out = RuleOutput::unchanged(text);
        let Some(matcher) = &self.matcher else {
            return Ok(out);
        };
        for m in matcher.find_iter(text) {
            if !standalone(text, m.start(), m.end()) {
                continue;
            }
            let original = &text[m.start()..m.end()];
            let alternative = &self.alternatives[m.pattern().as_usize()];
            out.findings.push(Finding {
                category: self.category(),
                original: original.to_string(),
                replacement: match_case(original, alternative),
                explanation: format!(
                    "Extranjerismo: considere «{alternative}» o escríbalo en cursiva"
                ),
                confidence: 0.75,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::RuleTables;

    #[test]
    fn test_abbreviation_gets_period() {
        let rule = Abbreviations::new(&RuleTables::default().abbreviations).unwrap();
        let out = rule.transform("El Sr García, la Sra. Pérez, etc y p ej esto").unwrap();
        assert_eq!(out.text, "El Sr. García, la Sra. Pérez, etc. y p. ej. esto");
        assert_eq!(out.changes(), 3);
        assert_eq!(out.findings[0].original, "Sr");
        assert_eq!(out.findings[2].original, "p ej");
        assert!(rule.transform(&out.text).unwrap().findings.is_empty());
    }

    #[test]
    fn test_acronyms_exact_lookup() {
        let rule = Acronyms::new(&RuleTables::default().acronyms).unwrap();
        let out = rule.transform("La O.N.U. y los EE.UU. firmaron; EEUUx no cuenta").unwrap();
        assert_eq!(out.text, "La ONU y los EE. UU. firmaron; EEUUx no cuenta");
        assert_eq!(out.changes(), 2);
        assert!(rule.transform(&out.text).unwrap().findings.is_empty());
    }

    #[test]
    fn test_foreign_words_are_reported_only() {
        let rule = ForeignWords::new(&RuleTables::default().loanwords).unwrap();
        assert!(!rule.rewrites());
        let out = rule.transform("Mándame un Email con el feedback; el linking no.").unwrap();
        assert_eq!(out.text, "Mándame un Email con el feedback; el linking no.");
        assert_eq!(out.changes(), 2);
        assert_eq!(out.findings[0].original, "Email");
        assert_eq!(out.findings[0].replacement, "Correo electrónico");
        assert_eq!(out.findings[1].replacement, "retroalimentación");
    }
}
