//! Lowercase weekday, month and season names.

use std::ops::Range;

use regex::Regex;

use super::span::{Edit, Grouping, localize};
use super::{Rule, RuleError, RuleOutput, compile};
use crate::core::model::Category;

/// Decides whether a capitalized calendar word is part of a proper name
/// ("Domingo de Ramos", "Primero de Mayo") and must keep its capital.
pub trait ProperNameGuard: Send + Sync {
    fn is_proper_name(&self, text: &str, word: Range<usize>) -> bool;
}

/// Protects a word next to another capitalized token, directly or across `de`
#[derive(Debug, Default, Clone, Copy)]
pub struct NeighborCapitalGuard;

/// Protects nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGuard;

fn capitalized(token: &str) -> bool {
    token.chars().find(|c| c.is_alphabetic()).is_some_and(char::is_uppercase)
}

impl ProperNameGuard for NeighborCapitalGuard {
    fn is_proper_name(&self, text: &str, word: Range<usize>) -> bool {
        let before: Vec<&str> = text[..word.start].split_whitespace().collect();
        let after: Vec<&str> = text[word.end..].split_whitespace().collect();

        match before.as_slice() {
            [.., prev] if capitalized(prev) => return true,
            [.., name, de] if de.eq_ignore_ascii_case("de") && capitalized(name) => return true,
            _ => {}
        }
        match after.as_slice() {
            [next, ..] if capitalized(next) => true,
            [de, name, ..] if de.eq_ignore_ascii_case("de") && capitalized(name) => true,
            _ => false,
        }
    }
}

impl ProperNameGuard for NoGuard {
    fn is_proper_name(&self, _: &str, _: Range<usize>) -> bool {
        false
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// True when only opening punctuation separates `at` from a sentence boundary
fn is_sentence_start(text: &str, at: usize) -> bool {
    let before = text[..at].trim_end_matches(|c: char| c.is_whitespace() || "«“‘\"'([—–-".contains(c));
    before.is_empty() || before.ends_with(['.', '!', '?', '¿', '¡', '…'])
}

pub struct Capitalization {
    pattern: Option<Regex>,
    guard: Box<dyn ProperNameGuard>,
}

impl std::fmt::Debug for Capitalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capitalization").field("pattern", &self.pattern).finish_non_exhaustive()
    }
}

impl Capitalization {
    pub fn new(words: &[String], guard: Box<dyn ProperNameGuard>) -> Result<Self, RuleError> {
        if words.is_empty() {
            return Ok(Self { pattern: None, guard });
        }
        let alternation: Vec<String> =
            words.iter().map(|w| regex::escape(&capitalize(&w.to_lowercase()))).collect();
        let pattern = format!(r"\b(?:{})\b", alternation.join("|"));
        Ok(Self { pattern: Some(compile("capitalization", &pattern)?), guard })
    }
}

impl Rule for Capitalization {
    fn name(&self) -> &'static str {
        "capitalization"
    }

    fn category(&self) -> Category {
        Category::Capitalization
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let Some(pattern) = &self.pattern else {
            return Ok(RuleOutput::unchanged(text));
        };
        let edits = pattern
            .find_iter(text)
            .filter(|m| !is_sentence_start(text, m.start()))
            .filter(|m| !self.guard.is_proper_name(text, m.range()))
            .map(|m| {
                Edit::new(
                    m.range(),
                    m.as_str().to_lowercase(),
                    "Días, meses y estaciones se escriben con minúscula",
                )
            })
            .collect();
        localize(self.name(), self.category(), 0.90, text, edits, Grouping::Merge)
    }
}
