use regex::Regex;

use super::span::{Edit, Grouping, localize, neighbours};
use super::{Rule, RuleError, RuleOutput, compile};
use crate::core::model::Category;

/// Period, comma, semicolon or colon go after the closing quote
#[derive(Debug)]
pub struct QuotePunctuation {
    pattern: Regex,
}

impl QuotePunctuation {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self { pattern: compile("quote-punctuation", "([.,;:])([»”’]+)")? })
    }
}

impl Rule for QuotePunctuation {
    fn name(&self) -> &'static str {
        "quote-punctuation"
    }

    fn category(&self) -> Category {
        Category::Typography
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut edits = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            let (Some(whole), Some(mark), Some(closers)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let (before, after) = neighbours(text, &whole.range());
            // Ellipsis stays inside; an existing mark outside means nothing to move
            if before == Some('.') || after.is_some_and(|c| ".,;:".contains(c)) {
                continue;
            }
            edits.push(Edit::new(
                whole.range(),
                format!("{}{}", closers.as_str(), mark.as_str()),
                "Puntuación después de las comillas de cierre",
            ));
        }
        localize(self.name(), self.category(), 0.95, text, edits, Grouping::Merge)
    }
}

/// Comma before adversative conjunctions
#[derive(Debug)]
pub struct AdversativeComma {
    pattern: Option<Regex>,
}

impl AdversativeComma {
    pub fn new(conjunctions: &[String]) -> Result<Self, RuleError> {
        if conjunctions.is_empty() {
            return Ok(Self { pattern: None });
        }
        let alternation: Vec<String> = conjunctions.iter().map(|c| regex::escape(c)).collect();
        let pattern = format!(r"(?i)\w( +)({})\b", alternation.join("|"));
        Ok(Self { pattern: Some(compile("adversative-comma", &pattern)?) })
    }
}

impl Rule for AdversativeComma {
    fn name(&self) -> &'static str {
        "adversative-comma"
    }

    fn category(&self) -> Category {
        Category::Punctuation
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let Some(pattern) = &self.pattern else {
            return Ok(RuleOutput::unchanged(text));
        };
        let mut edits = Vec::new();
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(gap), Some(word)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let note = format!("Coma antes de «{}»", word.as_str().to_lowercase());
            edits.push(
                Edit::new(gap.start()..gap.start(), ",", note).anchored(whole.start()..word.end()),
            );
        }
        localize(self.name(), self.category(), 0.80, text, edits, Grouping::Merge)
    }
}
