use regex::Regex;

use super::span::{Edit, Grouping, localize, neighbours};
use super::{Rule, RuleError, RuleOutput, compile};
use crate::core::model::Category;

/// Decimal comma and the spacing of the hour symbol
#[derive(Debug)]
pub struct NumericFormat {
    decimal: Regex,
    hour: Regex,
}

impl NumericFormat {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self {
            decimal: compile("numeric-format", r"\d+\.\d{1,2}")?,
            hour: compile("numeric-format", r"\d{1,2}:\d{2}h")?,
        })
    }

    fn decimal_edits(&self, text: &str, edits: &mut Vec<Edit>) {
        for m in self.decimal.find_iter(text) {
            let (before, after) = neighbours(text, &m.range());
            // Versions, dotted dates and codes are not decimals
            if before.is_some_and(|c| c.is_alphanumeric() || c == '.' || c == ',') {
                continue;
            }
            if after.is_some_and(char::is_alphanumeric) {
                continue;
            }
            let rest = &text[m.end()..];
            if rest.starts_with(['.', ',']) && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            // 13.30 h is a time of day
            let tail = rest.trim_start_matches([' ', '\u{a0}']);
            if tail.starts_with('h') && !tail[1..].starts_with(char::is_alphanumeric) {
                continue;
            }
            let Some(dot) = m.as_str().find('.') else { continue };
            let at = m.start() + dot;
            edits.push(Edit::new(at..at + 1, ",", "Coma decimal en lugar de punto"));
        }
    }

    fn hour_edits(&self, text: &str, edits: &mut Vec<Edit>) {
        for m in self.hour.find_iter(text) {
            let (before, after) = neighbours(text, &m.range());
            if before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(char::is_alphanumeric) {
                continue;
            }
            let h = m.end() - 1;
            edits.push(Edit::new(h..h, "\u{a0}", "Espacio duro antes del símbolo de hora"));
        }
    }
}

impl Rule for NumericFormat {
    fn name(&self) -> &'static str {
        "numeric-format"
    }

    fn category(&self) -> Category {
        Category::Numbers
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut edits = Vec::new();
        self.decimal_edits(text, &mut edits);
        self.hour_edits(text, &mut edits);
        localize(self.name(), self.category(), 0.85, text, edits, Grouping::Merge)
    }
}
