//! Style detectors. They report, they never rewrite the paragraph text.

use std::ops::Range;

use indexmap::IndexMap;
use regex::Regex;

use super::span::match_case;
use super::{Finding, Rule, RuleError, RuleOutput, compile};
use crate::core::model::Category;

const STYLE_CONFIDENCE: f32 = 0.70;

fn normalize(phrase: &str) -> String {
    phrase.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn alternation(items: impl Iterator<Item = String>, flexible_spaces: bool) -> String {
    let mut items: Vec<String> = items.filter(|i| !i.trim().is_empty()).collect();
    items.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    items
        .iter()
        .map(|i| {
            let escaped = regex::escape(i.trim());
            if flexible_spaces { escaped.replace(' ', r"\s+") } else { escaped }
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Fixed phrases mapped to a suggestion, matched case-insensitively
#[derive(Debug)]
pub struct PhraseRule {
    name: &'static str,
    category: Category,
    pattern: Option<Regex>,
    table: IndexMap<String, String>,
    note: &'static str,
    /// Suggestion goes into the explanation instead of the replacement
    advisory: bool,
}

impl PhraseRule {
    pub fn new(
        name: &'static str,
        category: Category,
        table: &IndexMap<String, String>,
        note: &'static str,
        advisory: bool,
    ) -> Result<Self, RuleError> {
        let table: IndexMap<String, String> =
            table.iter().map(|(k, v)| (normalize(k), v.clone())).filter(|(k, _)| !k.is_empty()).collect();
        let pattern = if table.is_empty() {
            None
        } else {
            let body = alternation(table.keys().cloned(), true);
            Some(compile(name, &format!(r"(?i)\b(?:{body})\b"))?)
        };
        Ok(Self { name, category, pattern, table, note, advisory })
    }

    pub fn redundancy(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        Self::new("redundancy", Category::Redundancy, table, "Redundancia: sobra una palabra", false)
    }

    pub fn vague_terms(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        Self::new("vague-terms", Category::VagueTerm, table, "Término vago", true)
    }

    pub fn queismo(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        Self::new("queismo", Category::Queismo, table, "Queísmo: falta «de» antes de «que»", false)
    }

    pub fn dequeismo(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        Self::new("dequeismo", Category::Dequeismo, table, "Dequeísmo: sobra «de» antes de «que»", false)
    }

    pub fn laismo(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        Self::new(
            "laismo",
            Category::Laismo,
            table,
            "Laísmo: el complemento indirecto femenino es «le»",
            false,
        )
    }

    pub fn loismo(table: &IndexMap<String, String>) -> Result<Self, RuleError> {
        Self::new(
            "loismo",
            Category::Loismo,
            table,
            "Loísmo: el complemento indirecto masculino es «le»",
            false,
        )
    }
}

impl Rule for PhraseRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> Category {
        self.category
    }

    fn rewrites(&self) -> bool {
        false
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut out = RuleOutput::unchanged(text);
        let Some(pattern) = &self.pattern else {
            return Ok(out);
        };
        for m in pattern.find_iter(text) {
            let original = m.as_str();
            let Some(suggestion) = self.table.get(&normalize(original)) else {
                continue;
            };
            let (replacement, explanation) = if self.advisory {
                (original.to_string(), format!("{}: considere «{suggestion}»", self.note))
            } else {
                (match_case(original, suggestion), self.note.to_string())
            };
            out.findings.push(Finding {
                category: self.category,
                original: original.to_string(),
                replacement,
                explanation,
                confidence: STYLE_CONFIDENCE,
            });
        }
        Ok(out)
    }
}

fn advisory(category: Category, original: &str, explanation: &str) -> Finding {
    Finding {
        category,
        original: original.to_string(),
        replacement: original.to_string(),
        explanation: explanation.to_string(),
        confidence: STYLE_CONFIDENCE,
    }
}

/// Periphrastic passive: a form of *ser* followed by a regular participle
#[derive(Debug)]
pub struct PassiveVoice {
    pattern: Option<Regex>,
    exclusions: Vec<String>,
}

impl PassiveVoice {
    pub fn new(auxiliaries: &[String], exclusions: &[String]) -> Result<Self, RuleError> {
        if auxiliaries.is_empty() {
            return Ok(Self { pattern: None, exclusions: Vec::new() });
        }
        let aux = alternation(auxiliaries.iter().cloned(), false);
        let pattern = format!(r"(?i)\b(?:{aux})\s+(\w+(?:ad|id)(?:o|a|os|as))\b");
        Ok(Self {
            pattern: Some(compile("passive-voice", &pattern)?),
            exclusions: exclusions.iter().map(|e| e.to_lowercase()).collect(),
        })
    }
}

impl Rule for PassiveVoice {
    fn name(&self) -> &'static str {
        "passive-voice"
    }

    fn category(&self) -> Category {
        Category::PassiveVoice
    }

    fn rewrites(&self) -> bool {
        false
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut out = RuleOutput::unchanged(text);
        let Some(pattern) = &self.pattern else {
            return Ok(out);
        };
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(participle)) = (caps.get(0), caps.get(1)) else { continue };
            if self.exclusions.contains(&participle.as_str().to_lowercase()) {
                continue;
            }
            out.findings.push(advisory(
                self.category(),
                whole.as_str(),
                "Voz pasiva perifrástica: considere la voz activa",
            ));
        }
        Ok(out)
    }
}

/// Gerund of posteriority: after a comma, after *y*, or closing a sentence
#[derive(Debug)]
pub struct GerundUse {
    linked: Regex,
    closing: Regex,
    exclusions: Vec<String>,
}

impl GerundUse {
    pub fn new(exclusions: &[String]) -> Result<Self, RuleError> {
        Ok(Self {
            linked: compile("gerund", r"(?i)(,\s*|\by\s+)(\w+(?:ando|iendo|yendo))\b")?,
            closing: compile("gerund", r"(?i)\b(\w+(?:ando|iendo|yendo))[.!?]")?,
            exclusions: exclusions.iter().map(|e| e.to_lowercase()).collect(),
        })
    }

    fn excluded(&self, word: &str) -> bool {
        self.exclusions.contains(&word.to_lowercase())
    }
}

impl Rule for GerundUse {
    fn name(&self) -> &'static str {
        "gerund"
    }

    fn category(&self) -> Category {
        Category::Gerund
    }

    fn rewrites(&self) -> bool {
        false
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut out = RuleOutput::unchanged(text);
        let mut seen: Vec<Range<usize>> = Vec::new();

        for caps in self.linked.captures_iter(text) {
            let (Some(whole), Some(link), Some(word)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            if self.excluded(word.as_str()) {
                continue;
            }
            let explanation = if link.as_str().starts_with(',') {
                "Gerundio de posterioridad tras coma: use un verbo conjugado"
            } else {
                "Gerundio tras «y»: use un verbo conjugado"
            };
            seen.push(word.range());
            out.findings.push(advisory(self.category(), whole.as_str(), explanation));
        }

        for caps in self.closing.captures_iter(text) {
            let Some(word) = caps.get(1) else { continue };
            if self.excluded(word.as_str()) || seen.contains(&word.range()) {
                continue;
            }
            out.findings.push(advisory(
                self.category(),
                word.as_str(),
                "Gerundio que expresa resultado al cierre de la oración",
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::RuleTables;

    #[test]
    fn test_concrete_phrase_fix_keeps_case() {
        let tables = RuleTables::default();
        let rule = PhraseRule::queismo(&tables.queismo).unwrap();
        let out = rule.transform("Me alegro que vengas. Estoy seguro  que sí.").unwrap();
        assert_eq!(out.text, "Me alegro que vengas. Estoy seguro  que sí.");
        assert_eq!(out.changes(), 2);
        assert_eq!(out.findings[0].replacement, "Me alegro de que");
        assert_eq!(out.findings[1].original, "Estoy seguro  que");
        assert_eq!(out.findings[1].replacement, "Estoy seguro de que");
    }

    #[test]
    fn test_vague_terms_are_advisory() {
        let tables = RuleTables::default();
        let rule = PhraseRule::vague_terms(&tables.vague_terms).unwrap();
        let out = rule.transform("La cosa es que compró cosas.").unwrap();
        assert_eq!(out.changes(), 2);
        assert!(out.findings.iter().all(|f| f.original == f.replacement));
        assert!(out.findings[0].explanation.contains("el asunto es que"));
    }

    #[test]
    fn test_laismo_and_redundancy() {
        let tables = RuleTables::default();
        let laismo = PhraseRule::laismo(&tables.laismo).unwrap();
        let out = laismo.transform("La dije la verdad; la dimos por buena.").unwrap();
        assert_eq!(out.changes(), 1);
        assert_eq!(out.findings[0].replacement, "Le dije");

        let redundancy = PhraseRule::redundancy(&tables.redundancies).unwrap();
        let out = redundancy.transform("Hay que subir arriba.").unwrap();
        assert_eq!(out.findings[0].replacement, "subir");
        assert_eq!(out.findings[0].category, Category::Redundancy);
    }

    #[test]
    fn test_passive_voice() {
        let tables = RuleTables::default();
        let rule = PassiveVoice::new(&tables.passive_auxiliaries, &tables.passive_exclusions).unwrap();
        let out = rule.transform("El documento fue revisado por el equipo. Eso no es nada.").unwrap();
        assert_eq!(out.changes(), 1);
        assert_eq!(out.findings[0].original, "fue revisado");
        assert_eq!(out.findings[0].replacement, "fue revisado");
    }

    #[test]
    fn test_gerund_detection() {
        let rule = GerundUse::new(&RuleTables::default().gerund_exclusions).unwrap();
        let out = rule
            .transform("Hizo una película, causando expectación, cuando llegó y saliendo después terminó cantando.")
            .unwrap();
        let originals: Vec<_> = out.findings.iter().map(|f| f.original.as_str()).collect();
        assert_eq!(originals, [", causando", "y saliendo", "cantando"]);
    }
}
