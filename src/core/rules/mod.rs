//! Rule engine: an ordered pipeline of text rules.
//!
//! Each rule maps paragraph text to (possibly changed text, findings). Rules
//! that rewrite feed their output to the next rule; detectors only report.
//! The order is fixed so that later rules see normalized text.

pub mod casing;
pub mod lexical;
pub mod numeric;
pub mod punctuation;
pub mod span;
pub mod style;
pub mod typography;

use tracing::{debug, warn};

use crate::core::model::Category;
use crate::core::tables::RuleTables;

pub use casing::{Capitalization, NeighborCapitalGuard, NoGuard, ProperNameGuard};
pub use span::{Edit, Grouping};

/// A single issue reported by a rule
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub category: Category,
    pub original: String,
    pub replacement: String,
    pub explanation: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutput {
    pub text: String,
    pub findings: Vec<Finding>,
}

impl RuleOutput {
    pub fn unchanged(text: &str) -> Self {
        Self { text: text.to_string(), findings: Vec::new() }
    }

    pub fn changes(&self) -> usize {
        self.findings.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule '{rule}': invalid pattern: {source}")]
    Pattern { rule: &'static str, source: regex::Error },

    #[error("rule '{rule}': cannot build matcher: {source}")]
    Matcher { rule: &'static str, source: aho_corasick::BuildError },

    #[error("rule '{rule}': {detail}")]
    Malformed { rule: &'static str, detail: String },
}

pub trait Rule: Send + Sync {
    /// Stable kebab-case name, used in configuration and logs
    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    /// Whether the output text replaces the input for later rules
    fn rewrites(&self) -> bool {
        true
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError>;
}

pub(crate) fn compile(rule: &'static str, pattern: &str) -> Result<regex::Regex, RuleError> {
    regex::Regex::new(pattern).map_err(|source| RuleError::Pattern { rule, source })
}

/// Result of running the whole pipeline on one text
#[derive(Debug, Default)]
pub struct EngineOutcome {
    pub text: String,
    pub findings: Vec<Finding>,
    /// Rules skipped because they failed on this text
    pub failed: Vec<&'static str>,
}

pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine").field("rules", &self.rule_names()).finish()
    }
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// The standard pipeline in its fixed order
    pub fn standard(tables: &RuleTables, guard: Box<dyn ProperNameGuard>) -> Result<Self, RuleError> {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(typography::MultipleSpaces::new()?),
            Box::new(typography::QuoteHierarchy),
            Box::new(punctuation::QuotePunctuation::new()?),
            Box::new(typography::DashSpacing),
            Box::new(typography::ForcedSpacing::new(&tables.units)?),
            Box::new(Capitalization::new(&tables.calendar_words(), guard)?),
            Box::new(lexical::Abbreviations::new(&tables.abbreviations)?),
            Box::new(lexical::Acronyms::new(&tables.acronyms)?),
            Box::new(numeric::NumericFormat::new()?),
            Box::new(punctuation::AdversativeComma::new(&tables.adversatives)?),
            Box::new(lexical::ForeignWords::new(&tables.loanwords)?),
            Box::new(style::PhraseRule::redundancy(&tables.redundancies)?),
            Box::new(style::PhraseRule::vague_terms(&tables.vague_terms)?),
            Box::new(style::PassiveVoice::new(
                &tables.passive_auxiliaries,
                &tables.passive_exclusions,
            )?),
            Box::new(style::GerundUse::new(&tables.gerund_exclusions)?),
            Box::new(style::PhraseRule::queismo(&tables.queismo)?),
            Box::new(style::PhraseRule::dequeismo(&tables.dequeismo)?),
            Box::new(style::PhraseRule::laismo(&tables.laismo)?),
            Box::new(style::PhraseRule::loismo(&tables.loismo)?),
        ];
        Ok(Self::new(rules))
    }

    /// Drop rules by name; returns names that matched nothing
    pub fn without(mut self, names: &[String]) -> (Self, Vec<String>) {
        let unknown = names
            .iter()
            .filter(|n| !self.rules.iter().any(|r| r.name() == n.as_str()))
            .cloned()
            .collect();
        self.rules.retain(|r| !names.iter().any(|n| n == r.name()));
        (self, unknown)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn run(&self, text: &str) -> EngineOutcome {
        let mut current = text.to_string();
        let mut outcome = EngineOutcome::default();

        for rule in &self.rules {
            match rule.transform(&current) {
                Ok(output) => {
                    if rule.rewrites() {
                        if output.text == current {
                            continue;
                        }
                        current = output.text;
                    }
                    if output.findings.is_empty() {
                        continue;
                    }
                    debug!(rule = rule.name(), changes = output.findings.len(), "rule fired");
                    outcome.findings.extend(output.findings);
                }
                Err(err) => {
                    warn!(rule = rule.name(), error = %err, "rule skipped");
                    outcome.failed.push(rule.name());
                }
            }
        }

        outcome.text = current;
        outcome
    }
}
