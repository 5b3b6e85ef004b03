//! Domain types shared by the analysis and encoding stages.

use serde::{Deserialize, Serialize};

use crate::infra::xml::{Element, Node};

/// WordprocessingML main namespace
pub const WORD_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Closed set of correction categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Spelling,
    Typography,
    Capitalization,
    Abbreviation,
    Acronym,
    Numbers,
    Punctuation,
    ForeignWord,
    PassiveVoice,
    Gerund,
    Queismo,
    Dequeismo,
    Laismo,
    Loismo,
    VagueTerm,
    Redundancy,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Spelling,
        Category::Typography,
        Category::Capitalization,
        Category::Abbreviation,
        Category::Acronym,
        Category::Numbers,
        Category::Punctuation,
        Category::ForeignWord,
        Category::PassiveVoice,
        Category::Gerund,
        Category::Queismo,
        Category::Dequeismo,
        Category::Laismo,
        Category::Loismo,
        Category::VagueTerm,
        Category::Redundancy,
    ];

    /// Stable machine key, same as the serialized form
    pub fn key(self) -> &'static str {
        match self {
            Category::Spelling => "spelling",
            Category::Typography => "typography",
            Category::Capitalization => "capitalization",
            Category::Abbreviation => "abbreviation",
            Category::Acronym => "acronym",
            Category::Numbers => "numbers",
            Category::Punctuation => "punctuation",
            Category::ForeignWord => "foreign_word",
            Category::PassiveVoice => "passive_voice",
            Category::Gerund => "gerund",
            Category::Queismo => "queismo",
            Category::Dequeismo => "dequeismo",
            Category::Laismo => "laismo",
            Category::Loismo => "loismo",
            Category::VagueTerm => "vague_term",
            Category::Redundancy => "redundancy",
        }
    }
}

/// A proposed change to one paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub id: u32,
    pub category: Category,
    pub original_span: String,
    pub replacement_span: String,
    pub explanation: String,
    pub confidence: f32,
    pub paragraph_index: usize,
    #[serde(default)]
    pub approved: bool,
}

impl Correction {
    /// Style hints carry no rewrite; applying one would be a no-op
    pub fn is_advisory(&self) -> bool {
        self.original_span == self.replacement_span
    }
}

/// Prefix resolution for WordprocessingML names in one part.
///
/// Documents almost always use `w:`, but the prefix is whatever the root
/// element binds to [`WORD_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordNs {
    prefix: Option<String>,
}

impl WordNs {
    pub fn detect(root: &Element) -> Option<Self> {
        root.prefix_bound_to(WORD_NAMESPACE).map(|prefix| Self { prefix })
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self { prefix: Some(prefix.to_string()) }
    }

    /// Qualified name for a local WordprocessingML name
    pub fn q(&self, local: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{local}"),
            None => local.to_string(),
        }
    }

    pub fn is(&self, element: &Element, local: &str) -> bool {
        match (&self.prefix, element.name.split_once(':')) {
            (Some(p), Some((ep, el))) => ep == p && el == local,
            (None, None) => element.name == local,
            _ => false,
        }
    }

    pub fn is_any(&self, element: &Element, locals: &[&str]) -> bool {
        locals.iter().any(|l| self.is(element, l))
    }
}

/// `w:rPr` children in CT_RPr sequence order
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath",
];

fn schema_rank(element: &Element) -> usize {
    RPR_ORDER.iter().position(|l| *l == element.local_name()).unwrap_or(RPR_ORDER.len())
}

/// Run property bag (the children of `w:rPr`).
///
/// A value type: cloning yields an independent copy, and overrides never
/// leak into the run the format was read from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunFormat {
    properties: Vec<Element>,
}

impl RunFormat {
    pub fn from_rpr(rpr: Option<&Element>) -> Self {
        let properties = rpr.map(|r| r.elements().cloned().collect()).unwrap_or_default();
        Self { properties }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn properties(&self) -> &[Element] {
        &self.properties
    }

    pub fn get(&self, local: &str) -> Option<&Element> {
        self.properties.iter().find(|p| p.local_name() == local)
    }

    /// Replace a property in place, or insert it at its schema position
    pub fn with_property(mut self, ns: &WordNs, local: &str, value: &str) -> Self {
        let property = Element::new(ns.q(local)).with_attr(ns.q("val"), value);
        if let Some(existing) = self.properties.iter_mut().find(|p| p.local_name() == local) {
            *existing = property;
            return self;
        }
        let rank = schema_rank(&property);
        let at = self
            .properties
            .iter()
            .position(|p| schema_rank(p) > rank)
            .unwrap_or(self.properties.len());
        self.properties.insert(at, property);
        self
    }

    pub fn with_color(self, ns: &WordNs, hex: &str) -> Self {
        self.with_property(ns, "color", hex)
    }

    pub fn with_underline(self, ns: &WordNs, style: &str) -> Self {
        self.with_property(ns, "u", style)
    }

    /// `w:rPr` element, or `None` when there is nothing to write
    pub fn to_rpr(&self, ns: &WordNs) -> Option<Element> {
        if self.properties.is_empty() {
            return None;
        }
        let mut rpr = Element::new(ns.q("rPr"));
        rpr.children = self.properties.iter().cloned().map(Node::Element).collect();
        Some(rpr)
    }
}

/// A contiguous span of text with uniform formatting
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
}

/// One body paragraph as seen by the rule engine
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Zero-based position among the body's direct paragraphs
    pub index: usize,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        text_of(self)
    }

    /// Format of the first run, the template for rewritten content
    pub fn first_format(&self) -> RunFormat {
        self.runs.first().map(|r| r.format.clone()).unwrap_or_default()
    }
}

pub fn text_of(paragraph: &Paragraph) -> String {
    paragraph.runs.iter().map(|r| r.text.as_str()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    Insertion,
    Deletion,
}

/// A tracked change produced by the encoder
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionMark {
    pub kind: RevisionKind,
    pub id: u64,
    pub author: String,
    pub timestamp: String,
    pub text: String,
    pub format: RunFormat,
}
