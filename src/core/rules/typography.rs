//! Spacing, quotation marks and dashes.

use regex::Regex;

use super::span::{Edit, Grouping, localize, neighbours};
use super::{Rule, RuleError, RuleOutput, compile};
use crate::core::model::Category;

const NBSP: &str = "\u{a0}";
const EM_DASH: char = '—';

/// Runs of two or more plain spaces collapse to one
#[derive(Debug)]
pub struct MultipleSpaces {
    runs: Regex,
}

impl MultipleSpaces {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self { runs: compile("multiple-spaces", " {2,}")? })
    }
}

impl Rule for MultipleSpaces {
    fn name(&self) -> &'static str {
        "multiple-spaces"
    }

    fn category(&self) -> Category {
        Category::Typography
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let edits = self
            .runs
            .find_iter(text)
            .map(|m| Edit::new(m.range(), " ", "Espacios múltiples reducidos a uno"))
            .collect();
        localize(self.name(), self.category(), 0.99, text, edits, Grouping::PerEdit)
    }
}

/// Quotation marks by nesting level: « », then “ ”, then ‘ ’, cycling
const LEVELS: [(char, char); 3] = [('«', '»'), ('“', '”'), ('‘', '’')];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteRole {
    Open,
    Close,
}

fn quote_role(c: char, prev: Option<char>, depth: usize) -> Option<QuoteRole> {
    match c {
        '«' | '“' | '‘' => Some(QuoteRole::Open),
        '»' | '”' => Some(QuoteRole::Close),
        // Apostrophe unless it can close an open third-level quote
        '’' if depth > 0 => Some(QuoteRole::Close),
        '"' => {
            let opens = prev.is_none_or(|p| p.is_whitespace() || "([{—–-«“‘¿¡/".contains(p));
            Some(if opens { QuoteRole::Open } else { QuoteRole::Close })
        }
        _ => None,
    }
}

struct OpenQuote {
    at: usize,
    glyph: char,
    depth: usize,
    /// Edits of this pair and of pairs nested inside it
    edits: Vec<Edit>,
}

/// Rewrites matched quotation pairs to the glyphs of their nesting level
#[derive(Debug, Default, Clone, Copy)]
pub struct QuoteHierarchy;

impl QuoteHierarchy {
    fn edits(text: &str) -> Vec<Edit> {
        let mut committed = Vec::new();
        let mut stack: Vec<OpenQuote> = Vec::new();
        let mut prev = None;

        for (at, c) in text.char_indices() {
            let role = quote_role(c, prev, stack.len());
            prev = Some(c);
            match role {
                Some(QuoteRole::Open) => {
                    let depth = stack.len();
                    stack.push(OpenQuote { at, glyph: c, depth, edits: Vec::new() });
                }
                Some(QuoteRole::Close) => {
                    // An apostrophe-like glyph with nothing to close is left alone
                    let Some(mut open) = stack.pop() else { continue };
                    // A single curly closer only ends a third-level pair
                    if c == '’' && open.depth % 3 != 2 && open.glyph != '‘' {
                        stack.push(open);
                        continue;
                    }
                    let (want_open, want_close) = LEVELS[open.depth % 3];
                    let end = at + c.len_utf8();
                    let region = open.at..end;
                    let note = "Comillas según la jerarquía « », “ ”, ‘ ’";
                    if open.glyph != want_open {
                        let range = open.at..open.at + open.glyph.len_utf8();
                        open.edits.push(
                            Edit::new(range, want_open.to_string(), note).anchored(region.clone()),
                        );
                    }
                    if c != want_close {
                        open.edits
                            .push(Edit::new(at..end, want_close.to_string(), note).anchored(region.clone()));
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.edits.append(&mut open.edits),
                        None => committed.extend(
                            open.edits.into_iter().map(|e| e.anchored(region.clone())),
                        ),
                    }
                }
                None => {}
            }
        }

        // Pairs matched inside a quote that never closes keep their own anchors
        for open in stack {
            committed.extend(open.edits);
        }
        committed
    }
}

impl Rule for QuoteHierarchy {
    fn name(&self) -> &'static str {
        "quote-hierarchy"
    }

    fn category(&self) -> Category {
        Category::Typography
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        localize(self.name(), self.category(), 0.95, text, Self::edits(text), Grouping::Merge)
    }
}

/// Dialogue dashes and spacing around parenthetical em-dash pairs
#[derive(Debug, Default, Clone, Copy)]
pub struct DashSpacing;

fn is_gap(c: char) -> bool {
    c == ' ' || c == '\t'
}

impl DashSpacing {
    fn line_edits(line: &str, offset: usize, edits: &mut Vec<Edit>) {
        let body_start = line.len() - line.trim_start_matches(is_gap).len();
        let body = &line[body_start..];

        // Dialogue marker typed as a hyphen
        let mut dialogue = false;
        if let Some(rest) = body.strip_prefix('-') {
            if rest.starts_with(is_gap) {
                let at = offset + body_start;
                let word_end = rest
                    .trim_start_matches(is_gap)
                    .find(char::is_whitespace)
                    .map_or(line.len(), |i| line.len() - rest.trim_start_matches(is_gap).len() + i);
                edits.push(
                    Edit::new(at..at + 1, EM_DASH.to_string(), "Raya de diálogo en lugar de guion")
                        .anchored(at..offset + word_end),
                );
            }
        } else if body.starts_with(EM_DASH) {
            dialogue = true;
        }

        let mut dashes: Vec<usize> =
            line.char_indices().filter(|&(_, c)| c == EM_DASH).map(|(i, _)| i).collect();
        if dialogue && !dashes.is_empty() {
            dashes.remove(0);
        }

        let note = "Espaciado de rayas en inciso";
        for pair in dashes.chunks_exact(2) {
            let (open, close) = (pair[0], pair[1]);
            let inner_start = open + EM_DASH.len_utf8();
            let inner = &line[inner_start..close];
            if inner.trim_matches(is_gap).is_empty() {
                continue;
            }
            let close_end = close + EM_DASH.len_utf8();
            let anchor = offset + open..offset + close_end;
            let mut pair_edits = Vec::new();

            let (before, _) = neighbours(line, &(open..inner_start));
            if before.is_some_and(|c| !c.is_whitespace() && !"([{«“‘¿¡".contains(c)) {
                pair_edits.push(Edit::new(offset + open..offset + open, " ", note));
            }
            let lead = inner.len() - inner.trim_start_matches(is_gap).len();
            if lead > 0 {
                pair_edits.push(Edit::new(offset + inner_start..offset + inner_start + lead, "", note));
            }
            let trail = inner.len() - inner.trim_end_matches(is_gap).len();
            if trail > 0 {
                pair_edits.push(Edit::new(offset + close - trail..offset + close, "", note));
            }
            let (_, after) = neighbours(line, &(close..close_end));
            if after.is_some_and(char::is_alphanumeric) {
                pair_edits.push(Edit::new(offset + close_end..offset + close_end, " ", note));
            }

            edits.extend(pair_edits.into_iter().map(|e| e.anchored(anchor.clone())));
        }
    }
}

impl Rule for DashSpacing {
    fn name(&self) -> &'static str {
        "dash-spacing"
    }

    fn category(&self) -> Category {
        Category::Typography
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let mut edits = Vec::new();
        let mut offset = 0;
        for line in text.split('\n') {
            Self::line_edits(line, offset, &mut edits);
            offset += line.len() + 1;
        }
        localize(self.name(), self.category(), 0.95, text, edits, Grouping::Merge)
    }
}

/// Non-breaking space between a number and its unit or currency sign
#[derive(Debug)]
pub struct ForcedSpacing {
    pattern: Option<Regex>,
}

impl ForcedSpacing {
    pub fn new(units: &[String]) -> Result<Self, RuleError> {
        let mut sorted: Vec<&String> = units.iter().filter(|u| !u.is_empty()).collect();
        // Longest first so `kHz` wins over `h`
        sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        if sorted.is_empty() {
            return Ok(Self { pattern: None });
        }
        let alternation: Vec<String> = sorted.iter().map(|u| regex::escape(u)).collect();
        let pattern = format!(r"\d( +)(?:{})", alternation.join("|"));
        Ok(Self { pattern: Some(compile("forced-spacing", &pattern)?) })
    }
}

impl Rule for ForcedSpacing {
    fn name(&self) -> &'static str {
        "forced-spacing"
    }

    fn category(&self) -> Category {
        Category::Typography
    }

    fn transform(&self, text: &str) -> Result<RuleOutput, RuleError> {
        let Some(pattern) = &self.pattern else {
            return Ok(RuleOutput::unchanged(text));
        };
        let mut edits = Vec::new();
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(gap)) = (caps.get(0), caps.get(1)) else { continue };
            // The unit must end at a word boundary
            let (_, next) = neighbours(text, &whole.range());
            if next.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                continue;
            }
            edits.push(Edit::new(gap.range(), NBSP, "Espacio duro entre cifra y unidad"));
        }
        localize(self.name(), self.category(), 0.95, text, edits, Grouping::Merge)
    }
}
