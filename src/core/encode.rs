//! Diff-to-markup encoding.
//!
//! The changed region of a paragraph is found by stripping the longest common
//! prefix and suffix. Only the runs overlapping that region are touched: they
//! are split at its edges, the covered part wrapped in `w:del`, and a `w:ins`
//! run styled after the paragraph's first run is placed where the region ends.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::container::{HIDDEN_CONTENT, RUN_CONTAINERS, collect_runs, run_text};
use crate::core::model::{RevisionKind, RevisionMark, RunFormat, WordNs};
use crate::infra::xml::{Element, Node};

/// Author written on revision marks when none is configured
pub const DEFAULT_AUTHOR: &str = "Corrector Ortotipográfico";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error(
        "common prefix ({prefix} bytes) and suffix ({suffix} bytes) overlap in a text of {len} bytes"
    )]
    Overlap { prefix: usize, suffix: usize, len: usize },

    #[error("paragraph text changed since planning ({expected} bytes expected, {found} found)")]
    TextMismatch { expected: usize, found: usize },
}

/// The four parts of an edit: `prefix + deleted + suffix` is the original and
/// `prefix + inserted + suffix` the corrected text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSplit<'a> {
    pub prefix: &'a str,
    pub deleted: &'a str,
    pub inserted: &'a str,
    pub suffix: &'a str,
}

/// Split two texts around their differing region, on character boundaries
pub fn split<'a>(original: &'a str, corrected: &'a str) -> Result<EditSplit<'a>, EncodingError> {
    let prefix: usize = original
        .chars()
        .zip(corrected.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();

    // Suffix is searched only in what the prefix left, so p + s <= min(len)
    let suffix: usize = original[prefix..]
        .chars()
        .rev()
        .zip(corrected[prefix..].chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();

    let len = original.len().min(corrected.len());
    if prefix + suffix > len {
        return Err(EncodingError::Overlap { prefix, suffix, len });
    }

    Ok(EditSplit {
        prefix: &original[..prefix],
        deleted: &original[prefix..original.len() - suffix],
        inserted: &corrected[prefix..corrected.len() - suffix],
        suffix: &original[original.len() - suffix..],
    })
}

/// How inserted text is highlighted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertStyle {
    pub color: String,
    pub underline: String,
}

impl Default for InsertStyle {
    fn default() -> Self {
        Self { color: "0000FF".to_string(), underline: "single".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodeMode {
    /// `w:ins` / `w:del` revision marks
    #[default]
    Tracked,
    /// Corrected text written directly, no marks
    Untracked,
}

/// Author, timestamp and id counter shared by every mark of one pass
#[derive(Debug, Clone)]
pub struct RevisionStamp {
    pub author: String,
    pub date: String,
    next_id: u64,
}

impl RevisionStamp {
    pub fn new(author: impl Into<String>, date: impl Into<String>, first_id: u64) -> Self {
        Self { author: author.into(), date: date.into(), next_id: first_id }
    }

    /// Stamp with the current UTC time
    pub fn now(author: impl Into<String>, first_id: u64) -> Self {
        Self::new(author, Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(), first_id)
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Rewrites paragraph elements for one apply pass
#[derive(Debug)]
pub struct MarkupEncoder {
    ns: WordNs,
    stamp: RevisionStamp,
    style: InsertStyle,
    mode: EncodeMode,
}

/// One paragraph rewrite in progress: the replaced byte range of the
/// original text and the walk position over its runs
struct Edit<'t> {
    original: &'t str,
    inserted: &'t str,
    start: usize,
    end: usize,
    offset: usize,
    /// Insertion already written (or nothing to insert)
    placed: bool,
    template: RunFormat,
    marks: Vec<RevisionMark>,
}

impl Edit<'_> {
    fn is_pure_insertion(&self) -> bool {
        self.start == self.end
    }
}

impl MarkupEncoder {
    pub fn new(ns: WordNs, stamp: RevisionStamp, style: InsertStyle, mode: EncodeMode) -> Self {
        Self { ns, stamp, style, mode }
    }

    /// Rewrite `paragraph` so it reads `corrected`.
    ///
    /// Runs outside the changed region stay untouched; the runs at its edges
    /// are split, each half keeping its own properties. Returns the marks
    /// written; none when the texts are equal. On error the paragraph is
    /// left as it was.
    pub fn rewrite_paragraph(
        &mut self,
        paragraph: &mut Element,
        original: &str,
        corrected: &str,
    ) -> Result<Vec<RevisionMark>, EncodingError> {
        if original == corrected {
            return Ok(Vec::new());
        }
        let live: String = collect_runs(&self.ns, paragraph).into_iter().map(|r| r.text).collect();
        if live != original {
            return Err(EncodingError::TextMismatch { expected: original.len(), found: live.len() });
        }
        let parts = split(original, corrected)?;

        let mut edit = Edit {
            original,
            inserted: parts.inserted,
            start: parts.prefix.len(),
            end: original.len() - parts.suffix.len(),
            offset: 0,
            placed: false,
            template: first_run_format(&self.ns, paragraph),
            marks: Vec::new(),
        };
        self.rebuild(paragraph, &mut edit);

        // No text run to anchor on, e.g. an empty paragraph
        if !edit.placed {
            if let Some(node) = self.insertion(&mut edit) {
                let is_run_container =
                    |n: &Node| matches!(n, Node::Element(e) if self.ns.is_any(e, RUN_CONTAINERS));
                let at = paragraph
                    .children
                    .iter()
                    .rposition(is_run_container)
                    .map_or(paragraph.children.len(), |i| i + 1);
                paragraph.children.insert(at, Node::Element(node));
            }
        }
        Ok(edit.marks)
    }

    /// Walk the children of `element` in text order, splitting the runs that
    /// overlap the edited range
    fn rebuild(&mut self, element: &mut Element, edit: &mut Edit<'_>) {
        let children = std::mem::take(&mut element.children);
        let mut rebuilt = Vec::with_capacity(children.len() + 3);

        for node in children {
            let mut child = match node {
                Node::Element(child) => child,
                other => {
                    rebuilt.push(other);
                    continue;
                }
            };
            if self.ns.is_any(&child, HIDDEN_CONTENT) {
                rebuilt.push(Node::Element(child));
                continue;
            }
            if !self.ns.is(&child, "r") {
                self.rebuild(&mut child, edit);
                rebuilt.push(Node::Element(child));
                continue;
            }

            let len = run_text(&self.ns, &child).len();
            let at = edit.offset;
            edit.offset += len;

            if len > 0 && at < edit.end && at + len > edit.start {
                self.split_run(&child, at, len, edit, &mut rebuilt);
                continue;
            }

            let anchor = len > 0 && !edit.placed && edit.is_pure_insertion();
            if anchor && edit.start == 0 && at == 0 {
                rebuilt.extend(self.insertion(edit).map(Node::Element));
            }
            rebuilt.push(Node::Element(child));
            if anchor && edit.start > 0 && at + len == edit.start {
                rebuilt.extend(self.insertion(edit).map(Node::Element));
            }
        }
        element.children = rebuilt;
    }

    /// Replace one run by `[head] [w:del] [insertion] [tail]`
    fn split_run(
        &mut self,
        run: &Element,
        at: usize,
        len: usize,
        edit: &mut Edit<'_>,
        out: &mut Vec<Node>,
    ) {
        let from = edit.start.saturating_sub(at);
        let to = (edit.end - at).min(len);
        let (head, gone, tail) = cut_run(&self.ns, run, from, to);

        out.extend(head.map(Node::Element));
        if let (Some(gone), EncodeMode::Tracked) = (gone, self.mode) {
            let format = RunFormat::from_rpr(run.elements().find(|e| self.ns.is(e, "rPr")));
            let mark =
                self.mark(RevisionKind::Deletion, &edit.original[at + from..at + to], format);
            out.push(Node::Element(self.mark_element(&mark, gone)));
            edit.marks.push(mark);
        }
        if at + len >= edit.end && !edit.placed {
            out.extend(self.insertion(edit).map(Node::Element));
        }
        out.extend(tail.map(Node::Element));
    }

    /// The inserted text as a `w:ins` mark or, untracked, a plain run
    fn insertion(&mut self, edit: &mut Edit<'_>) -> Option<Element> {
        edit.placed = true;
        if edit.inserted.is_empty() {
            return None;
        }
        match self.mode {
            EncodeMode::Tracked => {
                let highlighted = edit
                    .template
                    .clone()
                    .with_color(&self.ns, &self.style.color)
                    .with_underline(&self.ns, &self.style.underline);
                let mark = self.mark(RevisionKind::Insertion, edit.inserted, highlighted);
                let run = self.run(&mark.format, &mark.text);
                let element = self.mark_element(&mark, run);
                edit.marks.push(mark);
                Some(element)
            }
            EncodeMode::Untracked => Some(self.run(&edit.template, edit.inserted)),
        }
    }

    fn mark(&mut self, kind: RevisionKind, text: &str, format: RunFormat) -> RevisionMark {
        RevisionMark {
            kind,
            id: self.stamp.take_id(),
            author: self.stamp.author.clone(),
            timestamp: self.stamp.date.clone(),
            text: text.to_string(),
            format,
        }
    }

    fn mark_element(&self, mark: &RevisionMark, run: Element) -> Element {
        let local = match mark.kind {
            RevisionKind::Insertion => "ins",
            RevisionKind::Deletion => "del",
        };
        Element::new(self.ns.q(local))
            .with_attr(self.ns.q("id"), mark.id.to_string())
            .with_attr(self.ns.q("author"), mark.author.as_str())
            .with_attr(self.ns.q("date"), mark.timestamp.as_str())
            .with_child(run)
    }

    /// `w:r` with the given format; tabs and line breaks become their elements
    fn run(&self, format: &RunFormat, text: &str) -> Element {
        let mut run = Element::new(self.ns.q("r"));
        if let Some(rpr) = format.to_rpr(&self.ns) {
            run.children.push(Node::Element(rpr));
        }
        let text_name = self.ns.q("t");

        let mut chunk = String::new();
        let flush = |chunk: &mut String, run: &mut Element| {
            if !chunk.is_empty() {
                let t = Element::new(text_name.as_str())
                    .with_attr("xml:space", "preserve")
                    .with_text(std::mem::take(chunk));
                run.children.push(Node::Element(t));
            }
        };
        for c in text.chars() {
            match c {
                '\t' => {
                    flush(&mut chunk, &mut run);
                    run.children.push(Node::Element(Element::new(self.ns.q("tab"))));
                }
                '\n' => {
                    flush(&mut chunk, &mut run);
                    run.children.push(Node::Element(Element::new(self.ns.q("br"))));
                }
                _ => chunk.push(c),
            }
        }
        flush(&mut chunk, &mut run);
        run
    }
}

/// Cut a run at byte offsets `from..to` of its text into head, deleted and
/// tail runs, each a copy of the run with its own `w:rPr`.
///
/// Children without text (drawings, field chars, references) never land in
/// the deleted part: they go to the head up to `from`, to the tail after it.
fn cut_run(
    ns: &WordNs,
    run: &Element,
    from: usize,
    to: usize,
) -> (Option<Element>, Option<Element>, Option<Element>) {
    let shell = || Element { name: run.name.clone(), attributes: run.attributes.clone(), children: Vec::new() };
    let mut pieces = [shell(), shell(), shell()];
    let mut used = [false; 3];
    let bounds = [(0, from), (from, to), (to, usize::MAX)];
    let mut offset = 0;

    for child in run.elements() {
        if ns.is(child, "rPr") {
            for piece in &mut pieces {
                piece.children.push(Node::Element(child.clone()));
            }
            continue;
        }
        let is_text = ns.is(child, "t");
        let len = if is_text {
            child.text().len()
        } else if ns.is_any(child, &["tab", "br", "cr"]) {
            1
        } else {
            0
        };
        if len == 0 {
            let slot = if offset <= from { 0 } else { 2 };
            pieces[slot].children.push(Node::Element(child.clone()));
            used[slot] = true;
            continue;
        }

        for (slot, &(lo, hi)) in bounds.iter().enumerate() {
            let lo = lo.max(offset);
            let hi = hi.min(offset + len);
            if lo >= hi {
                continue;
            }
            let whole = lo == offset && hi == offset + len;
            let piece = match (is_text, slot) {
                (true, 1) => text_piece(ns.q("delText"), child, &child.text()[lo - offset..hi - offset]),
                (true, _) if !whole => text_piece(ns.q("t"), child, &child.text()[lo - offset..hi - offset]),
                _ => child.clone(),
            };
            pieces[slot].children.push(Node::Element(piece));
            used[slot] = true;
        }
        offset += len;
    }

    let [head, gone, tail] = pieces;
    (used[0].then_some(head), used[1].then_some(gone), used[2].then_some(tail))
}

fn text_piece(name: String, source: &Element, text: &str) -> Element {
    let mut t = Element { name, attributes: source.attributes.clone(), children: Vec::new() };
    t.set_attr("xml:space", "preserve");
    t.with_text(text)
}

/// Format of the first live run in the paragraph
fn first_run_format(ns: &WordNs, paragraph: &Element) -> RunFormat {
    fn find<'a>(ns: &WordNs, element: &'a Element) -> Option<&'a Element> {
        for child in element.elements() {
            if ns.is(child, "r") {
                return Some(child);
            }
            if ns.is_any(child, HIDDEN_CONTENT) {
                continue;
            }
            if let Some(run) = find(ns, child) {
                return Some(run);
            }
        }
        None
    }
    let rpr = find(ns, paragraph).and_then(|r| r.elements().find(|e| ns.is(e, "rPr")));
    RunFormat::from_rpr(rpr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::xml;

    fn w() -> WordNs {
        WordNs::with_prefix("w")
    }

    fn paragraph(inner: &str) -> Element {
        let doc = xml::parse(&format!("<w:p xmlns:w=\"urn:w\">{inner}</w:p>")).unwrap();
        doc.root
    }

    fn encoder(mode: EncodeMode) -> MarkupEncoder {
        MarkupEncoder::new(w(), RevisionStamp::new("Ana", "2024-05-01T10:00:00Z", 5), InsertStyle::default(), mode)
    }

    #[test]
    fn test_split_char_boundaries() {
        let s = split("la situacion es critica", "la situación es crítica").unwrap();
        assert_eq!(s.prefix, "la situaci");
        assert_eq!(s.deleted, "on es cri");
        assert_eq!(s.inserted, "ón es crí");
        assert_eq!(s.suffix, "tica");

        let s = split("Cuesta 25 %", "Cuesta 25\u{a0}%").unwrap();
        assert_eq!((s.deleted, s.inserted), (" ", "\u{a0}"));
    }

    #[test]
    fn test_split_bounds_repeated_text() {
        // "aa" -> "aaa": suffix may not reuse prefix characters
        let s = split("aa", "aaa").unwrap();
        assert_eq!(s.prefix, "aa");
        assert_eq!(s.deleted, "");
        assert_eq!(s.inserted, "a");
        assert_eq!(s.suffix, "");
    }

    #[test]
    fn test_tracked_rewrite_structure() {
        let mut p = paragraph(
            "<w:pPr><w:jc w:val=\"both\"/></w:pPr>\
             <w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">Pesa 25 </w:t></w:r>\
             <w:r><w:t>% más</w:t></w:r><w:bookmarkEnd w:id=\"0\"/>",
        );
        let marks = encoder(EncodeMode::Tracked)
            .rewrite_paragraph(&mut p, "Pesa 25 % más", "Pesa 25\u{a0}% más")
            .unwrap();

        assert_eq!(marks.len(), 2);
        assert_eq!((marks[0].kind, marks[0].id), (RevisionKind::Deletion, 5));
        assert_eq!((marks[1].kind, marks[1].id), (RevisionKind::Insertion, 6));

        let names: Vec<&str> = p.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["w:pPr", "w:r", "w:del", "w:ins", "w:r", "w:bookmarkEnd"]);

        let del = p.child("w:del").unwrap();
        assert_eq!(del.attr("w:author"), Some("Ana"));
        assert_eq!(del.attr("w:date"), Some("2024-05-01T10:00:00Z"));
        let del_run = del.child("w:r").unwrap();
        assert_eq!(del_run.child("w:delText").unwrap().text(), " ");
        assert!(del_run.child("w:rPr").unwrap().child("w:color").is_none());

        let ins_rpr = p.child("w:ins").and_then(|i| i.child("w:r")).and_then(|r| r.child("w:rPr")).unwrap();
        let props: Vec<&str> = ins_rpr.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(props, ["w:b", "w:color", "w:u"]);
        assert_eq!(ins_rpr.child("w:color").unwrap().attr("w:val"), Some("0000FF"));

        // Live text now reads the corrected version
        let live: String = collect_runs(&w(), &p).into_iter().map(|r| r.text).collect();
        assert_eq!(live, "Pesa 25\u{a0}% más");
    }

    #[test]
    fn test_untracked_rewrite() {
        let mut p = paragraph("<w:r><w:t>el Lunes</w:t></w:r>");
        let marks = encoder(EncodeMode::Untracked)
            .rewrite_paragraph(&mut p, "el Lunes", "el lunes")
            .unwrap();
        assert!(marks.is_empty());
        assert!(p.child("w:ins").is_none() && p.child("w:del").is_none());
        let live: String = collect_runs(&w(), &p).into_iter().map(|r| r.text).collect();
        assert_eq!(live, "el lunes");
    }

    #[test]
    fn test_equal_text_is_untouched() {
        let mut p = paragraph("<w:r><w:t>igual</w:t></w:r>");
        let before = p.clone();
        let marks = encoder(EncodeMode::Tracked).rewrite_paragraph(&mut p, "igual", "igual").unwrap();
        assert!(marks.is_empty());
        assert_eq!(p, before);
    }

    #[test]
    fn test_tabs_and_breaks_become_elements() {
        let mut p = paragraph("<w:r><w:t>a</w:t></w:r>");
        encoder(EncodeMode::Untracked).rewrite_paragraph(&mut p, "a", "a\tb\nc").unwrap();
        let live: String = collect_runs(&w(), &p).into_iter().map(|r| r.text).collect();
        assert_eq!(live, "a\tb\nc");
    }

    #[test]
    fn test_runs_outside_the_edit_are_untouched() {
        let mut p = paragraph(
            "<w:r><w:t xml:space=\"preserve\">uno </w:t></w:r>\
             <w:hyperlink w:history=\"1\"><w:r><w:rPr><w:rStyle w:val=\"Link\"/></w:rPr><w:t>dos</w:t></w:r></w:hyperlink>\
             <w:r><w:rPr><w:i/></w:rPr><w:t xml:space=\"preserve\">  tres</w:t></w:r>",
        );
        let link = p.child("w:hyperlink").cloned().unwrap();
        let marks = encoder(EncodeMode::Tracked)
            .rewrite_paragraph(&mut p, "uno dos  tres", "uno dos tres")
            .unwrap();

        assert_eq!(marks.len(), 1);
        assert_eq!((marks[0].kind, marks[0].text.as_str()), (RevisionKind::Deletion, " "));
        assert!(marks[0].format.get("i").is_some());

        let names: Vec<&str> = p.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["w:r", "w:hyperlink", "w:r", "w:del", "w:r"]);
        assert_eq!(p.child("w:hyperlink"), Some(&link));

        // Both halves of the split run keep the italic
        let italic: Vec<bool> = p
            .elements()
            .filter(|e| e.name == "w:r")
            .map(|r| r.child("w:rPr").is_some_and(|rpr| rpr.child("w:i").is_some()))
            .collect();
        assert_eq!(italic, [false, true, true]);
        let live: String = collect_runs(&w(), &p).into_iter().map(|r| r.text).collect();
        assert_eq!(live, "uno dos tres");
    }

    #[test]
    fn test_deletion_across_runs_keeps_each_format() {
        let mut p = paragraph(
            "<w:r><w:t>ab</w:t></w:r>\
             <w:r><w:rPr><w:i/></w:rPr><w:fldChar w:fldCharType=\"begin\"/><w:t>cd</w:t></w:r>",
        );
        let marks = encoder(EncodeMode::Tracked).rewrite_paragraph(&mut p, "abcd", "aXd").unwrap();

        let kinds: Vec<(RevisionKind, u64, &str)> =
            marks.iter().map(|m| (m.kind, m.id, m.text.as_str())).collect();
        assert_eq!(
            kinds,
            [
                (RevisionKind::Deletion, 5, "b"),
                (RevisionKind::Deletion, 6, "c"),
                (RevisionKind::Insertion, 7, "X"),
            ]
        );
        let names: Vec<&str> = p.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["w:r", "w:del", "w:r", "w:del", "w:ins", "w:r"]);

        // The field char sits before the deleted text and stays live
        let second_head = p.elements().nth(2).unwrap();
        assert!(second_head.child("w:fldChar").is_some());
        assert!(second_head.child("w:t").is_none());
        assert!(second_head.child("w:rPr").and_then(|r| r.child("w:i")).is_some());

        let live: String = collect_runs(&w(), &p).into_iter().map(|r| r.text).collect();
        assert_eq!(live, "aXd");
    }

    #[test]
    fn test_insertion_into_empty_paragraph() {
        let mut p = paragraph("<w:pPr><w:jc w:val=\"center\"/></w:pPr>");
        let marks = encoder(EncodeMode::Tracked).rewrite_paragraph(&mut p, "", "hola").unwrap();
        assert_eq!(marks.len(), 1);
        let names: Vec<&str> = p.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["w:pPr", "w:ins"]);
    }

    #[test]
    fn test_stale_text_leaves_paragraph_alone() {
        let mut p = paragraph("<w:r><w:t>actual</w:t></w:r>");
        let before = p.clone();
        let err = encoder(EncodeMode::Tracked).rewrite_paragraph(&mut p, "antiguo", "nuevo").unwrap_err();
        assert!(matches!(err, EncodingError::TextMismatch { .. }));
        assert_eq!(p, before);
    }
}
