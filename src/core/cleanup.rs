//! Accept pre-existing tracked changes so a new pass starts from clean text.

use tracing::{debug, instrument};

use crate::core::container::DocxPackage;
use crate::core::model::WordNs;
use crate::infra::xml::{Element, Node};

/// Marks that disappear entirely when their revision is accepted
const DROPPED: &[&str] = &[
    "del",
    "moveFrom",
    "moveTo",
    "moveFromRangeStart",
    "moveFromRangeEnd",
    "moveToRangeStart",
    "moveToRangeEnd",
];

/// Accept every insertion and deletion inside the main part's paragraphs.
///
/// `w:ins` wrappers are unwrapped in place, deletions and move markup are
/// removed. Returns the number of marks processed.
#[instrument(level = "debug", skip_all)]
pub fn accept_all_revisions(package: &mut DocxPackage) -> usize {
    let (ns, body) = package.parts_mut();
    let count = accept_in_paragraphs(ns, body);
    debug!(count, "revisions accepted");
    count
}

fn accept_in_paragraphs(ns: &WordNs, element: &mut Element) -> usize {
    let mut count = 0;
    for child in element.elements_mut() {
        if ns.is(child, "p") {
            count += accept(ns, child);
        } else {
            count += accept_in_paragraphs(ns, child);
        }
    }
    count
}

fn accept(ns: &WordNs, element: &mut Element) -> usize {
    let mut count = 0;
    let mut kept = Vec::with_capacity(element.children.len());

    for node in std::mem::take(&mut element.children) {
        match node {
            Node::Element(mut child) if ns.is(&child, "ins") => {
                count += 1 + accept(ns, &mut child);
                kept.extend(child.children);
            }
            Node::Element(child) if ns.is_any(&child, DROPPED) => count += 1,
            Node::Element(mut child) => {
                count += accept(ns, &mut child);
                kept.push(Node::Element(child));
            }
            other => kept.push(other),
        }
    }

    element.children = kept;
    count
}
