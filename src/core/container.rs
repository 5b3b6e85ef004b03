//! `.docx` package handle.
//!
//! Every archive entry is unpacked into a private scratch directory on open;
//! only `word/document.xml` is parsed. Saving rebuilds the archive in the
//! original entry order and compression, copying untouched parts from the
//! scratch area byte for byte.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::model::{Paragraph, Run, RunFormat, WordNs};
use crate::infra::xml::{self, Element, XmlDocument, XmlError};

/// Main document part inside the package
pub const MAIN_PART: &str = "word/document.xml";

/// Children of a paragraph that carry (or wrap) runs
pub(crate) const RUN_CONTAINERS: &[&str] = &[
    "r", "hyperlink", "ins", "del", "moveFrom", "moveTo", "smartTag", "fldSimple", "customXml",
    "sdt",
];

/// Paragraph children whose runs are not part of the live text
pub(crate) const HIDDEN_CONTENT: &[&str] = &["del", "moveFrom", "pPr"];

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{} is not a zip package: {source}", .path.display())]
    NotAPackage { path: PathBuf, source: zip::result::ZipError },

    #[error("{}: entry '{name}' escapes the package root", .path.display())]
    UnsafeEntry { path: PathBuf, name: String },

    #[error("{}: missing main part word/document.xml", .path.display())]
    MissingPart { path: PathBuf },

    #[error("{}: malformed main part: {source}", .path.display())]
    Malformed { path: PathBuf, source: XmlError },

    #[error("{}: main part does not bind the WordprocessingML namespace", .path.display())]
    Namespace { path: PathBuf },

    #[error("{}: main part has no body", .path.display())]
    MissingBody { path: PathBuf },

    #[error("cannot unpack into scratch area: {source}")]
    Scratch { source: io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("cannot serialize main part: {0}")]
    Serialize(#[from] XmlError),

    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("cannot build archive {}: {source}", .path.display())]
    Archive { path: PathBuf, source: zip::result::ZipError },
}

#[derive(Debug)]
struct PartEntry {
    name: String,
    /// Sanitized location under the scratch directory
    local: PathBuf,
    compression: CompressionMethod,
    is_dir: bool,
}

impl PartEntry {
    fn write_options(&self) -> SimpleFileOptions {
        // Only stored and deflated are built in; anything else is re-deflated
        let method = match self.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        SimpleFileOptions::default().compression_method(method)
    }
}

/// An opened `.docx` package
#[derive(Debug)]
pub struct DocxPackage {
    source: PathBuf,
    scratch: TempDir,
    entries: Vec<PartEntry>,
    document: XmlDocument,
    ns: WordNs,
    body_index: usize,
}

impl DocxPackage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        Self::open_in(path, std::env::temp_dir())
    }

    /// Open with the scratch directory created under `scratch_root`
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_in(
        path: impl AsRef<Path>,
        scratch_root: impl AsRef<Path>,
    ) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| ContainerError::Read { path: path.to_path_buf(), source })?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|source| ContainerError::NotAPackage { path: path.to_path_buf(), source })?;

        let scratch = tempfile::Builder::new()
            .prefix("ortotrack-")
            .tempdir_in(scratch_root)
            .map_err(|source| ContainerError::Scratch { source })?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|source| ContainerError::NotAPackage { path: path.to_path_buf(), source })?;
            let name = entry.name().to_string();
            let Some(local) = entry.enclosed_name() else {
                return Err(ContainerError::UnsafeEntry { path: path.to_path_buf(), name });
            };

            let is_dir = entry.is_dir();
            let compression = entry.compression();
            unpack(&mut entry, is_dir, &scratch.path().join(&local))
                .map_err(|source| ContainerError::Scratch { source })?;

            entries.push(PartEntry { name, local, compression, is_dir });
        }

        let main = entries
            .iter()
            .find(|e| e.name == MAIN_PART && !e.is_dir)
            .ok_or_else(|| ContainerError::MissingPart { path: path.to_path_buf() })?;
        let bytes = fs::read(scratch.path().join(&main.local))
            .map_err(|source| ContainerError::Scratch { source })?;
        let text = String::from_utf8(bytes).map_err(|_| ContainerError::Malformed {
            path: path.to_path_buf(),
            source: XmlError::Utf8(MAIN_PART),
        })?;
        let document = xml::parse(text.trim_start_matches('\u{feff}'))
            .map_err(|source| ContainerError::Malformed { path: path.to_path_buf(), source })?;

        let ns = WordNs::detect(&document.root)
            .ok_or_else(|| ContainerError::Namespace { path: path.to_path_buf() })?;
        let body_index = document
            .root
            .children
            .iter()
            .position(|n| matches!(n, xml::Node::Element(e) if ns.is(e, "body")))
            .ok_or_else(|| ContainerError::MissingBody { path: path.to_path_buf() })?;

        debug!(entries = entries.len(), "package opened");
        Ok(Self { source: path.to_path_buf(), scratch, entries, document, ns, body_index })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Private directory holding the unpacked entries, removed on drop
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn namespace(&self) -> &WordNs {
        &self.ns
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    /// Entry names in archive order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn body(&self) -> &Element {
        match &self.document.root.children[self.body_index] {
            xml::Node::Element(e) => e,
            _ => unreachable!("body index always points at an element"),
        }
    }

    pub fn body_mut(&mut self) -> &mut Element {
        match &mut self.document.root.children[self.body_index] {
            xml::Node::Element(e) => e,
            _ => unreachable!("body index always points at an element"),
        }
    }

    /// Namespace handle and body, borrowed together
    pub(crate) fn parts_mut(&mut self) -> (&WordNs, &mut Element) {
        let body = match &mut self.document.root.children[self.body_index] {
            xml::Node::Element(e) => e,
            _ => unreachable!("body index always points at an element"),
        };
        (&self.ns, body)
    }

    /// Direct body paragraphs in document order
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.body()
            .elements()
            .filter(|e| self.ns.is(e, "p"))
            .enumerate()
            .map(|(index, p)| Paragraph { index, runs: collect_runs(&self.ns, p) })
            .collect()
    }

    /// Write the package to `path`, atomically
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let main = self.document.to_bytes()?;

        let io_err = |source| PersistError::Write { path: path.to_path_buf(), source };
        let zip_err = |source| PersistError::Archive { path: path.to_path_buf(), source };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;

        let mut zip = ZipWriter::new(BufWriter::new(tmp.as_file()));
        for entry in &self.entries {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), entry.write_options()).map_err(zip_err)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), entry.write_options()).map_err(zip_err)?;
            if entry.name == MAIN_PART {
                zip.write_all(&main).map_err(io_err)?;
            } else {
                let mut part = File::open(self.scratch.path().join(&entry.local)).map_err(io_err)?;
                io::copy(&mut part, &mut zip).map_err(io_err)?;
            }
        }
        let mut out = zip.finish().map_err(zip_err)?;
        out.flush().map_err(io_err)?;
        drop(out);

        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        debug!(bytes = main.len(), "package saved");
        Ok(())
    }
}

fn unpack(entry: &mut impl io::Read, is_dir: bool, target: &Path) -> io::Result<()> {
    if is_dir {
        return fs::create_dir_all(target);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    io::copy(entry, &mut out)?;
    Ok(())
}

/// Runs of one paragraph, skipping deleted and moved-away content
pub(crate) fn collect_runs(ns: &WordNs, paragraph: &Element) -> Vec<Run> {
    let mut runs = Vec::new();
    gather(ns, paragraph, &mut runs);
    runs
}

fn gather(ns: &WordNs, element: &Element, runs: &mut Vec<Run>) {
    for child in element.elements() {
        if ns.is(child, "r") {
            runs.push(Run {
                text: run_text(ns, child),
                format: RunFormat::from_rpr(child.elements().find(|e| ns.is(e, "rPr"))),
            });
        } else if ns.is_any(child, HIDDEN_CONTENT) {
            continue;
        } else {
            gather(ns, child, runs);
        }
    }
}

pub(crate) fn run_text(ns: &WordNs, run: &Element) -> String {
    let mut text = String::new();
    for child in run.elements() {
        if ns.is(child, "t") {
            text.push_str(&child.text());
        } else if ns.is(child, "tab") {
            text.push('\t');
        } else if ns.is_any(child, &["br", "cr"]) {
            text.push('\n');
        }
    }
    text
}

/// Highest numeric `w:id` in the tree, for continuing revision numbering
pub(crate) fn max_revision_id(ns: &WordNs, root: &Element) -> u64 {
    let id_attr = ns.q("id");
    let mut max = 0;
    root.walk(&mut |e| {
        if let Some(id) = e.attr(&id_attr).and_then(|v| v.parse::<u64>().ok()) {
            max = max.max(id);
        }
    });
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(xml_text: &str) -> Element {
        let wrapped = format!("<w:root xmlns:w=\"urn:w\">{xml_text}</w:root>");
        let doc = xml::parse(&wrapped).unwrap();
        doc.root.elements().next().unwrap().clone()
    }

    #[test]
    fn test_run_text_mapping() {
        let p = para(
            "<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr>\
             <w:r><w:rPr><w:i/></w:rPr><w:t>uno</w:t><w:tab/><w:t>dos</w:t></w:r>\
             <w:hyperlink><w:r><w:t xml:space=\"preserve\"> tres</w:t><w:br/></w:r></w:hyperlink>\
             <w:del><w:r><w:delText>borrado</w:delText></w:r></w:del>\
             <w:ins><w:r><w:t>!</w:t></w:r></w:ins></w:p>",
        );
        let runs = collect_runs(&WordNs::with_prefix("w"), &p);
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "uno\tdos tres\n!");
        assert_eq!(runs.len(), 3);
        assert!(runs[0].format.get("i").is_some());
        assert!(runs[1].format.is_empty());
    }

    #[test]
    fn test_max_revision_id() {
        let p = para(
            "<w:p><w:ins w:id=\"7\"><w:r><w:t>a</w:t></w:r></w:ins><w:bookmarkStart w:id=\"12\"/></w:p>",
        );
        assert_eq!(max_revision_id(&WordNs::with_prefix("w"), &p), 12);
    }
}
