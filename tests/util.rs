//! Shared test utilities for integration tests
//!
//! Builds small `.docx` packages in memory so every test owns its fixture.

#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults/></w:styles>"#;

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// One paragraph with a single bold run
pub fn paragraph(text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:jc w:val=\"both\"/></w:pPr><w:r><w:rPr><w:b/></w:rPr>\
         <w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape(text)
    )
}

/// Full main part around the given body markup
pub fn document_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
         <w:document xmlns:w=\"{W_NS}\"><w:body>{body}<w:sectPr/></w:body></w:document>"
    )
}

/// Write a package with the given main part plus a few untouched parts
pub fn write_docx(path: &Path, document: &str) {
    let file = File::create(path).expect("create docx");
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, data, options) in [
        ("[Content_Types].xml", CONTENT_TYPES, deflated),
        ("_rels/.rels", ROOT_RELS, deflated),
        ("word/document.xml", document, deflated),
        ("word/styles.xml", STYLES, stored),
    ] {
        zip.start_file(name, options).expect("start entry");
        zip.write_all(data.as_bytes()).expect("write entry");
    }
    zip.start_file("word/media/image1.bin", stored).expect("start media");
    zip.write_all(&[0u8, 159, 146, 150, 255, 1, 2, 3]).expect("write media");
    zip.finish().expect("finish docx");
}

/// Temp dir holding `doc.docx` whose body is `paragraphs`, one run each
pub fn docx_fixture(paragraphs: &[&str]) -> (assert_fs::TempDir, PathBuf) {
    let body: String = paragraphs.iter().map(|p| paragraph(p)).collect();
    docx_with_body(&body)
}

pub fn docx_with_body(body: &str) -> (assert_fs::TempDir, PathBuf) {
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    let path = tmp.path().join("doc.docx");
    write_docx(&path, &document_xml(body));
    (tmp, path)
}

/// Raw bytes of one part
pub fn read_part(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).expect("open docx")).expect("zip");
    let mut entry = archive.by_name(name).expect("entry present");
    let mut data = Vec::new();
    entry.read_to_end(&mut data).expect("read entry");
    data
}

pub fn main_part(path: &Path) -> String {
    String::from_utf8(read_part(path, "word/document.xml")).expect("utf-8 main part")
}

/// Entry names and compression methods, in archive order
pub fn entries(path: &Path) -> Vec<(String, CompressionMethod)> {
    let mut archive = ZipArchive::new(File::open(path).expect("open docx")).expect("zip");
    (0..archive.len())
        .map(|i| {
            let entry = archive.by_index(i).expect("entry");
            (entry.name().to_string(), entry.compression())
        })
        .collect()
}
