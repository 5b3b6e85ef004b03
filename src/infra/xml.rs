//! Owned XML tree for package parts.
//!
//! Parsed with quick-xml's pull reader and written back with its writer.
//! Qualified names are kept verbatim (`w:p`), so prefixes and attribute order
//! survive a load/save cycle; namespace checks go through
//! [`Element::prefix_bound_to`].

use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Errors raised while reading or writing an XML part
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("xml write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid utf-8 in {0}")]
    Utf8(&'static str),

    #[error("unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,
}

/// A node in the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    /// Raw comment body
    Comment(String),
    /// Raw processing instruction body
    Instruction(String),
}

/// An element with its qualified name, attributes in source order and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// `<?xml ...?>` header values
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A parsed part: optional declaration, prolog nodes and the root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub declaration: Option<Declaration>,
    /// Whitespace written between the declaration and what follows it
    pub declaration_tail: String,
    pub prolog: Vec<Node>,
    pub root: Element,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), children: Vec::new() }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Local part of the qualified name (`p` for `w:p`)
    pub fn local_name(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Overwrite an attribute in place or append it
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child with the given qualified name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Depth-first walk over this element and every descendant element
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    /// Prefix that this element binds to `uri`; `Some(None)` for a default namespace
    pub fn prefix_bound_to(&self, uri: &str) -> Option<Option<String>> {
        self.attributes.iter().find_map(|(k, v)| {
            if v != uri {
                return None;
            }
            if k == "xmlns" {
                Some(None)
            } else {
                k.strip_prefix("xmlns:").map(|p| Some(p.to_string()))
            }
        })
    }
}

fn utf8(bytes: &[u8], what: &'static str) -> Result<String, XmlError> {
    std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| XmlError::Utf8(what))
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut element = Element::new(utf8(start.name().as_ref(), "element name")?);
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref(), "attribute name")?;
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Parse a complete XML part into an owned tree.
///
/// Whitespace-only text is preserved so untouched content serializes back
/// unchanged.
pub fn parse(source: &str) -> Result<XmlDocument, XmlError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut declaration_tail = String::new();
    let mut after_declaration = false;
    let mut prolog = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event()?;
        let follows_declaration = std::mem::take(&mut after_declaration);
        // Nodes outside the root element only matter before it (prolog)
        let node = match event {
            Event::Decl(decl) => {
                declaration = Some(read_declaration(&decl)?);
                after_declaration = true;
                continue;
            }
            Event::Start(start) => {
                stack.push(start_element(&start)?);
                continue;
            }
            Event::End(end) => {
                let name = utf8(end.name().as_ref(), "element name")?;
                let element = stack.pop().ok_or_else(|| XmlError::UnexpectedEnd(name.clone()))?;
                if element.name != name {
                    return Err(XmlError::UnexpectedEnd(name));
                }
                Node::Element(element)
            }
            Event::Empty(start) => Node::Element(start_element(&start)?),
            Event::Text(text) => Node::Text(text.unescape()?.into_owned()),
            Event::CData(data) => Node::CData(utf8(&data, "cdata")?),
            Event::Comment(comment) => Node::Comment(utf8(&comment, "comment")?),
            Event::PI(pi) => Node::Instruction(utf8(&pi, "processing instruction")?),
            Event::DocType(_) => continue,
            Event::Eof => break,
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => match node {
                Node::Element(element) if root.is_none() => root = Some(element),
                Node::Text(text) if follows_declaration => declaration_tail = text,
                // Other inter-element whitespace at top level carries no content
                Node::Text(_) => {}
                other if root.is_none() => prolog.push(other),
                _ => {}
            },
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }

    Ok(XmlDocument { declaration, declaration_tail, prolog, root: root.ok_or(XmlError::NoRoot)? })
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration, XmlError> {
    let version = utf8(&decl.version()?, "declaration")?;
    let encoding = match decl.encoding() {
        Some(value) => Some(utf8(&value?, "declaration")?),
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(value) => Some(utf8(&value?, "declaration")?),
        None => None,
    };
    Ok(Declaration { version, encoding, standalone })
}

impl XmlDocument {
    /// Serialize back to UTF-8 bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            // The tree is always written as UTF-8
            let encoding = decl.encoding.as_ref().map(|_| "UTF-8");
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                encoding,
                decl.standalone.as_deref(),
            )))?;
            writer.get_mut().write_all(self.declaration_tail.as_bytes())?;
        }

        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;

        Ok(writer.into_inner())
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<(), XmlError> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        Node::Comment(body) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(body.as_str())))?
        }
        Node::Instruction(body) => writer.write_event(Event::PI(BytesPI::new(body.as_str())))?,
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
        <w:document xmlns:w=\"urn:w\"><w:body><w:p><w:r><w:t xml:space=\"preserve\">a &amp; b </w:t></w:r></w:p><w:sectPr/></w:body></w:document>";

    #[test]
    fn test_parse_keeps_structure_and_unescapes() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.root.name, "w:document");
        assert_eq!(doc.declaration.as_ref().unwrap().standalone.as_deref(), Some("yes"));

        let body = doc.root.child("w:body").unwrap();
        let t = body
            .child("w:p")
            .and_then(|p| p.child("w:r"))
            .and_then(|r| r.child("w:t"))
            .unwrap();
        assert_eq!(t.text(), "a & b ");
        assert_eq!(t.attr("xml:space"), Some("preserve"));
        assert_eq!(t.local_name(), "t");
    }

    #[test]
    fn test_serialize_round_trip() {
        let doc = parse(SAMPLE).unwrap();
        let bytes = doc.to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, SAMPLE);

        // A second pass is stable
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn test_prefix_binding() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.root.prefix_bound_to("urn:w"), Some(Some("w".to_string())));
        assert_eq!(doc.root.prefix_bound_to("urn:other"), None);
    }

    #[test]
    fn test_rejects_unbalanced_markup() {
        assert!(matches!(parse("<a><b></a>"), Err(_)));
        assert!(matches!(parse("<a>"), Err(XmlError::Unclosed(_))));
        assert!(matches!(parse("   "), Err(XmlError::NoRoot)));
    }

    #[test]
    fn test_set_attr_overwrites() {
        let mut e = Element::new("w:color").with_attr("w:val", "FF0000");
        e.set_attr("w:val", "0000FF");
        assert_eq!(e.attributes.len(), 1);
        assert_eq!(e.attr("w:val"), Some("0000FF"));
    }

    #[test]
    fn test_declaration_line_ending_round_trips() {
        for tail in ["\n", "", "\r\n\r\n"] {
            let source = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{tail}<a><b/></a>");
            let doc = parse(&source).unwrap();
            assert_eq!(doc.declaration_tail, tail);
            assert_eq!(String::from_utf8(doc.to_bytes().unwrap()).unwrap(), source);
        }
    }
}
