//! Document tree: arena storage plus XML reading and writing.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Children
//! are kept in paint order. Cloning a [`Document`] yields a fully independent
//! tree in which every id still addresses the corresponding node, which is
//! what lets a tape descriptor computed on the source find its marker path in
//! a copy.

use std::io::{Read, Write};

use indexmap::IndexMap;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::DocumentError;
use crate::types::Page;

/// Elements whose whitespace-only text is content, not formatting.
const TEXT_CONTENT: &[&str] = &["text", "tspan", "textPath"];

/// Index of a node in its [`Document`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element with its attributes in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Name without a namespace prefix (`svg:path` -> `path`).
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed document.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// A document holding only `root`.
    pub fn new(root: Element) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Element(root),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// Parse a whole XML document.
    ///
    /// Declarations, doctypes, processing instructions and anything outside
    /// the root element are dropped. Whitespace-only text between elements is
    /// dropped too, except inside text content elements. Other text is kept
    /// exactly as written.
    pub fn parse(source: &str) -> Result<Document, DocumentError> {
        let mut reader = Reader::from_str(source);

        let mut doc: Option<Document> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            let event = reader.read_event().map_err(DocumentError::xml)?;
            match event {
                Event::Start(start) => {
                    let element = element_from(&start)?;
                    let id = Self::open(&mut doc, &stack, element)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    Self::open(&mut doc, &stack, element)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(DocumentError::xml)?.into_owned();
                    if text.trim().is_empty() && !Self::in_text_content(&doc, &stack) {
                        continue;
                    }
                    Self::push_leaf(&mut doc, &stack, NodeKind::Text(text));
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    Self::push_leaf(&mut doc, &stack, NodeKind::CData(text));
                }
                Event::Comment(comment) => {
                    let text = String::from_utf8_lossy(&comment).into_owned();
                    Self::push_leaf(&mut doc, &stack, NodeKind::Comment(text));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DocumentError::malformed("unclosed element at end of input"));
        }
        doc.ok_or(DocumentError::Empty)
    }

    /// Read a whole document from a byte stream.
    pub fn from_reader(mut reader: impl Read) -> Result<Document, DocumentError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::parse(&source)
    }

    fn open(
        doc: &mut Option<Document>,
        stack: &[NodeId],
        element: Element,
    ) -> Result<NodeId, DocumentError> {
        match (doc.as_mut(), stack.last()) {
            (None, _) => {
                let new = Document::new(element);
                let root = new.root;
                *doc = Some(new);
                Ok(root)
            }
            (Some(doc), Some(&parent)) => Ok(doc.append_element(parent, element)),
            (Some(_), None) => Err(DocumentError::malformed("more than one root element")),
        }
    }

    fn push_leaf(doc: &mut Option<Document>, stack: &[NodeId], kind: NodeKind) {
        if let (Some(doc), Some(&parent)) = (doc.as_mut(), stack.last()) {
            doc.append(parent, kind);
        }
    }

    fn in_text_content(doc: &Option<Document>, stack: &[NodeId]) -> bool {
        match (doc, stack.last()) {
            (Some(doc), Some(&parent)) => doc
                .element(parent)
                .is_some_and(|el| TEXT_CONTENT.contains(&el.local_name())),
            _ => false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    /// Set an attribute on an element node. Other node kinds are left alone.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.to_string(), value.into());
        }
    }

    /// Remove an attribute from an element node, returning its old value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.attributes.shift_remove(name)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// All nodes below `id` in document order, `id` itself excluded.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// Whether `id` is the root or hangs below it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|p| p == self.root)
    }

    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.append(parent, NodeKind::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Text(text.into()))
    }

    /// Unlink `id` from its parent. The subtree stays in the arena but is no
    /// longer reachable from the root. Returns false for the root or an
    /// already detached node.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        true
    }

    /// Move every child of `parent` into a new `wrapper` element, which
    /// becomes `parent`'s only child.
    pub fn wrap_children(&mut self, parent: NodeId, wrapper: Element) -> NodeId {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        let id = self.append_element(parent, wrapper);
        for &child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children = children;
        id
    }

    /// First attached element whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|&n| self.attribute(n, "id") == Some(id))
    }

    /// Page metadata of the root element.
    pub fn page(&self) -> Page {
        Page::from_document(self)
    }

    /// Serialize with an XML declaration and two-space indentation.
    pub fn write_to(&self, out: impl Write) -> Result<(), DocumentError> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(DocumentError::xml)?;
        self.write_node(&mut writer, self.root)
    }

    pub fn to_svg_string(&self) -> Result<String, DocumentError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        String::from_utf8(out).map_err(DocumentError::xml)
    }

    fn write_node<W: Write>(&self, writer: &mut Writer<W>, id: NodeId) -> Result<(), DocumentError> {
        let node = &self.nodes[id.0];
        let event = match &node.kind {
            NodeKind::Element(el) => {
                let mut start = BytesStart::new(el.name.as_str());
                for (name, value) in &el.attributes {
                    start.push_attribute((name.as_str(), value.as_str()));
                }
                if node.children.is_empty() {
                    Event::Empty(start)
                } else {
                    writer
                        .write_event(Event::Start(start))
                        .map_err(DocumentError::xml)?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    Event::End(BytesEnd::new(el.name.as_str()))
                }
            }
            NodeKind::Text(text) => Event::Text(BytesText::new(text)),
            NodeKind::CData(text) => Event::CData(BytesCData::new(text.as_str())),
            NodeKind::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
        };
        writer.write_event(event).map_err(DocumentError::xml)
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(DocumentError::xml)?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(DocumentError::xml)?.into_owned();
        element.attributes.insert(name, value);
    }
    Ok(element)
}

/// Pre-order iterator returned by [`Document::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="50mm" viewBox="0 0 100 50">
  <!-- artwork -->
  <g id="outer" transform="translate(5 5)">
    <path id="a" d="M 0 0 L 10 0" stroke="red"/>
    <text id="label" x="1" y="2">Tape &amp; more</text>
  </g>
  <path id="b" d="M 0 0 L 0 10"/>
</svg>"#;

    fn ids(doc: &Document, nodes: impl Iterator<Item = NodeId>) -> Vec<String> {
        nodes
            .filter_map(|n| doc.attribute(n, "id").map(str::to_string))
            .collect()
    }

    #[test]
    fn parse_builds_tree_in_document_order() {
        let doc = Document::parse(SAMPLE).unwrap();
        let root = doc.root();
        assert_eq!(doc.element(root).unwrap().name, "svg");
        assert_eq!(
            ids(&doc, doc.descendants(root)),
            vec!["outer", "a", "label", "b"]
        );
        assert!(matches!(doc.kind(doc.children(root)[0]), NodeKind::Comment(_)));
    }

    #[test]
    fn attributes_keep_source_order_and_unescape() {
        let doc = Document::parse(SAMPLE).unwrap();
        let names: Vec<_> = doc
            .element(doc.root())
            .unwrap()
            .attributes
            .keys()
            .cloned()
            .collect();
        assert_eq!(names, vec!["xmlns", "width", "height", "viewBox"]);

        let label = doc.find_by_id("label").unwrap();
        let text = doc.children(label)[0];
        assert_eq!(doc.kind(text), &NodeKind::Text("Tape & more".to_string()));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let doc = Document::parse(SAMPLE).unwrap();
        let a = doc.find_by_id("a").unwrap();
        let chain: Vec<_> = doc.ancestors(a).collect();
        assert_eq!(chain, vec![doc.find_by_id("outer").unwrap(), doc.root()]);
    }

    #[test]
    fn clone_is_independent() {
        let doc = Document::parse(SAMPLE).unwrap();
        let mut copy = doc.clone();
        let a = doc.find_by_id("a").unwrap();
        copy.detach(a);
        copy.set_attribute(copy.root(), "viewBox", "0 0 1 1");

        assert!(doc.is_attached(a));
        assert!(!copy.is_attached(a));
        assert_eq!(doc.attribute(doc.root(), "viewBox"), Some("0 0 100 50"));
        assert_eq!(copy.find_by_id("a"), None);
    }

    #[test]
    fn wrap_children_moves_everything() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let root = doc.root();
        let before = doc.children(root).to_vec();
        let wrapper = doc.wrap_children(root, Element::new("g").with_attribute("id", "w"));

        assert_eq!(doc.children(root), &[wrapper]);
        assert_eq!(doc.children(wrapper), before.as_slice());
        for child in before {
            assert_eq!(doc.parent(child), Some(wrapper));
        }
    }

    #[test]
    fn detach_root_is_refused() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        assert!(!doc.detach(doc.root()));
    }

    #[test]
    fn serialization_round_trips() {
        let doc = Document::parse(SAMPLE).unwrap();
        let text = doc.to_svg_string().unwrap();
        assert!(text.starts_with("<?xml"), "{text}");
        let again = Document::parse(&text).unwrap();
        assert_eq!(
            ids(&again, again.descendants(again.root())),
            ids(&doc, doc.descendants(doc.root()))
        );
        let label = again.find_by_id("label").unwrap();
        assert_eq!(
            again.kind(again.children(label)[0]),
            &NodeKind::Text("Tape & more".to_string())
        );
    }

    #[test]
    fn text_content_keeps_its_spaces() {
        let source = r#"<svg viewBox="0 0 10 10">
  <text id="t">Hello <tspan>big</tspan> world</text>
  <text id="gap"><tspan>a</tspan> <tspan>b</tspan></text>
</svg>"#;
        let doc = Document::parse(source).unwrap();
        let root = doc.root();
        assert!(doc.children(root).iter().all(|&c| doc.element(c).is_some()));

        let gap = doc.find_by_id("gap").unwrap();
        assert_eq!(doc.kind(doc.children(gap)[1]), &NodeKind::Text(" ".to_string()));

        let text = doc.to_svg_string().unwrap();
        assert!(
            text.contains("<text id=\"t\">Hello <tspan>big</tspan> world</text>"),
            "{text}"
        );
        let again = Document::parse(&text).unwrap();
        let t = again.find_by_id("t").unwrap();
        let pieces: Vec<_> = again
            .children(t)
            .iter()
            .filter_map(|&c| match again.kind(c) {
                NodeKind::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(pieces, vec!["Hello ", " world"]);
    }

    #[test]
    fn remove_attribute_returns_old_value() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let outer = doc.find_by_id("outer").unwrap();
        assert_eq!(
            doc.remove_attribute(outer, "transform").as_deref(),
            Some("translate(5 5)")
        );
        assert_eq!(doc.attribute(outer, "transform"), None);
        assert_eq!(doc.remove_attribute(outer, "transform"), None);
    }

    #[test]
    fn reads_from_byte_stream() {
        let doc = Document::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(doc.find_by_id("b").is_some());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(Document::parse(""), Err(DocumentError::Empty)));
        assert!(Document::parse("<svg><g></svg>").is_err());
        assert!(Document::parse("<svg/><svg/>").is_err());
    }

    #[test]
    fn local_name_strips_prefix() {
        assert_eq!(Element::new("svg:path").local_name(), "path");
        assert_eq!(Element::new("path").local_name(), "path");
    }
}
