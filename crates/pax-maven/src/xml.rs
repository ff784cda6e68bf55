//! Minimal formatting-preserving XML tree built on `quick-xml` events.
//!
//! Text and attribute content is stored exactly as it appeared in the source,
//! so writing an untouched document reproduces it byte for byte (modulo
//! attribute quoting). New elements are laid out with the indentation unit
//! detected from the document.

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;

use pax_util::errors::PaxError;

/// A node inside an element or at the top level of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw (still escaped) character data.
    Text(String),
    CData(String),
    Comment(String),
    /// `<?xml ...?>` and other processing instructions, raw content.
    Instruction(String),
    DocType(String),
}

impl Node {
    fn is_whitespace(&self) -> bool {
        matches!(self, Node::Text(raw) if raw.trim().is_empty())
    }
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    /// Attribute name and unescaped value, in source order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// `<name>text</name>`
    pub fn with_text(name: impl Into<String>, text: &str) -> Self {
        let mut element = Self::new(name);
        element.set_text(text);
        element
    }

    /// Builder-style append of a child without any layout whitespace.
    pub fn child_element(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Unescaped, trimmed text content of this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(raw) => match unescape(raw) {
                    Ok(text) => out.push_str(&text),
                    Err(_) => out.push_str(raw),
                },
                Node::CData(raw) => out.push_str(raw),
                _ => {}
            }
        }
        out.trim().to_string()
    }

    /// Text of the first child element called `name`.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text)
    }

    /// Replace all content with a single escaped text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(escape(text).into_owned())];
        self.self_closing = false;
    }

    /// Set the text of child `name`, appending the child if missing.
    pub fn set_child_text(&mut self, name: &str, text: &str, depth: usize, indent: &Indent) {
        match self.child_mut(name) {
            Some(child) => child.set_text(text),
            None => self.append_child(Element::with_text(name, text), depth, indent),
        }
    }

    fn element_positions(&self) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, n)| matches!(n, Node::Element(_)).then_some(i))
            .collect()
    }

    /// Index into `children` of the first element matching `pred`.
    pub fn position(&self, pred: impl Fn(&Element) -> bool) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if pred(e)))
    }

    /// Append `child` as the last element; `depth` is this element's own depth.
    pub fn append_child(&mut self, mut child: Element, depth: usize, indent: &Indent) {
        child.layout(depth + 1, indent);
        self.self_closing = false;
        let line = Node::Text(format!("\n{}", indent.at(depth + 1)));
        match self.children.last() {
            Some(last) if last.is_whitespace() => {
                let at = self.children.len() - 1;
                self.children.insert(at, Node::Element(child));
                self.children.insert(at, line);
            }
            _ => {
                self.children.push(line);
                self.children.push(Node::Element(child));
                self.children
                    .push(Node::Text(format!("\n{}", indent.at(depth))));
            }
        }
    }

    /// Insert `child` right after the last element named in `anchors`, or as
    /// the first element when none of them is present.
    pub fn insert_child_after(
        &mut self,
        mut child: Element,
        anchors: &[&str],
        depth: usize,
        indent: &Indent,
    ) {
        let anchor = self
            .children
            .iter()
            .rposition(|n| matches!(n, Node::Element(e) if anchors.contains(&e.name.as_str())));
        let at = match (anchor, self.element_positions().first()) {
            (Some(anchor), _) => anchor + 1,
            // before the whitespace that leads up to the first element
            (None, Some(&first)) if first > 0 && self.children[first - 1].is_whitespace() => {
                first - 1
            }
            (None, Some(&first)) => first,
            (None, None) => {
                self.append_child(child, depth, indent);
                return;
            }
        };
        child.layout(depth + 1, indent);
        let line = Node::Text(format!("\n{}", indent.at(depth + 1)));
        self.children.insert(at, Node::Element(child));
        self.children.insert(at, line);
    }

    /// Replace the element at `index` in place, keeping its surrounding layout.
    pub fn replace_child(&mut self, index: usize, mut child: Element, depth: usize, indent: &Indent) {
        child.layout(depth + 1, indent);
        self.children[index] = Node::Element(child);
    }

    /// Remove the element at `index` together with the whitespace that led up to it.
    pub fn remove_child(&mut self, index: usize) -> Option<Element> {
        let removed = match self.children.remove(index) {
            Node::Element(e) => e,
            other => {
                self.children.insert(index, other);
                return None;
            }
        };
        if index > 0 && self.children[index - 1].is_whitespace() {
            self.children.remove(index - 1);
        }
        Some(removed)
    }

    /// Remove every child element matching `pred`; returns how many went.
    pub fn remove_children(&mut self, pred: impl Fn(&Element) -> bool) -> usize {
        let mut removed = 0;
        while let Some(index) = self.position(&pred) {
            self.remove_child(index);
            removed += 1;
        }
        removed
    }

    /// Give a freshly built element (one with no layout whitespace) line
    /// breaks and indentation for the given depth.
    fn layout(&mut self, depth: usize, indent: &Indent) {
        if self.children.iter().any(|n| matches!(n, Node::Text(raw) if raw.contains('\n'))) {
            return;
        }
        if !self.children.iter().any(|n| matches!(n, Node::Element(_))) {
            return;
        }
        let old = std::mem::take(&mut self.children);
        for node in old {
            match node {
                Node::Element(mut e) => {
                    e.layout(depth + 1, indent);
                    self.children
                        .push(Node::Text(format!("\n{}", indent.at(depth + 1))));
                    self.children.push(Node::Element(e));
                }
                Node::Text(raw) if raw.trim().is_empty() => {}
                other => self.children.push(other),
            }
        }
        self.children
            .push(Node::Text(format!("\n{}", indent.at(depth))));
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.self_closing && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(e) => e.write_to(out),
        Node::Text(raw) => out.push_str(raw),
        Node::CData(raw) => {
            out.push_str("<![CDATA[");
            out.push_str(raw);
            out.push_str("]]>");
        }
        Node::Comment(raw) => {
            out.push_str("<!--");
            out.push_str(raw);
            out.push_str("-->");
        }
        Node::Instruction(raw) => {
            out.push_str("<?");
            out.push_str(raw);
            out.push_str("?>");
        }
        Node::DocType(raw) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(raw);
            out.push('>');
        }
    }
}

/// Indentation unit of a document, e.g. two spaces or a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indent {
    unit: String,
}

impl Default for Indent {
    fn default() -> Self {
        Self {
            unit: "  ".to_string(),
        }
    }
}

impl Indent {
    /// Whitespace for an element at `depth` (the root element is depth 0).
    pub fn at(&self, depth: usize) -> String {
        self.unit.repeat(depth)
    }

    fn detect(root: &Element) -> Self {
        let first = root.children.iter().find_map(|n| match n {
            Node::Text(raw) if raw.trim().is_empty() && raw.contains('\n') => {
                raw.rsplit('\n').next().map(str::to_string)
            }
            _ => None,
        });
        match first {
            Some(unit) if !unit.is_empty() => Self { unit },
            _ => Self::default(),
        }
    }
}

/// A whole XML document: prolog, root element and trailing nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
    pub indent: Indent,
}

impl Document {
    /// Parse XML text, keeping all layout whitespace.
    pub fn parse(xml: &str) -> Result<Self, PaxError> {
        let mut reader = Reader::from_str(xml);
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        fn to_string(bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).into_owned()
        }

        loop {
            let event = reader.read_event().map_err(|e| PaxError::Manifest {
                message: format!(
                    "Failed to parse XML at position {}: {e}",
                    reader.error_position()
                ),
            })?;

            let node = match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let mut element = Element::new(to_string(e.name().as_ref()));
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| PaxError::Manifest {
                            message: format!("Malformed attribute: {e}"),
                        })?;
                        let value = attr.unescape_value().map_err(|e| PaxError::Manifest {
                            message: format!("Malformed attribute value: {e}"),
                        })?;
                        element
                            .attributes
                            .push((to_string(attr.key.as_ref()), value.into_owned()));
                    }
                    if matches!(event, Event::Start(_)) {
                        stack.push(element);
                        continue;
                    }
                    element.self_closing = true;
                    Node::Element(element)
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        return Err(PaxError::Manifest {
                            message: "Unbalanced closing tag".to_string(),
                        });
                    };
                    Node::Element(element)
                }
                Event::Text(ref e) => Node::Text(to_string(e)),
                Event::CData(ref e) => Node::CData(to_string(e)),
                Event::Comment(ref e) => Node::Comment(to_string(e)),
                Event::Decl(ref e) => Node::Instruction(to_string(e)),
                Event::PI(ref e) => Node::Instruction(to_string(e)),
                Event::DocType(ref e) => Node::DocType(to_string(e)),
                Event::Eof => break,
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            } else if let Node::Element(element) = node {
                if root.is_some() {
                    return Err(PaxError::Manifest {
                        message: "Multiple root elements".to_string(),
                    });
                }
                root = Some(element);
            } else if root.is_none() {
                prolog.push(node);
            } else {
                epilog.push(node);
            }
        }

        if !stack.is_empty() {
            return Err(PaxError::Manifest {
                message: format!("Unclosed element <{}>", stack[stack.len() - 1].name),
            });
        }
        let root = root.ok_or_else(|| PaxError::Manifest {
            message: "Document has no root element".to_string(),
        })?;
        let indent = Indent::detect(&root);

        Ok(Self {
            prolog,
            root,
            epilog,
            indent,
        })
    }

    /// Serialize the document back to text.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        self.root.write_to(&mut out);
        for node in &self.epilog {
            write_node(node, &mut out);
        }
        out
    }
}
