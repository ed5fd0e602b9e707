//! Minimal XPath evaluation over EDM records
//!
//! Supports the location paths the extraction tables use: child element
//! steps (`prefix:local`) from the root element, optionally ending in one
//! attribute step (`@prefix:local`). Prefixes resolve through the
//! declarations on the root element only.

use crate::error::{IngestError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;
use std::collections::HashMap;
use std::path::Path;

/// How many matches a rule keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// String value of the first match, empty when nothing matches
    First,
    /// String values of every match, in document order
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRule {
    pub path: &'static str,
    pub cardinality: Cardinality,
}

impl ExtractionRule {
    pub const fn first(path: &'static str) -> Self {
        Self {
            path,
            cardinality: Cardinality::First,
        }
    }

    pub const fn all(path: &'static str) -> Self {
        Self {
            path,
            cardinality: Cardinality::All,
        }
    }
}

/// Extracted value: a string for [`Cardinality::First`], a list otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    One(String),
    Many(Vec<String>),
}

impl From<Extracted> for serde_json::Value {
    fn from(value: Extracted) -> Self {
        match value {
            Extracted::One(s) => s.into(),
            Extracted::Many(list) => list.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExpandedName {
    namespace: Option<String>,
    local: String,
}

#[derive(Debug, Clone)]
struct Attribute {
    name: ExpandedName,
    value: String,
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    name: ExpandedName,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// XPath string value: all descendant text, concatenated.
    fn string_value(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// A parsed XML document ready for rule evaluation
#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: Element,
    /// prefix -> namespace URI, as declared on the root element
    root_prefixes: HashMap<String, String>,
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(IngestError::parse(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

impl XmlDocument {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut root_prefixes = HashMap::new();

        loop {
            let (resolved, event) = reader.read_resolved_event()?;
            let namespace = namespace_of(resolved)?;

            match event {
                Event::Start(start) => {
                    let is_root = stack.is_empty() && root.is_none();
                    let element =
                        read_element(&reader, namespace, &start, is_root.then_some(&mut root_prefixes))?;
                    stack.push(element);
                },
                Event::Empty(start) => {
                    let is_root = stack.is_empty() && root.is_none();
                    let element =
                        read_element(&reader, namespace, &start, is_root.then_some(&mut root_prefixes))?;
                    attach(&mut stack, &mut root, element);
                },
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| IngestError::parse("unbalanced closing tag"))?;
                    attach(&mut stack, &mut root, element);
                },
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.children.push(Node::Text(text.unescape()?.into_owned()));
                    }
                },
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        current.children.push(Node::Text(text));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if !stack.is_empty() {
            return Err(IngestError::parse("document ended inside an element"));
        }
        let root = root.ok_or_else(|| IngestError::parse("document has no root element"))?;

        Ok(Self {
            root,
            root_prefixes,
        })
    }

    fn resolve(&self, qname: &str) -> Result<ExpandedName> {
        match qname.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self.root_prefixes.get(prefix).ok_or_else(|| {
                    IngestError::parse(format!("prefix '{}' is not declared on the root element", prefix))
                })?;
                Ok(ExpandedName {
                    namespace: Some(namespace.clone()),
                    local: local.to_string(),
                })
            },
            None => Ok(ExpandedName {
                namespace: None,
                local: qname.to_string(),
            }),
        }
    }

    /// String values of every node `path` selects, in document order.
    pub fn select(&self, path: &str) -> Result<Vec<String>> {
        let mut current = vec![&self.root];
        let mut steps = path.split('/').filter(|s| !s.is_empty()).peekable();

        while let Some(step) = steps.next() {
            if let Some(attribute) = step.strip_prefix('@') {
                if steps.peek().is_some() {
                    return Err(IngestError::parse(format!(
                        "attribute step must be last in '{}'",
                        path
                    )));
                }
                let name = self.resolve(attribute)?;
                return Ok(current
                    .iter()
                    .flat_map(|e| e.attributes.iter())
                    .filter(|a| a.name == name)
                    .map(|a| a.value.clone())
                    .collect());
            }

            let name = self.resolve(step)?;
            current = current
                .into_iter()
                .flat_map(|e| e.child_elements())
                .filter(|e| e.name == name)
                .collect();
        }

        Ok(current.iter().map(|e| e.string_value()).collect())
    }

    pub fn extract(&self, rule: &ExtractionRule) -> Result<Extracted> {
        let mut values = self.select(rule.path)?;
        Ok(match rule.cardinality {
            Cardinality::First => {
                Extracted::One(if values.is_empty() { String::new() } else { values.swap_remove(0) })
            },
            Cardinality::All => Extracted::Many(values),
        })
    }
}

fn read_element<R>(
    reader: &NsReader<R>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    mut root_prefixes: Option<&mut HashMap<String, String>>,
) -> Result<Element> {
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();

        if let Some(binding) = attr.key.as_namespace_binding() {
            if let (PrefixDeclaration::Named(prefix), Some(prefixes)) =
                (binding, root_prefixes.as_deref_mut())
            {
                prefixes.insert(String::from_utf8_lossy(prefix).into_owned(), value);
            }
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attr.key);
        attributes.push(Attribute {
            name: ExpandedName {
                namespace: namespace_of(resolved)?,
                local: String::from_utf8_lossy(local.as_ref()).into_owned(),
            },
            value,
        });
    }

    Ok(Element {
        name: ExpandedName {
            namespace,
            local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        },
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}
