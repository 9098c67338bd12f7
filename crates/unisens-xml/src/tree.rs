use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use tracing::debug;

use crate::XmlError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Attribute map of an element. Serialization order follows key order.
pub type Attributes = BTreeMap<String, String>;

/// Owned XML element with ElementTree-style `text`/`tail` handling.
///
/// `text` is the character data between the start tag and the first child,
/// `tail` is the character data following the end tag up to the next
/// sibling. Namespaced element and attribute names are kept in `{uri}local`
/// form; prefixes are regenerated on output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrib: Attributes,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Build an element carrying the given attributes and nothing else.
    pub fn with_attrib<K, V, I>(tag: impl Into<String>, attrib: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Element {
            tag: tag.into(),
            attrib: attrib
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrib.get(key).map(String::as_str)
    }

    /// First direct child whose tag (namespace stripped) equals `tag`.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| crate::strip(&child.tag) == tag)
    }

    /// Serialize the element, its children and its tail as UTF-8 XML.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self, None)?;
        String::from_utf8(writer.into_inner())
            .map_err(|err| XmlError::Xml(format!("invalid UTF-8: {err}")))
    }
}

/// Parse a document and return its root element.
pub fn parse(xml: &str) -> Result<Element, XmlError> {
    let mut reader = NsReader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let element = open_element(&reader, &e)?;
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = open_element(&reader, &e)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Invalid("unbalanced end tag".into()))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|err| XmlError::Xml(err.to_string()))?;
                push_text(&mut stack, &text);
            }
            Ok(Event::CData(c)) => {
                let raw = c.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(XmlError::Xml(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Invalid(format!("unclosed element <{}>", open.tag)));
    }
    let root = root.ok_or_else(|| XmlError::Invalid("document has no root element".into()))?;
    debug!(tag = %root.tag, children = root.children.len(), "parsed xml document");
    Ok(root)
}

/// Read and parse a document from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Element, XmlError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)
        .map_err(|err| XmlError::Io(format!("{}: {err}", path.display())))?;
    parse(&xml)
}

/// `{uri}local` for a bound name, the name as written otherwise.
fn clark_name(ns: &ResolveResult<'_>, local: &[u8], qualified: &[u8]) -> String {
    match ns {
        ResolveResult::Bound(uri) => format!(
            "{{{}}}{}",
            String::from_utf8_lossy(uri.as_ref()),
            String::from_utf8_lossy(local)
        ),
        _ => String::from_utf8_lossy(qualified).into_owned(),
    }
}

fn open_element<R>(reader: &NsReader<R>, event: &BytesStart<'_>) -> Result<Element, XmlError> {
    let (ns, local) = reader.resolve_element(event.name());
    let mut element = Element::new(clark_name(&ns, local.as_ref(), event.name().as_ref()));
    for attr in event.attributes() {
        let attr = attr.map_err(|err| XmlError::Xml(err.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let name = clark_name(&ns, local.as_ref(), key);
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        element.attrib.insert(name, value.into_owned());
    }
    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlError::Invalid(format!(
                "multiple root elements (second is <{}>)",
                element.tag
            )))
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    let slot = match parent.children.last_mut() {
        Some(child) => &mut child.tail,
        None => &mut parent.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

fn split_clark(tag: &str) -> (Option<&str>, &str) {
    if let Some(rest) = tag.strip_prefix('{') {
        if let Some((uri, local)) = rest.split_once('}') {
            return (Some(uri), local);
        }
    }
    (None, tag)
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    inherited_ns: Option<&str>,
) -> Result<(), XmlError> {
    let (ns, name) = split_clark(&element.tag);
    let mut start = BytesStart::new(name);
    match (ns, inherited_ns) {
        (Some(uri), Some(parent)) if uri == parent => {}
        (Some(uri), _) => start.push_attribute(("xmlns", uri)),
        (None, Some(_)) => start.push_attribute(("xmlns", "")),
        (None, None) => {}
    }
    let mut prefixes: Vec<(&str, String)> = Vec::new();
    for (key, value) in &element.attrib {
        let name = match split_clark(key) {
            (Some(XML_NAMESPACE), local) => format!("xml:{local}"),
            (Some(uri), local) => {
                let prefix = match prefixes.iter().find(|(bound, _)| *bound == uri) {
                    Some((_, prefix)) => prefix.clone(),
                    None => {
                        let prefix = if uri == XSI_NAMESPACE {
                            "xsi".to_string()
                        } else {
                            format!("ns{}", prefixes.len())
                        };
                        start.push_attribute((format!("xmlns:{prefix}").as_str(), uri));
                        prefixes.push((uri, prefix.clone()));
                        prefix
                    }
                };
                format!("{prefix}:{local}")
            }
            (None, local) => local.to_string(),
        };
        start.push_attribute((name.as_str(), value.as_str()));
    }

    let text = element.text.as_deref().unwrap_or("");
    if element.children.is_empty() && text.is_empty() {
        emit(writer, Event::Empty(start))?;
    } else {
        emit(writer, Event::Start(start))?;
        if !text.is_empty() {
            emit(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &element.children {
            write_element(writer, child, ns)?;
        }
        emit(writer, Event::End(BytesEnd::new(name)))?;
    }

    if let Some(tail) = element.tail.as_deref().filter(|tail| !tail.is_empty()) {
        emit(writer, Event::Text(BytesText::new(tail)))?;
    }
    Ok(())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|err| XmlError::Xml(err.to_string()))
}
