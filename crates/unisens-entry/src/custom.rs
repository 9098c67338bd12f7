use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use unisens_xml::{strip, validkey, Element};

use crate::schema::{Assigned, FieldMirror, FieldValue};
use crate::EntryError;

pub const CUSTOM_ATTRIBUTES_TAG: &str = "customAttributes";
pub const CUSTOM_ATTRIBUTE_TAG: &str = "customAttribute";

/// Public methods of [`CustomAttributes`]; assignments under these names
/// stay out of the mapping.
const OPERATIONS: &[&str] = &[
    "assign",
    "children",
    "field",
    "from_element",
    "get",
    "is_empty",
    "iter",
    "keys",
    "len",
    "new",
    "remove",
    "set",
    "tag",
    "to_element",
    "to_xml",
];

/// Leaf `<customAttribute key=".." value=".."/>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttribute {
    pub key: String,
    pub value: String,
}

impl CustomAttribute {
    pub fn to_element(&self) -> Element {
        Element::with_attrib(
            CUSTOM_ATTRIBUTE_TAG,
            [("key", self.key.as_str()), ("value", self.value.as_str())],
        )
    }
}

impl fmt::Display for CustomAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "customAttribute({}:{})", self.key, self.value)
    }
}

/// User-defined key/value pairs of a recording.
///
/// The children are derived state: every mutation rebuilds them from the
/// ordered mapping, one [`CustomAttribute`] per pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributes {
    tag: String,
    text: Option<String>,
    tail: Option<String>,
    pairs: Vec<(String, String)>,
    fields: FieldMirror,
    state: BTreeMap<String, FieldValue>,
    children: Vec<CustomAttribute>,
}

impl Default for CustomAttributes {
    fn default() -> Self {
        CustomAttributes {
            tag: CUSTOM_ATTRIBUTES_TAG.into(),
            text: None,
            tail: None,
            pairs: Vec::new(),
            fields: FieldMirror::default(),
            state: BTreeMap::new(),
            children: Vec::new(),
        }
    }
}

impl CustomAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the `key`/`value` pairs of every child in document order.
    pub fn from_element(element: &Element) -> Result<Self, EntryError> {
        let mut attrs = CustomAttributes {
            tag: strip(&element.tag).to_string(),
            text: element.text.clone(),
            tail: element.tail.clone(),
            ..Default::default()
        };
        for child in &element.children {
            let key = child.get("key").ok_or_else(|| {
                EntryError::MissingAttribute(format!("{}.key", strip(&child.tag)))
            })?;
            let value = child.get("value").ok_or_else(|| {
                EntryError::MissingAttribute(format!("{}.value", strip(&child.tag)))
            })?;
            attrs.upsert(key, value.to_string());
        }
        attrs.rebuild();
        Ok(attrs)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn children(&self) -> &[CustomAttribute] {
        &self.children
    }

    /// Insert or update a pair; an existing key keeps its position.
    pub fn set(&mut self, key: &str, value: impl fmt::Display) -> Result<(), EntryError> {
        validkey(key).map_err(|err| EntryError::Validation(err.to_string()))?;
        self.upsert(key, value.to_string());
        self.rebuild();
        Ok(())
    }

    /// Delete a pair. The children are rebuilt whether or not it existed.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self
            .pairs
            .iter()
            .position(|(k, _)| k == key)
            .map(|idx| self.pairs.remove(idx).1);
        if removed.is_some() {
            self.fields.forget(key);
        }
        self.rebuild();
        removed
    }

    /// Field assignment with the same mirroring rule as entries.
    pub fn assign(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Assigned, EntryError> {
        let value = value.into();
        if !value.is_scalar() || name.starts_with('_') || OPERATIONS.contains(&name) {
            self.state.insert(name.to_string(), value);
            return Ok(Assigned::Unmirrored);
        }
        validkey(name).map_err(|err| EntryError::Validation(err.to_string()))?;
        if let Some(kind) = value.kind() {
            self.fields.declare(name, kind);
        }
        self.state.remove(name);
        self.upsert(name, value.to_string());
        self.rebuild();
        Ok(Assigned::Mirrored)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).or_else(|| self.state.get(name))
    }

    fn upsert(&mut self, key: &str, value: String) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    fn rebuild(&mut self) {
        self.children = self
            .pairs
            .iter()
            .map(|(key, value)| CustomAttribute {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        let pairs = &self.pairs;
        self.fields
            .rederive(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        debug!(pairs = self.pairs.len(), "rebuilt custom attributes");
    }

    pub fn to_element(&self) -> Element {
        Element {
            tag: self.tag.clone(),
            attrib: Default::default(),
            text: self.text.clone(),
            tail: self.tail.clone(),
            children: self.children.iter().map(CustomAttribute::to_element).collect(),
        }
    }

    pub fn to_xml(&self) -> Result<String, EntryError> {
        Ok(self.to_element().to_xml()?)
    }
}

impl fmt::Display for CustomAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.keys().collect();
        write!(f, "<CustomAttributes({})>", keys.join(", "))
    }
}
