//! Declared attribute schema and the typed field mirror of an attribute map.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

/// Scalar kinds a mirrored field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Int,
    Float,
    Bool,
    Bytes,
}

impl ScalarKind {
    /// Interpret serialized attribute text as this kind.
    pub fn parse(self, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        match self {
            ScalarKind::Text => Some(FieldValue::Text(raw.to_string())),
            ScalarKind::Int => trimmed.parse().ok().map(FieldValue::Int),
            ScalarKind::Float => trimmed.parse().ok().map(FieldValue::Float),
            ScalarKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(FieldValue::Bool(true)),
                "false" | "0" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            ScalarKind::Bytes => Some(FieldValue::Bytes(raw.as_bytes().to_vec())),
        }
    }
}

/// Attributes defined by the Unisens format and the kind their mirrored field
/// is decoded as. Keys not listed here mirror as text unless a field
/// assignment declared a kind for them.
pub const ATTRIBUTE_SCHEMA: &[(&str, ScalarKind)] = &[
    ("id", ScalarKind::Text),
    ("dataType", ScalarKind::Text),
    ("lsbValue", ScalarKind::Float),
    ("sampleRate", ScalarKind::Float),
    ("unit", ScalarKind::Text),
    ("comment", ScalarKind::Text),
    ("contentClass", ScalarKind::Text),
    ("baseline", ScalarKind::Int),
    ("adcZero", ScalarKind::Int),
    ("adcResolution", ScalarKind::Int),
    ("sampleCount", ScalarKind::Int),
    ("typeLength", ScalarKind::Int),
    ("source", ScalarKind::Text),
    ("sourceId", ScalarKind::Text),
];

pub fn schema_kind(name: &str) -> Option<ScalarKind> {
    ATTRIBUTE_SCHEMA
        .iter()
        .find(|(attr, _)| *attr == name)
        .map(|(_, kind)| *kind)
}

/// Value held by an object field.
///
/// Only the scalar variants take part in attribute mirroring; `Text` and
/// `List` assigned as fields stay plain object state.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Bool(_) | FieldValue::Bytes(_)
        )
    }

    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            FieldValue::Int(_) => Some(ScalarKind::Int),
            FieldValue::Float(_) => Some(ScalarKind::Float),
            FieldValue::Bool(_) => Some(ScalarKind::Bool),
            FieldValue::Bytes(_) => Some(ScalarKind::Bytes),
            FieldValue::Text(_) => Some(ScalarKind::Text),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the value; text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(value) => Some(*value as f64),
            FieldValue::Float(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(value) => write!(f, "{value}"),
            // keep a fractional part so the attribute reads back as a float
            FieldValue::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        FieldValue::Bytes(value.to_vec())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

/// Outcome of a field assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assigned {
    /// The value was written to the attribute map and re-mirrored.
    Mirrored,
    /// The value is kept as object state only and never serialized.
    Unmirrored,
}

/// Typed mirror of a string attribute map.
///
/// The mirror is never edited key by key: [`FieldMirror::rederive`] rebuilds
/// it from the full attribute map, so the two cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMirror {
    values: BTreeMap<String, FieldValue>,
    declared: BTreeMap<String, ScalarKind>,
}

impl FieldMirror {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record the kind a field was assigned with so it mirrors back typed.
    pub fn declare(&mut self, name: &str, kind: ScalarKind) {
        self.declared.insert(name.to_string(), kind);
    }

    pub fn forget(&mut self, name: &str) {
        self.declared.remove(name);
    }

    /// Format-defined attributes always use their schema kind; other names
    /// use the kind they were last assigned with, or text.
    pub fn kind_of(&self, name: &str) -> ScalarKind {
        schema_kind(name)
            .or_else(|| self.declared.get(name).copied())
            .unwrap_or(ScalarKind::Text)
    }

    pub fn rederive<'a, I>(&mut self, attrib: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.values.clear();
        for (name, raw) in attrib {
            let kind = self.kind_of(name);
            let value = kind.parse(raw).unwrap_or_else(|| {
                debug!(field = name, raw, ?kind, "attribute does not parse as declared kind");
                FieldValue::Text(raw.to_string())
            });
            self.values.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_kinds_drive_mirroring() {
        let mut mirror = FieldMirror::default();
        mirror.rederive([("id", "ecg.bin"), ("lsbValue", "0.5"), ("adcZero", "12"), ("x", "1")]);
        assert_eq!(mirror.get("id"), Some(&FieldValue::Text("ecg.bin".into())));
        assert_eq!(mirror.get("lsbValue"), Some(&FieldValue::Float(0.5)));
        assert_eq!(mirror.get("adcZero"), Some(&FieldValue::Int(12)));
        assert_eq!(mirror.get("x"), Some(&FieldValue::Text("1".into())));
    }

    #[test]
    fn declared_kind_applies_to_free_names_and_bad_values_fall_back_to_text() {
        let mut mirror = FieldMirror::default();
        mirror.declare("x", ScalarKind::Int);
        mirror.rederive([("x", "7"), ("lsbValue", "n/a")]);
        assert_eq!(mirror.get("x"), Some(&FieldValue::Int(7)));
        assert_eq!(mirror.get("lsbValue"), Some(&FieldValue::Text("n/a".into())));
    }

    #[test]
    fn schema_kind_beats_declared_kind() {
        let mut mirror = FieldMirror::default();
        mirror.declare("unit", ScalarKind::Bytes);
        mirror.declare("id", ScalarKind::Int);
        mirror.declare("lsbValue", ScalarKind::Int);
        mirror.rederive([("unit", "mV"), ("id", "5"), ("lsbValue", "2")]);
        assert_eq!(mirror.kind_of("unit"), ScalarKind::Text);
        assert_eq!(mirror.get("unit"), Some(&FieldValue::Text("mV".into())));
        assert_eq!(mirror.get("id"), Some(&FieldValue::Text("5".into())));
        assert_eq!(mirror.get("lsbValue"), Some(&FieldValue::Float(2.0)));
    }

    #[test]
    fn rederive_drops_stale_fields() {
        let mut mirror = FieldMirror::default();
        mirror.rederive([("a", "1"), ("b", "2")]);
        mirror.rederive([("b", "2")]);
        assert!(!mirror.contains("a"));
        assert_eq!(mirror.len(), 1);
    }

    #[test]
    fn display_matches_attribute_text() {
        assert_eq!(FieldValue::Float(256.0).to_string(), "256.0");
        assert_eq!(FieldValue::Float(0.25).to_string(), "0.25");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::Bytes(b"abc".to_vec()).to_string(), "abc");
        assert_eq!(FieldValue::Int(-3).to_string(), "-3");
    }

    #[test]
    fn scalar_set_excludes_text_and_lists() {
        assert!(FieldValue::from(1i64).is_scalar());
        assert!(FieldValue::from(1.5).is_scalar());
        assert!(FieldValue::from(false).is_scalar());
        assert!(FieldValue::from(b"x".as_slice()).is_scalar());
        assert!(!FieldValue::from("text").is_scalar());
        assert!(!FieldValue::from(vec![FieldValue::Int(1)]).is_scalar());
    }
}
