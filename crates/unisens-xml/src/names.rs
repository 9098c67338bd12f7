use crate::XmlError;

/// Remove a `{namespace}` prefix from an element name.
///
/// Some unisens.xml files are written with a namespace on every element, so
/// the parsed names arrive as `{https://www.unisens.org/unisens2.0}signalEntry`.
/// Everything up to and including the last `}` is dropped; names without a
/// `}` are returned unchanged.
pub fn strip(name: &str) -> &str {
    match name.rfind('}') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Check that `key` can be used as an XML attribute or tag name.
pub fn validkey(key: &str) -> Result<&str, XmlError> {
    match key.chars().next() {
        None => Err(XmlError::InvalidKey("key cannot be empty".into())),
        Some(first) if first.is_ascii_digit() => Err(XmlError::InvalidKey(format!(
            "key cannot start with a number: {key}"
        ))),
        Some(_) => Ok(key),
    }
}

/// Lowercase the first character of a type name: `SignalEntry` becomes
/// `signalEntry`.
pub fn to_tag_spelling(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
