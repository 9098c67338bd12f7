use std::fmt;

use unisens_xml::{strip, to_tag_spelling};

/// Entry kinds of the Unisens metadata vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Untyped node, e.g. `context` or a `csvFileFormat` child.
    Generic,
    /// Binary sample stream.
    Signal,
    /// Delimited text of timestamped values.
    Values,
    /// Delimited text of timestamped events.
    Event,
    /// Grouping node without payload.
    Group,
    /// Entry with an opaque payload left to the caller.
    Custom,
}

impl EntryKind {
    pub const fn type_name(self) -> &'static str {
        match self {
            EntryKind::Generic => "Entry",
            EntryKind::Signal => "SignalEntry",
            EntryKind::Values => "ValuesEntry",
            EntryKind::Event => "EventEntry",
            EntryKind::Group => "Group",
            EntryKind::Custom => "CustomEntry",
        }
    }

    /// Tag forced onto entries of this kind; generic nodes keep their own.
    pub fn canonical_tag(self) -> Option<String> {
        match self {
            EntryKind::Generic => None,
            other => Some(to_tag_spelling(other.type_name())),
        }
    }

    /// Map an element tag (namespace prefix allowed) to its kind.
    pub fn from_tag(tag: &str) -> EntryKind {
        match strip(tag) {
            "signalEntry" => EntryKind::Signal,
            "valuesEntry" => EntryKind::Values,
            "eventEntry" => EntryKind::Event,
            "group" => EntryKind::Group,
            "customEntry" => EntryKind::Custom,
            _ => EntryKind::Generic,
        }
    }

    /// Whether `id` names a payload file for this kind.
    pub const fn has_payload(self) -> bool {
        !matches!(self, EntryKind::Group)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
