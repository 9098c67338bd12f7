//! Load and serialize Unisens XML metadata using quick-xml.
//!
//! The crate exposes a small owned element tree ([`Element`]) shaped like the
//! metadata a Unisens container carries: a tag, an attribute map, the text
//! between the start tag and the first child, the tail text after the end
//! tag, and the ordered children. It also hosts the name helpers used when
//! adopting elements into typed entries.

use thiserror::Error;

mod names;
mod tree;

pub use names::{strip, to_tag_spelling, validkey};
pub use tree::{parse, parse_file, Attributes, Element};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("invalid document: {0}")]
    Invalid(String),
    /// A tag or attribute key is not a valid XML name.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("io: {0}")]
    Io(String),
}
