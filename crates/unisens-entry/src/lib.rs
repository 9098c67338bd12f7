#![cfg_attr(docsrs, feature(doc_cfg))]
//! Unisens entry model: typed entries over the XML metadata tree.
//!
//! An [`Entry`] keeps its string attribute map and a typed field mirror in
//! sync, resolves the payload file `folder/id`, and decodes it according to
//! its [`EntryKind`]. [`CustomAttributes`] holds the recording's user-defined
//! key/value pairs.
//!
//! ```rust,no_run
//! use unisens_entry::{DecodeOptions, Entry, EntryKind};
//!
//! let root = unisens_xml::parse_file("recording/unisens.xml")?;
//! for element in root.children {
//!     let kind = EntryKind::from_tag(&element.tag);
//!     if kind != EntryKind::Signal {
//!         continue;
//!     }
//!     let entry = Entry::adopt(kind, "recording", element);
//!     let data = entry.get_data(&DecodeOptions::default())?;
//!     println!("{entry}: {} samples", data.as_samples().map_or(0, |s| s.len()));
//! }
//! # Ok::<(), unisens_entry::EntryError>(())
//! ```

use thiserror::Error;
use unisens_xml::XmlError;

pub mod csv_format;
pub mod custom;
pub mod decode;
mod entry;
pub mod kind;
pub mod schema;

pub use csv_format::CsvFileFormat;
pub use custom::{CustomAttribute, CustomAttributes};
pub use decode::{
    Cell, DataType, DecodeOptions, Endianness, EntryData, EventRecord, Frame, Matrix, ReadMode,
    SampleArray,
};
pub use entry::{Entry, PayloadStatus, SignalParams};
pub use kind::EntryKind;
pub use schema::{Assigned, FieldValue, ScalarKind};

/// Error type produced by entry operations.
#[derive(Debug, Error)]
pub enum EntryError {
    /// Neither or both of an element and an id were supplied.
    #[error("construction error: {0}")]
    Construction(String),
    /// A key or argument is not acceptable.
    #[error("validation error: {0}")]
    Validation(String),
    /// An attribute the operation depends on is absent.
    #[error("missing attribute: {0}")]
    MissingAttribute(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// An event timestamp could not be parsed; the whole read is aborted.
    #[error("conversion error in row {row}: {value:?} is not a timestamp")]
    Conversion { row: usize, value: String },
    /// The entry kind has no such operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// Payload content does not match the metadata.
    #[error("payload error: {0}")]
    Payload(String),
    #[error("io error: {0}")]
    Io(String),
    #[error(transparent)]
    Xml(#[from] XmlError),
}
