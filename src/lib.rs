#![cfg_attr(docsrs, feature(doc_cfg))]
//! Unisens facade that re-exports the workspace crates.
//!
//! ```rust,no_run
//! use unisens_rs::{entry, xml, DecodeOptions, Entry, EntryKind};
//!
//! let root = xml::parse_file("recording/unisens.xml")?;
//! let entries: Vec<Entry> = root
//!     .children
//!     .into_iter()
//!     .filter(|el| xml::strip(&el.tag) != "customAttributes")
//!     .map(|el| Entry::adopt(EntryKind::from_tag(&el.tag), "recording", el))
//!     .collect();
//! for entry in &entries {
//!     if matches!(entry.kind(), EntryKind::Signal | EntryKind::Values | EntryKind::Event) {
//!         let _ = entry.get_data(&DecodeOptions::default())?;
//!     }
//! }
//! # Ok::<(), entry::EntryError>(())
//! ```

pub use unisens_entry as entry;
pub use unisens_xml as xml;

pub use unisens_entry::{
    CustomAttributes, DecodeOptions, Entry, EntryData, EntryError, EntryKind, ReadMode,
};
pub use unisens_xml::{Element, XmlError};
