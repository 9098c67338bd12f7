//! Payload decoding for the typed entry kinds.

pub mod signal;
pub mod table;

pub use signal::{DataType, Endianness, SampleArray};
pub use table::{Cell, EventRecord, Frame, Matrix, ReadMode};

/// Knobs of a `get_data` call. Each kind reads only the fields it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Apply `lsbValue` to signal samples.
    pub scaled: bool,
    /// Byte order of binary payloads.
    pub byte_order: Endianness,
    /// Result shape of delimited-text payloads.
    pub mode: ReadMode,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            scaled: true,
            byte_order: Endianness::Little,
            mode: ReadMode::List,
        }
    }
}

impl DecodeOptions {
    /// Unscaled samples, everything else default.
    pub fn raw() -> Self {
        DecodeOptions {
            scaled: false,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_byte_order(mut self, byte_order: Endianness) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_scaled(mut self, scaled: bool) -> Self {
        self.scaled = scaled;
        self
    }
}

/// Decoded payload of an entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum EntryData {
    Samples(SampleArray),
    Rows(Vec<Vec<String>>),
    Events(Vec<EventRecord>),
    Frame(Frame),
    Matrix(Matrix),
}

impl EntryData {
    pub fn as_samples(&self) -> Option<&SampleArray> {
        match self {
            EntryData::Samples(samples) => Some(samples),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Vec<String>]> {
        match self {
            EntryData::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_events(&self) -> Option<&[EventRecord]> {
        match self {
            EntryData::Events(events) => Some(events),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            EntryData::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            EntryData::Matrix(matrix) => Some(matrix),
            _ => None,
        }
    }
}
