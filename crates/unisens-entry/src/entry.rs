use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use unisens_xml::{strip, Attributes, Element};

use crate::csv_format::{CsvFileFormat, CSV_FILE_FORMAT_TAG};
use crate::decode::{signal, table, DataType, DecodeOptions, EntryData, Endianness, SampleArray};
use crate::kind::EntryKind;
use crate::schema::{Assigned, FieldMirror, FieldValue};
use crate::EntryError;

const FRESH_TEXT: &str = "\n";
const FRESH_TAIL: &str = "\n  \n  \n  \n  ";
const BIN_FILE_FORMAT_TAG: &str = "binFileFormat";

/// Public methods of [`Entry`]. A field assignment under one of these names
/// is never mirrored into the attribute map. Accessors named exactly like
/// the attribute they read (`id`, `unit`, `comment`, `baseline`) are that
/// field and stay assignable.
const OPERATIONS: &[&str] = &[
    "adc_resolution",
    "adc_zero",
    "adopt",
    "assign",
    "attrib",
    "child",
    "children",
    "content_class",
    "csv_file_format",
    "data_type",
    "declared_endianness",
    "field",
    "fields",
    "folder",
    "from_parts",
    "get",
    "get_data",
    "is_operation",
    "kind",
    "lsb_value",
    "payload_path",
    "payload_status",
    "push_child",
    "rederive",
    "remove_attr",
    "sample_rate",
    "set",
    "set_csv_file_format",
    "set_data",
    "set_tail",
    "set_text",
    "tag",
    "tail",
    "text",
    "to_element",
    "to_xml",
    "with_id",
];

/// Result of resolving an entry's payload file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadStatus {
    Present(PathBuf),
    Missing(PathBuf),
    /// A typed entry without an `id`.
    NoId,
    /// Groups and id-less generic nodes have nothing to check.
    Skipped,
}

/// Parameters persisted alongside a signal payload by [`Entry::set_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub sample_rate: Option<f64>,
    pub lsb_value: f64,
    pub unit: Option<String>,
    pub comment: Option<String>,
    pub content_class: Option<String>,
}

impl Default for SignalParams {
    fn default() -> Self {
        SignalParams {
            sample_rate: None,
            lsb_value: 1.0,
            unit: None,
            comment: None,
            content_class: None,
        }
    }
}

/// One metadata node of a Unisens document.
///
/// The string attribute map is what gets serialized; the field mirror is its
/// typed view and is rebuilt from the whole map after every mutation. Object
/// state that must never reach the XML lives in a separate map.
#[derive(Debug, Clone)]
pub struct Entry {
    kind: EntryKind,
    tag: String,
    folder: PathBuf,
    attrib: Attributes,
    fields: FieldMirror,
    state: BTreeMap<String, FieldValue>,
    text: Option<String>,
    tail: Option<String>,
    children: Vec<Entry>,
}

impl Entry {
    /// Construct from exactly one of an existing element or a payload id.
    pub fn from_parts(
        kind: EntryKind,
        folder: impl Into<PathBuf>,
        id: Option<&str>,
        element: Option<Element>,
    ) -> Result<Entry, EntryError> {
        match (id, element) {
            (None, Some(element)) => Ok(Entry::adopt(kind, folder, element)),
            (Some(id), None) => Entry::with_id(kind, folder, id),
            (Some(_), Some(_)) => Err(EntryError::Construction(
                "supply either an existing element or an id, not both".into(),
            )),
            (None, None) => Err(EntryError::Construction(
                "either an existing element or an id must be supplied".into(),
            )),
        }
    }

    /// Adopt a parsed element and its subtree.
    pub fn adopt(kind: EntryKind, folder: impl Into<PathBuf>, element: Element) -> Entry {
        let entry = Entry::adopt_node(kind, folder.into(), element);
        entry.check_payload();
        entry
    }

    fn adopt_node(kind: EntryKind, folder: PathBuf, element: Element) -> Entry {
        let tag = kind
            .canonical_tag()
            .unwrap_or_else(|| strip(&element.tag).to_string());
        let children = element
            .children
            .into_iter()
            .map(|child| Entry::adopt_node(EntryKind::Generic, folder.clone(), child))
            .collect();
        let mut entry = Entry {
            kind,
            tag,
            folder,
            attrib: element.attrib,
            fields: FieldMirror::default(),
            state: BTreeMap::new(),
            text: element.text,
            tail: element.tail,
            children,
        };
        entry.rederive();
        entry
    }

    /// Start a new entry that will describe the payload file `id`.
    pub fn with_id(
        kind: EntryKind,
        folder: impl Into<PathBuf>,
        id: &str,
    ) -> Result<Entry, EntryError> {
        if id.is_empty() {
            return Err(EntryError::Construction("id cannot be empty".into()));
        }
        if kind.has_payload() && Path::new(id).extension().is_none() {
            warn!(id, "id should be a filename, e.g. .bin or .csv");
        }
        let mut entry = Entry {
            kind,
            tag: kind.canonical_tag().unwrap_or_else(|| "entry".into()),
            folder: folder.into(),
            attrib: Attributes::new(),
            fields: FieldMirror::default(),
            state: BTreeMap::new(),
            text: Some(FRESH_TEXT.into()),
            tail: Some(FRESH_TAIL.into()),
            children: Vec::new(),
        };
        entry.set("id", id);
        Ok(entry)
    }

    /// Resolve `folder/id` and check that the file exists.
    pub fn payload_status(&self) -> PayloadStatus {
        if !self.kind.has_payload() {
            return PayloadStatus::Skipped;
        }
        match self.payload_path() {
            Some(path) if path.exists() => PayloadStatus::Present(path),
            Some(path) => PayloadStatus::Missing(path),
            None if self.kind == EntryKind::Generic => PayloadStatus::Skipped,
            None => PayloadStatus::NoId,
        }
    }

    fn check_payload(&self) {
        match self.payload_status() {
            PayloadStatus::Missing(path) => {
                warn!(entry = %self, path = %path.display(), "payload file does not exist");
            }
            PayloadStatus::NoId => warn!(tag = %self.tag, "entry has no id"),
            PayloadStatus::Present(_) | PayloadStatus::Skipped => {}
        }
    }

    pub fn is_operation(name: &str) -> bool {
        OPERATIONS.contains(&name)
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn attrib(&self) -> &Attributes {
        &self.attrib
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrib.get(name).map(String::as_str)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub fn set_tail(&mut self, tail: Option<String>) {
        self.tail = tail;
    }

    pub fn children(&self) -> &[Entry] {
        &self.children
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Entry> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn push_child(&mut self, child: Entry) {
        self.children.push(child);
    }

    /// Store an attribute as text and rebuild the whole field mirror.
    pub fn set(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        let name = name.into();
        let value = value.to_string();
        debug!(entry = %self.tag, attr = %name, value = %value, "set attribute");
        self.attrib.insert(name, value);
        self.rederive();
    }

    /// Assign an object field.
    ///
    /// Scalars (integer, float, boolean, bytes) under a name that is neither
    /// one of [`OPERATIONS`] nor `_`-prefixed go through [`Entry::set`]
    /// and mirror back typed. Anything else is kept as object state only.
    pub fn assign(&mut self, name: &str, value: impl Into<FieldValue>) -> Assigned {
        let value = value.into();
        let mirrored =
            value.is_scalar() && !name.starts_with('_') && !Entry::is_operation(name);
        if !mirrored {
            debug!(entry = %self.tag, field = name, "field kept out of attributes");
            self.state.insert(name.to_string(), value);
            return Assigned::Unmirrored;
        }
        if let Some(kind) = value.kind() {
            self.fields.declare(name, kind);
        }
        self.state.remove(name);
        self.set(name, &value);
        Assigned::Mirrored
    }

    /// Value of a field: the attribute mirror first, then object state.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).or_else(|| self.state.get(name))
    }

    pub fn fields(&self) -> &FieldMirror {
        &self.fields
    }

    /// Delete an attribute and its mirrored field. A missing key is logged
    /// and leaves the entry untouched.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        match self.attrib.remove(key) {
            Some(value) => {
                self.fields.forget(key);
                self.rederive();
                Some(value)
            }
            None => {
                warn!(entry = %self, key, "attribute not present");
                None
            }
        }
    }

    /// Rebuild the field mirror from the attribute map.
    pub fn rederive(&mut self) {
        let attrib = &self.attrib;
        self.fields
            .rederive(attrib.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    pub fn id(&self) -> Option<&str> {
        self.text_field("id")
    }

    pub fn data_type(&self) -> Option<&str> {
        self.text_field("dataType")
    }

    pub fn lsb_value(&self) -> Option<f64> {
        self.fields.get("lsbValue").and_then(FieldValue::as_f64)
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.fields.get("sampleRate").and_then(FieldValue::as_f64)
    }

    pub fn unit(&self) -> Option<&str> {
        self.text_field("unit")
    }

    pub fn comment(&self) -> Option<&str> {
        self.text_field("comment")
    }

    pub fn content_class(&self) -> Option<&str> {
        self.text_field("contentClass")
    }

    pub fn baseline(&self) -> Option<i64> {
        self.fields.get("baseline").and_then(FieldValue::as_i64)
    }

    pub fn adc_zero(&self) -> Option<i64> {
        self.fields.get("adcZero").and_then(FieldValue::as_i64)
    }

    pub fn adc_resolution(&self) -> Option<i64> {
        self.fields.get("adcResolution").and_then(FieldValue::as_i64)
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_str)
    }

    /// `folder/id`, when the entry has an id.
    pub fn payload_path(&self) -> Option<PathBuf> {
        self.get("id").map(|id| self.folder.join(id))
    }

    fn require_payload(&self) -> Result<PathBuf, EntryError> {
        self.payload_path()
            .ok_or_else(|| EntryError::MissingAttribute(format!("{}.id", self.tag)))
    }

    /// Separators declared by the `csvFileFormat` child.
    pub fn csv_file_format(&self) -> Option<CsvFileFormat> {
        CsvFileFormat::from_attrib(self.child(CSV_FILE_FORMAT_TAG)?.attrib())
    }

    /// Replace the `csvFileFormat` child.
    pub fn set_csv_file_format(&mut self, format: &CsvFileFormat) {
        let child = Entry::adopt_node(EntryKind::Generic, self.folder.clone(), format.to_element());
        match self
            .children
            .iter_mut()
            .find(|existing| existing.tag == CSV_FILE_FORMAT_TAG)
        {
            Some(existing) => *existing = child,
            None => self.children.push(child),
        }
    }

    /// Byte order declared by a `binFileFormat` child, if any.
    pub fn declared_endianness(&self) -> Option<Result<Endianness, EntryError>> {
        self.child(BIN_FILE_FORMAT_TAG)?
            .get("endianess")
            .map(str::parse)
    }

    /// Decode the payload file according to the entry kind.
    pub fn get_data(&self, options: &DecodeOptions) -> Result<EntryData, EntryError> {
        match self.kind {
            EntryKind::Signal => self.signal_data(options),
            EntryKind::Values | EntryKind::Event => {
                let format = self.csv_file_format().ok_or_else(|| {
                    EntryError::MissingAttribute("csvFileFormat.separator".into())
                })?;
                let path = self.require_payload()?;
                table::read_table(&path, &format, options.mode, self.kind == EntryKind::Event)
            }
            EntryKind::Group | EntryKind::Custom | EntryKind::Generic => Err(
                EntryError::Unsupported(format!("{} has no decode operation", self.kind)),
            ),
        }
    }

    fn signal_data(&self, options: &DecodeOptions) -> Result<EntryData, EntryError> {
        let data_type: DataType = self
            .data_type()
            .ok_or_else(|| EntryError::MissingAttribute("dataType".into()))?
            .parse()?;
        let lsb = if options.scaled {
            let lsb = self.lsb_value().ok_or_else(|| {
                EntryError::MissingAttribute("lsbValue".into())
            })?;
            Some(lsb)
        } else {
            None
        };
        let path = self.require_payload()?;
        let samples = signal::read_samples(&path, data_type, options.byte_order, lsb)?;
        Ok(EntryData::Samples(samples))
    }

    /// Write a signal payload. Encoding is not available yet.
    pub fn set_data(&mut self, data: &SampleArray, params: &SignalParams) -> Result<(), EntryError> {
        if self.kind != EntryKind::Signal {
            return Err(EntryError::Unsupported(format!(
                "{} has no encode operation",
                self.kind
            )));
        }
        debug!(
            entry = %self,
            samples = data.len(),
            lsb = params.lsb_value,
            "signal encode requested"
        );
        Err(EntryError::NotImplemented(
            "signal payload encoding".into(),
        ))
    }

    pub fn to_element(&self) -> Element {
        Element {
            tag: self.tag.clone(),
            attrib: self.attrib.clone(),
            text: self.text.clone(),
            tail: self.tail.clone(),
            children: self.children.iter().map(Entry::to_element).collect(),
        }
    }

    pub fn to_xml(&self) -> Result<String, EntryError> {
        Ok(self.to_element().to_xml()?)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}({})>",
            self.kind.type_name(),
            self.get("id").unwrap_or_default()
        )
    }
}
