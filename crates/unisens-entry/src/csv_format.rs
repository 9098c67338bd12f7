use unisens_xml::{Attributes, Element};

use crate::EntryError;

pub const CSV_FILE_FORMAT_TAG: &str = "csvFileFormat";

/// Field and decimal separators of a delimited-text payload.
///
/// Lives in the metadata as a `<csvFileFormat separator=";"
/// decimalSeparator="."/>` child of values and event entries. Defaults for a
/// missing element are the caller's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFileFormat {
    pub separator: String,
    pub decimal_separator: Option<String>,
}

impl CsvFileFormat {
    pub fn new(separator: impl Into<String>) -> Self {
        CsvFileFormat {
            separator: separator.into(),
            decimal_separator: None,
        }
    }

    pub fn with_decimal_separator(mut self, decimal: impl Into<String>) -> Self {
        self.decimal_separator = Some(decimal.into());
        self
    }

    /// Read the format from a `csvFileFormat` element. Returns `None` when
    /// the element carries no `separator`.
    pub fn from_element(element: &Element) -> Option<Self> {
        Self::from_attrib(&element.attrib)
    }

    pub fn from_attrib(attrib: &Attributes) -> Option<Self> {
        let separator = attrib.get("separator")?;
        Some(CsvFileFormat {
            separator: separator.clone(),
            decimal_separator: attrib.get("decimalSeparator").cloned(),
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::with_attrib(
            CSV_FILE_FORMAT_TAG,
            [("separator", self.separator.as_str())],
        );
        if let Some(decimal) = &self.decimal_separator {
            element
                .attrib
                .insert("decimalSeparator".into(), decimal.clone());
        }
        element
    }

    /// The separator as a single character, as the text reader requires.
    pub fn separator_char(&self) -> Result<char, EntryError> {
        let mut chars = self.separator.chars();
        match (chars.next(), chars.next()) {
            (Some(sep), None) => Ok(sep),
            _ => Err(EntryError::Validation(format!(
                "csvFileFormat.separator must be a single character, got {:?}",
                self.separator
            ))),
        }
    }

    /// Decimal mark used in numeric fields, `.` unless declared otherwise.
    pub fn decimal_mark(&self) -> &str {
        self.decimal_separator
            .as_deref()
            .filter(|mark| !mark.is_empty())
            .unwrap_or(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_roundtrip_keeps_both_separators() {
        let format = CsvFileFormat::new(";").with_decimal_separator(",");
        let element = format.to_element();
        assert_eq!(element.tag, "csvFileFormat");
        assert_eq!(CsvFileFormat::from_element(&element), Some(format));
    }

    #[test]
    fn missing_separator_yields_none() {
        let element = Element::with_attrib("csvFileFormat", [("decimalSeparator", ".")]);
        assert!(CsvFileFormat::from_element(&element).is_none());
    }

    #[test]
    fn separator_must_be_one_char() {
        assert_eq!(CsvFileFormat::new("\t").separator_char().unwrap(), '\t');
        assert!(matches!(
            CsvFileFormat::new(";;").separator_char(),
            Err(EntryError::Validation(_))
        ));
        assert!(CsvFileFormat::new("").separator_char().is_err());
        assert_eq!(CsvFileFormat::new(";").decimal_mark(), ".");
    }
}
