use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info};
use unisens_entry::{CustomAttributes, Entry, EntryKind};
use unisens_xml::{strip, Attributes};

pub const METADATA_FILE: &str = "unisens.xml";

const CUSTOM_ATTRIBUTES: &str = "customAttributes";

/// Top-level nodes of a recording, adopted as entries.
#[derive(Debug)]
pub struct Recording {
    pub folder: PathBuf,
    pub attrib: Attributes,
    pub entries: Vec<Entry>,
    pub custom: CustomAttributes,
}

impl Recording {
    pub fn entry(&self, id: &str) -> Result<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.id() == Some(id))
            .ok_or_else(|| anyhow!("no entry with id {id}"))
    }
}

/// Accept either the recording folder or the path of its `unisens.xml`.
pub fn resolve_paths(path: &Path) -> (PathBuf, PathBuf) {
    if path.is_dir() {
        (path.to_path_buf(), path.join(METADATA_FILE))
    } else {
        let folder = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        (folder.to_path_buf(), path.to_path_buf())
    }
}

pub fn load_recording(path: &Path) -> Result<Recording> {
    let (folder, xml_path) = resolve_paths(path);
    let root = unisens_xml::parse_file(&xml_path)
        .with_context(|| format!("load {}", xml_path.display()))?;
    let mut recording = Recording {
        folder: folder.clone(),
        attrib: root.attrib,
        entries: Vec::new(),
        custom: CustomAttributes::new(),
    };
    for element in root.children {
        if strip(&element.tag) == CUSTOM_ATTRIBUTES {
            recording.custom =
                CustomAttributes::from_element(&element).context("read custom attributes")?;
            continue;
        }
        let kind = EntryKind::from_tag(&element.tag);
        debug!(tag = %element.tag, %kind, "adopting element");
        recording
            .entries
            .push(Entry::adopt(kind, folder.clone(), element));
    }
    info!(
        entries = recording.entries.len(),
        custom = recording.custom.len(),
        folder = %folder.display(),
        "loaded recording"
    );
    Ok(recording)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<unisens xmlns="http://www.unisens.org/unisens2.0" measurementId="t">
  <customAttributes><customAttribute key="age" value="34"/></customAttributes>
  <signalEntry id="a.bin" dataType="uint8"/>
  <context schemaUrl="context.xsd"/>
</unisens>"#;

    #[test]
    fn load_from_folder_or_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(METADATA_FILE), XML).expect("write xml");
        for path in [dir.path().to_path_buf(), dir.path().join(METADATA_FILE)] {
            let recording = load_recording(&path).expect("load recording");
            assert_eq!(recording.folder, dir.path());
            assert_eq!(recording.entries.len(), 2);
            assert_eq!(recording.entries[0].kind(), EntryKind::Signal);
            assert_eq!(recording.entries[1].tag(), "context");
            assert_eq!(recording.custom.get("age"), Some("34"));
            assert!(recording.entry("a.bin").is_ok());
            assert!(recording.entry("b.bin").is_err());
        }
    }

    #[test]
    fn bare_file_name_uses_current_folder() {
        let (folder, xml) = resolve_paths(Path::new("unisens.xml"));
        assert_eq!(folder, Path::new("."));
        assert_eq!(xml, Path::new("unisens.xml"));
    }
}
