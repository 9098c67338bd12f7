use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use unisens_entry::Entry;
use unisens_xml::Attributes;

use crate::common;

#[derive(Serialize)]
struct EntryView<'a> {
    kind: &'static str,
    tag: &'a str,
    attrib: &'a Attributes,
    fields: BTreeMap<&'a str, String>,
    children: Vec<&'a str>,
    payload: Option<String>,
}

impl<'a> EntryView<'a> {
    fn new(entry: &'a Entry) -> Self {
        let fields = entry
            .fields()
            .names()
            .filter_map(|name| Some((name, entry.field(name)?.to_string())))
            .collect();
        EntryView {
            kind: entry.kind().type_name(),
            tag: entry.tag(),
            attrib: entry.attrib(),
            fields,
            children: entry.children().iter().map(Entry::tag).collect(),
            payload: entry.payload_path().map(|p| p.display().to_string()),
        }
    }
}

pub fn run(path: &Path, id: &str, json: bool) -> Result<()> {
    let recording = common::load_recording(path)?;
    let entry = recording.entry(id)?;

    if json {
        return common::print_json(&EntryView::new(entry));
    }

    println!("{entry}");
    println!("{}", entry.to_xml()?);
    Ok(())
}
