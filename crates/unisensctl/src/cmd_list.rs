use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use unisens_entry::Entry;

use crate::common;

#[derive(Serialize)]
struct EntryRow {
    index: usize,
    kind: &'static str,
    tag: String,
    id: Option<String>,
    data_type: Option<String>,
    sample_rate: Option<f64>,
    content_class: Option<String>,
}

impl EntryRow {
    fn new(index: usize, entry: &Entry) -> Self {
        EntryRow {
            index,
            kind: entry.kind().type_name(),
            tag: entry.tag().to_string(),
            id: entry.id().map(str::to_string),
            data_type: entry.data_type().map(str::to_string),
            sample_rate: entry.sample_rate(),
            content_class: entry.content_class().map(str::to_string),
        }
    }
}

pub fn run(path: &Path, json: bool) -> Result<()> {
    let recording = common::load_recording(path)?;
    info!(count = recording.entries.len(), "listing entries");
    let rows: Vec<EntryRow> = recording
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| EntryRow::new(idx, entry))
        .collect();

    if json {
        return common::print_json(&rows);
    }

    if rows.is_empty() {
        println!("No entries in {}", recording.folder.display());
        return Ok(());
    }
    println!(
        "{:<6} {:<12} {:<24} {:<10} {:<10} {}",
        "Index", "Kind", "Id", "DataType", "Rate", "Class"
    );
    for row in rows {
        println!(
            "{:<6} {:<12} {:<24} {:<10} {:<10} {}",
            row.index,
            row.kind,
            row.id.as_deref().unwrap_or(&row.tag),
            row.data_type.as_deref().unwrap_or("-"),
            row.sample_rate
                .map(|rate| rate.to_string())
                .unwrap_or_else(|| "-".into()),
            row.content_class.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
