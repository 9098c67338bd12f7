use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::common;

pub fn run(path: &Path, json: bool) -> Result<()> {
    let recording = common::load_recording(path)?;
    let custom = &recording.custom;

    if json {
        let map: BTreeMap<&str, &str> = custom.iter().collect();
        return common::print_json(&map);
    }

    if custom.is_empty() {
        println!("No custom attributes");
        return Ok(());
    }
    let width = custom.keys().map(str::len).max().unwrap_or(0);
    for (key, value) in custom.iter() {
        println!("{key:<width$}  {value}");
    }
    Ok(())
}
