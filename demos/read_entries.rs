use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use unisens_rs::entry::{CsvFileFormat, EntryData};
use unisens_rs::{xml, CustomAttributes, DecodeOptions, Entry, EntryKind, ReadMode};

const UNISENS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<unisens xmlns="http://www.unisens.org/unisens2.0" version="2.0" measurementId="demo">
  <customAttributes>
    <customAttribute key="gender" value="m"/>
  </customAttributes>
  <signalEntry id="ecg.bin" dataType="int16" lsbValue="0.25" sampleRate="256" unit="mV">
    <binFileFormat endianess="LITTLE"/>
    <channel name="I"/>
  </signalEntry>
  <eventEntry id="marker.csv" typeLength="1" sampleRate="256">
    <csvFileFormat separator=";" decimalSeparator="."/>
  </eventEntry>
</unisens>
"#;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    match env::args().nth(1) {
        Some(path) => read_recording(Path::new(&path))?,
        None => run_mock()?,
    }
    Ok(())
}

/// Write a small recording to a temporary folder, extend it and decode it.
fn run_mock() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("unisens.xml"), UNISENS_XML)?;
    let samples: Vec<u8> = [400i16, -120, 33].iter().flat_map(|s| s.to_le_bytes()).collect();
    fs::write(dir.path().join("ecg.bin"), samples)?;
    fs::write(dir.path().join("marker.csv"), "0.5;N\n1.5;V\n")?;
    fs::write(dir.path().join("hr.csv"), "0;61,5\n1;63,0\n")?;

    let mut values = Entry::with_id(EntryKind::Values, dir.path(), "hr.csv")?;
    values.set("dataType", "double");
    values.assign("sampleRate", 1.0);
    values.set_csv_file_format(&CsvFileFormat::new(";").with_decimal_separator(","));
    println!("{}", values.to_xml()?);

    let frame = values.get_data(&DecodeOptions::default().with_mode(ReadMode::Frame))?;
    if let Some(frame) = frame.as_frame() {
        println!("{values}: {} rows, index {:?}", frame.len(), frame.index);
    }

    read_recording(dir.path())
}

fn read_recording(path: &Path) -> Result<(), Box<dyn Error>> {
    let (folder, xml_path) = if path.is_dir() {
        (path.to_path_buf(), path.join("unisens.xml"))
    } else {
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        (folder, path.to_path_buf())
    };
    let root = xml::parse_file(&xml_path)?;
    info!(path = %xml_path.display(), children = root.children.len(), "parsed metadata");

    for element in root.children {
        if xml::strip(&element.tag) == "customAttributes" {
            let mut custom = CustomAttributes::from_element(&element)?;
            custom.set("viewed", "true")?;
            println!("{custom}");
            continue;
        }
        let entry = Entry::adopt(EntryKind::from_tag(&element.tag), PathBuf::from(&folder), element);
        if !matches!(
            entry.kind(),
            EntryKind::Signal | EntryKind::Values | EntryKind::Event
        ) {
            println!("{entry}");
            continue;
        }
        let mut options = DecodeOptions::default();
        if let Some(order) = entry.declared_endianness() {
            options = options.with_byte_order(order?);
        }
        match entry.get_data(&options)? {
            EntryData::Samples(samples) => {
                println!("{entry}: {} samples {:?}", samples.len(), samples.to_f64())
            }
            EntryData::Events(events) => {
                for event in &events {
                    println!("{entry}: t={} {}", event.time, event.fields.join(";"));
                }
            }
            other => println!("{entry}: {other:?}"),
        }
    }
    Ok(())
}
