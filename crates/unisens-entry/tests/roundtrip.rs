use std::fs;

use unisens_entry::{
    CustomAttributes, DecodeOptions, Entry, EntryData, EntryKind, FieldValue, ReadMode,
    SampleArray,
};
use unisens_xml::{parse, strip};

const UNISENS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<unisens xmlns="http://www.unisens.org/unisens2.0" version="2.0" measurementId="demo" timestampStart="2020-01-06T21:15:53">
  <customAttributes>
    <customAttribute key="gender" value="f"/>
    <customAttribute key="age" value="34"/>
  </customAttributes>
  <signalEntry id="ecg.bin" dataType="int16" lsbValue="0.5" sampleRate="256" unit="mV" contentClass="ECG">
    <binFileFormat endianess="LITTLE"/>
    <channel name="I"/>
  </signalEntry>
  <valuesEntry id="hr.csv" dataType="double" sampleRate="1">
    <csvFileFormat separator=";" decimalSeparator="."/>
    <channel name="hr"/>
  </valuesEntry>
  <eventEntry id="marker.csv" typeLength="1" sampleRate="256">
    <csvFileFormat separator=";" decimalSeparator="."/>
  </eventEntry>
  <group id="vitals" comment="derived">
    <groupEntry ref="hr.csv"/>
  </group>
</unisens>
"#;

fn write_recording() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("unisens.xml"), UNISENS_XML).expect("write xml");
    let samples: Vec<u8> = [10i16, -4, 7].iter().flat_map(|s| s.to_le_bytes()).collect();
    fs::write(dir.path().join("ecg.bin"), samples).expect("write ecg");
    fs::write(dir.path().join("hr.csv"), "0;61\n1;63\n").expect("write hr");
    fs::write(dir.path().join("marker.csv"), "0.5;N\n1.25;V;artifact\n").expect("write markers");
    dir
}

fn load(dir: &tempfile::TempDir) -> (Vec<Entry>, CustomAttributes) {
    let root = unisens_xml::parse_file(dir.path().join("unisens.xml")).expect("parse recording");
    let mut entries = Vec::new();
    let mut custom = CustomAttributes::new();
    for element in root.children {
        if strip(&element.tag) == "customAttributes" {
            custom = CustomAttributes::from_element(&element).expect("custom attributes");
            continue;
        }
        let kind = EntryKind::from_tag(&element.tag);
        entries.push(Entry::adopt(kind, dir.path(), element));
    }
    (entries, custom)
}

#[test]
fn decode_every_kind_of_a_recording() {
    let dir = write_recording();
    let (entries, custom) = load(&dir);
    let kinds: Vec<EntryKind> = entries.iter().map(Entry::kind).collect();
    assert_eq!(
        kinds,
        [
            EntryKind::Signal,
            EntryKind::Values,
            EntryKind::Event,
            EntryKind::Group
        ]
    );

    let signal = &entries[0];
    assert_eq!(signal.sample_rate(), Some(256.0));
    assert_eq!(signal.field("lsbValue"), Some(&FieldValue::Float(0.5)));
    let raw = signal.get_data(&DecodeOptions::raw()).expect("raw signal");
    assert_eq!(raw, EntryData::Samples(SampleArray::Int16(vec![10, -4, 7])));
    let scaled = signal.get_data(&DecodeOptions::default()).expect("scaled signal");
    assert_eq!(scaled, EntryData::Samples(SampleArray::Int16(vec![5, -2, 3])));

    let values = &entries[1];
    let frame = values
        .get_data(&DecodeOptions::default().with_mode(ReadMode::Frame))
        .expect("values frame");
    let frame = frame.as_frame().expect("frame");
    assert_eq!(frame.len(), 2);
    assert_eq!(frame.rows[1][0].as_f64(), Some(63.0));

    let events = entries[2].get_data(&DecodeOptions::default()).expect("events");
    let events = events.as_events().expect("event rows");
    assert_eq!(events[1].time, 1.25);
    assert_eq!(events[1].fields, ["V", "artifact"]);

    assert!(entries[3].get_data(&DecodeOptions::default()).is_err());
    assert_eq!(custom.get("age"), Some("34"));
    assert_eq!(custom.keys().collect::<Vec<_>>(), ["gender", "age"]);
}

#[test]
fn readopting_serialized_entries_preserves_shape() {
    let dir = write_recording();
    let (entries, custom) = load(&dir);
    for entry in &entries {
        let xml = entry.to_xml().expect("serialize");
        let again = Entry::adopt(entry.kind(), dir.path(), parse(&xml).expect("reparse"));
        assert_eq!(again.tag(), entry.tag());
        assert_eq!(again.attrib(), entry.attrib());
        let tags = |e: &Entry| e.children().iter().map(|c| c.tag().to_string()).collect::<Vec<_>>();
        assert_eq!(tags(&again), tags(entry));
    }

    let xml = custom.to_xml().expect("serialize custom attributes");
    let again = CustomAttributes::from_element(&parse(&xml).expect("reparse")).expect("readopt");
    assert_eq!(again.iter().collect::<Vec<_>>(), custom.iter().collect::<Vec<_>>());
}

#[test]
fn built_entry_survives_roundtrip() {
    let dir = write_recording();
    let mut entry = Entry::with_id(EntryKind::Signal, dir.path(), "ecg.bin").expect("fresh");
    entry.set("dataType", "int16");
    entry.assign("lsbValue", 2.0);
    entry.assign("adcResolution", 16i64);
    let again = Entry::adopt(
        EntryKind::Signal,
        dir.path(),
        parse(&entry.to_xml().expect("serialize")).expect("reparse"),
    );
    assert_eq!(again.attrib(), entry.attrib());
    assert_eq!(again.adc_resolution(), Some(16));
    let data = again.get_data(&DecodeOptions::default()).expect("decode");
    assert_eq!(data.as_samples(), Some(&SampleArray::Int16(vec![20, -8, 14])));
}
