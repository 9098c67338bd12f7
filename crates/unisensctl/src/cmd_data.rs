use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use unisens_entry::{DecodeOptions, Endianness, ReadMode};

use crate::common;

#[derive(Debug, Clone)]
pub struct DataArgs {
    pub id: String,
    pub mode: String,
    pub raw: bool,
    pub big_endian: bool,
}

pub fn run(path: &Path, args: DataArgs) -> Result<()> {
    let recording = common::load_recording(path)?;
    let entry = recording.entry(&args.id)?;

    let mode: ReadMode = args.mode.parse()?;
    let byte_order = if args.big_endian {
        Endianness::Big
    } else {
        entry
            .declared_endianness()
            .transpose()
            .context("read binFileFormat")?
            .unwrap_or_default()
    };
    debug!(?mode, ?byte_order, raw = args.raw, "decode options");
    let options = DecodeOptions::default()
        .with_mode(mode)
        .with_byte_order(byte_order)
        .with_scaled(!args.raw);

    let data = entry
        .get_data(&options)
        .with_context(|| format!("decode {entry}"))?;
    info!(id = %args.id, "decoded payload");
    common::print_json(&data)
}
