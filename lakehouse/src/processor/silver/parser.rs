use crate::schema::raw_registrations_schema;
use arrow::array::{ArrayRef, StringBuilder};
use arrow::record_batch::RecordBatch;
use common::config::FieldSpec;
use common::{Error, Result};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, warn};
use zip::ZipArchive;

// Declared entry sizes are untrusted; preallocation is capped.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

fn size_hint(declared_size: u64) -> usize {
    declared_size.min(MAX_PREALLOCATION) as usize
}

/// Reads the text table inside a monthly archive.
///
/// Only the first entry is parsed. Archives are expected to hold exactly one
/// file; extra entries are reported and ignored.
pub fn read_archive_text(archive_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| Error::MalformedArchive(format!("cannot open zip: {}", e)))?;

    if archive.is_empty() {
        return Err(Error::MalformedArchive("archive has no entries".to_string()));
    }
    if archive.len() > 1 {
        let ignored: Vec<String> = archive.file_names().skip(1).map(String::from).collect();
        warn!(entries = archive.len(), ?ignored, "Archive has several entries, only the first is parsed");
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| Error::MalformedArchive(format!("cannot read first entry: {}", e)))?;
    if entry.is_dir() {
        return Err(Error::MalformedArchive(format!(
            "first entry '{}' is a directory",
            entry.name()
        )));
    }

    let mut text = Vec::with_capacity(size_hint(entry.size()));
    entry
        .read_to_end(&mut text)
        .map_err(|e| Error::MalformedArchive(format!("cannot read '{}': {}", entry.name(), e)))?;

    debug!(entry = entry.name(), bytes = text.len(), "Extracted archive entry");
    Ok(text)
}

/// ISO-8859-1: every byte is the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Byte slice of `line` covered by `spec`, truncated when the line is short.
fn slice_field<'a>(line: &'a [u8], spec: &FieldSpec) -> &'a [u8] {
    let end = spec.end.min(line.len());
    let start = spec.start.min(end);
    &line[start..end]
}

/// Slices fixed-width lines into one text column per field spec.
///
/// The first line is a header and is skipped, as are blank lines.
pub fn parse_fixed_width(text: &[u8], specs: &[FieldSpec]) -> Result<RecordBatch> {
    if specs.is_empty() {
        return Err(Error::InvalidInput("no field specs configured".to_string()));
    }
    if let Some(bad) = specs.iter().find(|spec| spec.start > spec.end) {
        return Err(Error::InvalidInput(format!(
            "field '{}' has inverted range {}..{}",
            bad.name, bad.start, bad.end
        )));
    }

    let mut builders: Vec<StringBuilder> = specs.iter().map(|_| StringBuilder::new()).collect();

    let lines = text
        .split(|&b| b == b'\n')
        .skip(1)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace));

    let mut rows = 0usize;
    for line in lines {
        for (spec, builder) in specs.iter().zip(builders.iter_mut()) {
            let value = decode_latin1(slice_field(line, spec));
            builder.append_value(value.trim());
        }
        rows += 1;
    }

    let names: Vec<String> = specs.iter().map(|spec| spec.name.clone()).collect();
    let columns: Vec<ArrayRef> = builders
        .into_iter()
        .map(|mut builder| Arc::new(builder.finish()) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(Arc::new(raw_registrations_schema(&names)), columns)?;
    debug!(rows, columns = specs.len(), "Parsed fixed-width table");
    Ok(batch)
}

/// Archive bytes to a raw text table.
pub fn parse_archive(archive_bytes: &[u8], specs: &[FieldSpec]) -> Result<RecordBatch> {
    let text = read_archive_text(archive_bytes)?;
    parse_fixed_width(&text, specs)
}
