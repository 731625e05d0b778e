use crate::error::{PipelineError, Result};
use crate::structs::{JsonSource, Record};
use chrono::{SecondsFormat, Utc};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::Path;

/// Reads filter input rows, dispatching on the file extension.
///
/// `.json` (any case) is parsed as JSON, everything else as CSV with a header line.
///
/// # Returns
/// The rows in file order together with the field names in their original order.
///
/// # Errors
/// Returns `PipelineError::NotFound` if `input_path` does not exist, or a CSV/JSON
/// error if the file cannot be parsed.
pub fn read_rows(input_path: &Path) -> Result<(Vec<Record>, Vec<String>)> {
    if !input_path.exists() {
        return Err(PipelineError::NotFound(input_path.to_path_buf()));
    }

    let is_json = input_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        read_json_rows(input_path)
    } else {
        read_csv_rows(input_path)
    }
}

/// Reads a CSV file whose first line names the columns.
///
/// Short rows leave their trailing columns unset; cells beyond the header are dropped.
pub fn read_csv_rows(input_path: &Path) -> Result<(Vec<Record>, Vec<String>)> {
    debug!("Reading CSV file: {}", input_path.display());
    let mut reader = ReaderBuilder::new().flexible(true).from_path(input_path)?;
    let field_names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Record = field_names
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }

    debug!("Read {} CSV rows with {} columns", rows.len(), field_names.len());
    Ok((rows, field_names))
}

/// Reads a JSON file holding either a bare list of objects or `{"records": [...]}`.
pub fn read_json_rows(input_path: &Path) -> Result<(Vec<Record>, Vec<String>)> {
    debug!("Reading JSON file: {}", input_path.display());
    let file = File::open(input_path)?;
    let source: JsonSource = serde_json::from_reader(BufReader::new(file))?;
    let (rows, field_names) = source.into_rows();
    debug!("Read {} JSON records", rows.len());
    Ok((rows, field_names))
}

/// Writes rows as CSV with a header matching `field_names`.
///
/// Parent directories are created and any existing file is overwritten. Fields
/// missing from a row are written empty. Records end in `\r\n`.
///
/// # Errors
/// Returns error if the directory or file cannot be created or written to.
pub fn write_rows(output_path: &Path, field_names: &[String], rows: &[Record]) -> Result<()> {
    ensure_parent(output_path)?;
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_path(output_path)?;

    if !field_names.is_empty() {
        writer.write_record(field_names)?;
        for row in rows {
            writer.write_record(
                field_names
                    .iter()
                    .map(|name| row.get(name).map(String::as_str).unwrap_or("")),
            )?;
        }
    }

    writer.flush()?;
    debug!("Wrote {} rows to {}", rows.len(), output_path.display());
    Ok(())
}

/// Appends `<UTC timestamp> | <message>` to the run log, never truncating it.
pub fn append_log(log_path: &Path, message: &str) -> Result<()> {
    ensure_parent(log_path)?;
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(file, "{} | {}", timestamp, message)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
