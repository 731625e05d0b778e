use crate::error::{PipelineError, Result};
use crate::load::{append_log, read_rows, write_rows};
use crate::structs::{FilterConfig, FilterSummary, Record};
use log::{debug, error};

/// Runs one threshold filter from input file to output CSV.
///
/// Reads `config.input`, keeps rows whose `config.column` value is at least
/// `config.threshold`, writes them to `config.output` and appends a summary line
/// to `config.log`.
///
/// # Returns
///
/// Returns the number of rows read and written.
///
/// # Errors
///
/// Returns `PipelineError::NotFound` when the input file is absent. In that case
/// the error is recorded in the run log first and the output file is not touched.
/// Any other I/O or parse failure is returned as-is.
pub fn filter_file(config: &FilterConfig) -> Result<FilterSummary> {
    let (rows, field_names) = match read_rows(&config.input) {
        Ok(loaded) => loaded,
        Err(PipelineError::NotFound(path)) => {
            let message = format!("ERROR input file not found: {}", path.display());
            println!("{}", message);
            error!("{}", message);
            append_log(&config.log, &message)?;
            return Err(PipelineError::NotFound(path));
        }
        Err(e) => return Err(e),
    };

    let kept = filter_rows(&rows, &config.column, config.threshold);
    write_rows(&config.output, &field_names, &kept)?;

    let summary = FilterSummary {
        read: rows.len(),
        wrote: kept.len(),
    };
    let message = format!(
        "read={} wrote={} threshold={:?} column={} input={} output={}",
        summary.read,
        summary.wrote,
        config.threshold,
        config.column,
        config.input.display(),
        config.output.display()
    );
    append_log(&config.log, &message)?;
    debug!("{}", message);

    println!(
        "Read {} rows; wrote {} rows to {}",
        summary.read,
        summary.wrote,
        config.output.display()
    );
    Ok(summary)
}

/// Keeps rows whose `column` parses as a number greater than or equal to `threshold`.
///
/// Rows where the column is missing or not numeric are dropped without error.
/// Kept rows stay in their original order.
pub fn filter_rows(rows: &[Record], column: &str, threshold: f64) -> Vec<Record> {
    let kept: Vec<Record> = rows
        .iter()
        .filter(|row| {
            row.get(column)
                .and_then(|raw| parse_value(raw))
                .is_some_and(|value| value >= threshold)
        })
        .cloned()
        .collect();

    debug!(
        "Kept {} of {} rows where {} >= {}",
        kept.len(),
        rows.len(),
        column,
        threshold
    );
    kept
}

/// Parses a cell as `f64`, ignoring surrounding whitespace.
///
/// Returns `None` for anything that is not a number.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}
