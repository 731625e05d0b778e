use log::{Level, Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_COLUMN: &str = "temp_c";
pub const DEFAULT_LOG_PATH: &str = "logs/weather_filter.log";

/// Simple logger implementation; warnings and errors go to stderr
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("[{}] {}", record.level(), record.args()),
            _ => println!("[{}] {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// One input row: column name to raw string value
pub type Record = HashMap<String, String>;

/// The two JSON layouts accepted as filter input.
///
/// Either a bare array of objects, or an object carrying a `records` array.
/// An object without `records` holds no rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JsonSource {
    Bare(Vec<Map<String, Value>>),
    Wrapped {
        #[serde(default)]
        records: Vec<Map<String, Value>>,
    },
}

impl JsonSource {
    /// Resolves either layout into rows plus the field names of the first object.
    pub fn into_rows(self) -> (Vec<Record>, Vec<String>) {
        let objects = match self {
            JsonSource::Bare(objects) => objects,
            JsonSource::Wrapped { records } => records,
        };

        let field_names: Vec<String> = objects
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        let rows: Vec<Record> = objects
            .into_iter()
            .map(|object| {
                object
                    .into_iter()
                    .map(|(key, value)| (key, value_to_string(value)))
                    .collect()
            })
            .collect();

        (rows, field_names)
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
        other => other.to_string(),
    }
}

/// Configuration for a single filter run
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub threshold: f64,
    pub column: String,
    pub log: PathBuf,
}

impl FilterConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, threshold: f64) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            threshold,
            column: DEFAULT_COLUMN.to_string(),
            log: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// Counts reported after a successful filter run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub read: usize,
    pub wrote: usize,
}

/// A fixed weather-reporting location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    pub name: String,
    pub state: String,
}

/// One dated temperature reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub obs_id: i64,
    pub station_id: String,
    pub date: String,
    pub temp_c: f64,
}

/// Row of the station/observation join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedObservation {
    pub station_id: String,
    pub name: String,
    pub date: String,
    pub temp_c: f64,
}

/// Fields to change on a station; `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationUpdate {
    pub name: Option<String>,
    pub state: Option<String>,
}

impl StationUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.state.is_none()
    }
}

/// Fields to change on an observation; `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationUpdate {
    pub temp_c: Option<f64>,
    pub date: Option<String>,
}

impl ObservationUpdate {
    pub fn temp_c(mut self, temp_c: f64) -> Self {
        self.temp_c = Some(temp_c);
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.temp_c.is_none() && self.date.is_none()
    }
}

/// One line of SQLite's `EXPLAIN QUERY PLAN` output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlanStep {
    pub id: i64,
    pub parent: i64,
    pub detail: String,
}

impl fmt::Display for QueryPlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.parent, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_json_array() {
        let source: JsonSource =
            serde_json::from_str(r#"[{"station": "AMA001", "temp_c": 2.1}, {"station": "X", "temp_c": null}]"#)
                .unwrap();
        let (rows, fields) = source.into_rows();

        assert_eq!(fields, vec!["station".to_string(), "temp_c".to_string()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["temp_c"], "2.1");
        assert_eq!(rows[1]["temp_c"], "");
    }

    #[test]
    fn test_json_booleans_become_numeric() {
        let source: JsonSource =
            serde_json::from_str(r#"[{"temp_c": true}, {"temp_c": false}, {"temp_c": 1}]"#).unwrap();
        let (rows, _) = source.into_rows();

        let temps: Vec<&str> = rows.iter().map(|r| r["temp_c"].as_str()).collect();
        assert_eq!(temps, vec!["1", "0", "1"]);
    }

    #[test]
    fn test_wrapped_json_records() {
        let source: JsonSource =
            serde_json::from_str(r#"{"meta": 1, "records": [{"temp_c": "4.0", "date": "2026-01-21"}]}"#)
                .unwrap();
        let (rows, fields) = source.into_rows();

        assert_eq!(fields, vec!["temp_c".to_string(), "date".to_string()]);
        assert_eq!(rows[0]["temp_c"], "4.0");
    }

    #[test]
    fn test_object_without_records_is_empty() {
        let source: JsonSource = serde_json::from_str(r#"{"meta": "nothing here"}"#).unwrap();
        let (rows, fields) = source.into_rows();

        assert!(rows.is_empty());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_update_descriptors() {
        let update = StationUpdate::default().name("Amarillo Updated");
        assert_eq!(update.name.as_deref(), Some("Amarillo Updated"));
        assert!(update.state.is_none());
        assert!(!update.is_empty());
        assert!(ObservationUpdate::default().is_empty());
    }
}
