pub mod error;
pub mod load;
pub mod store;
pub mod structs;
pub mod transform;

// Re-export public API
pub use error::{PipelineError, Result};
pub use load::{append_log, read_csv_rows, read_json_rows, read_rows, write_rows};
pub use store::{DEFAULT_DB_PATH, StationStore};
pub use structs::{
    DEFAULT_COLUMN, DEFAULT_LOG_PATH, FilterConfig, FilterSummary, JoinedObservation, JsonSource,
    Observation, ObservationUpdate, QueryPlanStep, Record, SimpleLogger, Station, StationUpdate,
};
pub use transform::{filter_file, filter_rows, parse_value};
