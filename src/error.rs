use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite Error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl PipelineError {
    /// Process exit status for this error at the CLI boundary.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::NotFound(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
