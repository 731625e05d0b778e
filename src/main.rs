use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use weather::{DEFAULT_COLUMN, DEFAULT_LOG_PATH, FilterConfig, PipelineError, SimpleLogger, filter_file};

static LOGGER: SimpleLogger = SimpleLogger;

/// Filter weather station data by temperature threshold and write results to a new CSV.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to input CSV or JSON file
    #[arg(long)]
    input: PathBuf,

    /// Path to output CSV file
    #[arg(long)]
    output: PathBuf,

    /// Temperature threshold (C); rows below it are dropped
    #[arg(long, allow_negative_numbers = true)]
    threshold: f64,

    /// Column to filter on
    #[arg(long, default_value = DEFAULT_COLUMN)]
    column: String,

    /// Log file path
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    log: PathBuf,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<ExitCode, PipelineError> {
    let start = Instant::now();
    if log::set_logger(&LOGGER).is_err() {
        eprintln!("logger already initialised");
    }

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    log::debug!(
        "Input: {} | Output: {} | Column: {} >= {}",
        args.input.display(),
        args.output.display(),
        args.column,
        args.threshold
    );

    let config = FilterConfig {
        input: args.input,
        output: args.output,
        threshold: args.threshold,
        column: args.column,
        log: args.log,
    };

    match filter_file(&config) {
        Ok(summary) => {
            log::debug!(
                "Filtered {} -> {} rows in {:.2?}",
                summary.read,
                summary.wrote,
                start.elapsed()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ PipelineError::NotFound(_)) => Ok(ExitCode::from(e.exit_code())),
        Err(e) => Err(e),
    }
}
