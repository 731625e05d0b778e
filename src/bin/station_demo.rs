use std::env;
use std::path::PathBuf;
use weather::{DEFAULT_DB_PATH, PipelineError, SimpleLogger, StationStore, StationUpdate};

static LOGGER: SimpleLogger = SimpleLogger;

/// Seeds the station store, then walks through join, update and delete.
///
/// Takes an optional database path as its only argument.
fn main() -> Result<(), PipelineError> {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }

    let db_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

    let store = StationStore::open(&db_path)?;
    store.create_schema()?;
    store.seed_stations()?;
    store.seed_observations()?;

    println!("JOIN:");
    for row in store.joined_observations()? {
        println!("  {}", serde_json::to_string(&row)?);
    }

    store.update_station("AMA001", &StationUpdate::default().name("Amarillo Updated"))?;
    println!("UPDATED: {:?}", store.station("AMA001")?);

    store.delete_station("DEN001")?;
    println!("DELETED: {:?}", store.station("DEN001")?);
    println!(
        "ORPHANED OBSERVATIONS: {}",
        store.observations_for_station("DEN001")?.len()
    );

    println!("PLAN:");
    for step in store.explain_join_plan()? {
        println!("  {}", step);
    }
    Ok(())
}
