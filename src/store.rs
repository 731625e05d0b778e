use crate::error::Result;
use crate::structs::{
    JoinedObservation, Observation, ObservationUpdate, QueryPlanStep, Station, StationUpdate,
};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;

pub const DEFAULT_DB_PATH: &str = "data/stations.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS stations (
        station_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        state TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS observations (
        obs_id INTEGER PRIMARY KEY AUTOINCREMENT,
        station_id TEXT NOT NULL,
        date TEXT NOT NULL,
        temp_c REAL NOT NULL,
        FOREIGN KEY (station_id) REFERENCES stations(station_id)
    );
    CREATE INDEX IF NOT EXISTS idx_observations_station_id ON observations(station_id);
";

const JOIN_QUERY: &str = "
    SELECT s.station_id, s.name, o.date, o.temp_c
    FROM stations s
    JOIN observations o ON s.station_id = o.station_id
    ORDER BY o.date, o.obs_id
";

const SEED_STATIONS: [(&str, &str, &str); 3] = [
    ("AMA001", "Amarillo North", "TX"),
    ("AMA002", "Amarillo South", "TX"),
    ("DEN001", "Denver Central", "CO"),
];

const SEED_OBSERVATIONS: [(&str, &str, f64); 4] = [
    ("AMA001", "2026-01-20", 2.1),
    ("AMA001", "2026-01-21", 4.0),
    ("AMA002", "2026-01-21", -1.2),
    ("DEN001", "2026-01-21", 7.3),
];

/// Weather stations and their observations in a single SQLite file.
///
/// Every public operation commits before returning. The observation to station
/// reference is declared in the schema but not enforced, so deleting a station
/// leaves its observations in place.
pub struct StationStore {
    conn: Connection,
}

impl StationStore {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!("Opening station store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        Ok(Self { conn })
    }

    /// Defines both tables and the station index. Safe to call repeatedly.
    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        debug!("Station schema ready");
        Ok(())
    }

    /// Inserts the sample stations, skipping ids that already exist.
    ///
    /// Returns the number of stations actually inserted.
    pub fn seed_stations(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO stations (station_id, name, state) VALUES (?1, ?2, ?3)",
            )?;
            for (station_id, name, state) in SEED_STATIONS {
                inserted += stmt.execute(params![station_id, name, state])?;
            }
        }
        tx.commit()?;
        debug!("Seeded {} stations", inserted);
        Ok(inserted)
    }

    /// Inserts the sample observations. There is no duplicate guard: each call
    /// adds another copy of every sample row.
    pub fn seed_observations(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO observations (station_id, date, temp_c) VALUES (?1, ?2, ?3)",
            )?;
            for (station_id, date, temp_c) in SEED_OBSERVATIONS {
                inserted += stmt.execute(params![station_id, date, temp_c])?;
            }
        }
        tx.commit()?;
        debug!("Seeded {} observations", inserted);
        Ok(inserted)
    }

    /// Stations joined with their observations, earliest date first.
    pub fn joined_observations(&self) -> Result<Vec<JoinedObservation>> {
        let mut stmt = self.conn.prepare(JOIN_QUERY)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JoinedObservation {
                    station_id: row.get(0)?,
                    name: row.get(1)?,
                    date: row.get(2)?,
                    temp_c: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn station(&self, station_id: &str) -> Result<Option<Station>> {
        let station = self
            .conn
            .query_row(
                "SELECT station_id, name, state FROM stations WHERE station_id = ?1",
                params![station_id],
                station_from_row,
            )
            .optional()?;
        Ok(station)
    }

    pub fn stations(&self) -> Result<Vec<Station>> {
        let mut stmt = self
            .conn
            .prepare("SELECT station_id, name, state FROM stations ORDER BY station_id")?;
        let stations = stmt
            .query_map([], station_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stations)
    }

    pub fn observation(&self, obs_id: i64) -> Result<Option<Observation>> {
        let observation = self
            .conn
            .query_row(
                "SELECT obs_id, station_id, date, temp_c FROM observations WHERE obs_id = ?1",
                params![obs_id],
                observation_from_row,
            )
            .optional()?;
        Ok(observation)
    }

    /// Observations referencing `station_id`, whether or not the station still exists.
    pub fn observations_for_station(&self, station_id: &str) -> Result<Vec<Observation>> {
        let mut stmt = self.conn.prepare(
            "SELECT obs_id, station_id, date, temp_c FROM observations
             WHERE station_id = ?1 ORDER BY obs_id",
        )?;
        let observations = stmt
            .query_map(params![station_id], observation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(observations)
    }

    /// Applies the supplied fields of `update` to one station.
    ///
    /// Returns the number of matching rows; 0 means the id does not exist or
    /// the update carried no fields.
    pub fn update_station(&self, station_id: &str, update: &StationUpdate) -> Result<usize> {
        if update.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.unchecked_transaction()?;
        let mut affected = 0;
        if let Some(name) = &update.name {
            affected = affected.max(tx.execute(
                "UPDATE stations SET name = ?1 WHERE station_id = ?2",
                params![name, station_id],
            )?);
        }
        if let Some(state) = &update.state {
            affected = affected.max(tx.execute(
                "UPDATE stations SET state = ?1 WHERE station_id = ?2",
                params![state, station_id],
            )?);
        }
        tx.commit()?;
        debug!("Updated station {} ({} rows)", station_id, affected);
        Ok(affected)
    }

    /// Removes a station row. Its observations are left untouched.
    pub fn delete_station(&self, station_id: &str) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM stations WHERE station_id = ?1",
            params![station_id],
        )?;
        debug!("Deleted station {} ({} rows)", station_id, affected);
        Ok(affected)
    }

    /// Applies the supplied fields of `update` to one observation.
    pub fn update_observation(&self, obs_id: i64, update: &ObservationUpdate) -> Result<usize> {
        if update.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.unchecked_transaction()?;
        let mut affected = 0;
        if let Some(temp_c) = update.temp_c {
            affected = affected.max(tx.execute(
                "UPDATE observations SET temp_c = ?1 WHERE obs_id = ?2",
                params![temp_c, obs_id],
            )?);
        }
        if let Some(date) = &update.date {
            affected = affected.max(tx.execute(
                "UPDATE observations SET date = ?1 WHERE obs_id = ?2",
                params![date, obs_id],
            )?);
        }
        tx.commit()?;
        debug!("Updated observation {} ({} rows)", obs_id, affected);
        Ok(affected)
    }

    pub fn delete_observation(&self, obs_id: i64) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM observations WHERE obs_id = ?1", params![obs_id])?;
        debug!("Deleted observation {} ({} rows)", obs_id, affected);
        Ok(affected)
    }

    /// SQLite's `EXPLAIN QUERY PLAN` for the join used by `joined_observations`.
    pub fn explain_join_plan(&self) -> Result<Vec<QueryPlanStep>> {
        let mut stmt = self
            .conn
            .prepare(&format!("EXPLAIN QUERY PLAN {}", JOIN_QUERY))?;
        let steps = stmt
            .query_map([], |row| {
                Ok(QueryPlanStep {
                    id: row.get(0)?,
                    parent: row.get(1)?,
                    detail: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(steps)
    }
}

fn station_from_row(row: &Row<'_>) -> rusqlite::Result<Station> {
    Ok(Station {
        station_id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
    })
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<Observation> {
    Ok(Observation {
        obs_id: row.get(0)?,
        station_id: row.get(1)?,
        date: row.get(2)?,
        temp_c: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> Result<StationStore> {
        let store = StationStore::open_in_memory()?;
        store.create_schema()?;
        store.seed_stations()?;
        store.seed_observations()?;
        Ok(store)
    }

    #[test]
    fn test_create_schema_is_idempotent() -> Result<()> {
        let store = StationStore::open_in_memory()?;
        store.create_schema()?;
        store.create_schema()?;
        assert!(store.stations()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_joined_observations_ordered_by_date() -> Result<()> {
        let store = seeded()?;
        let joined = store.joined_observations()?;

        assert_eq!(joined.len(), 4);
        assert_eq!(joined[0].date, "2026-01-20");
        assert_eq!(joined[0].station_id, "AMA001");
        assert_eq!(joined[0].name, "Amarillo North");
        assert!(joined.windows(2).all(|w| w[0].date <= w[1].date));
        Ok(())
    }

    #[test]
    fn test_station_seed_ignores_conflicts_observation_seed_duplicates() -> Result<()> {
        let store = seeded()?;

        assert_eq!(store.seed_stations()?, 0);
        assert_eq!(store.stations()?.len(), 3);

        assert_eq!(store.seed_observations()?, 4);
        assert_eq!(store.joined_observations()?.len(), 8);
        Ok(())
    }

    #[test]
    fn test_update_station_partial() -> Result<()> {
        let store = seeded()?;

        let affected =
            store.update_station("AMA001", &StationUpdate::default().name("Amarillo Updated"))?;
        assert_eq!(affected, 1);

        let station = store.station("AMA001")?.unwrap();
        assert_eq!(
            station,
            Station {
                station_id: "AMA001".to_string(),
                name: "Amarillo Updated".to_string(),
                state: "TX".to_string(),
            }
        );

        store.update_station("AMA001", &StationUpdate::default().state("NM"))?;
        let station = store.station("AMA001")?.unwrap();
        assert_eq!(station.name, "Amarillo Updated");
        assert_eq!(station.state, "NM");
        Ok(())
    }

    #[test]
    fn test_missing_keys_are_no_ops() -> Result<()> {
        let store = seeded()?;

        assert_eq!(
            store.update_station("NOPE01", &StationUpdate::default().name("x"))?,
            0
        );
        assert_eq!(store.update_station("AMA001", &StationUpdate::default())?, 0);
        assert_eq!(store.delete_station("NOPE01")?, 0);
        assert_eq!(
            store.update_observation(999, &ObservationUpdate::default().temp_c(1.0))?,
            0
        );
        assert_eq!(store.delete_observation(999)?, 0);
        assert_eq!(store.stations()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_delete_station_does_not_cascade() -> Result<()> {
        let store = seeded()?;

        assert_eq!(store.delete_station("DEN001")?, 1);
        assert!(store.station("DEN001")?.is_none());

        let orphans = store.observations_for_station("DEN001")?;
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].temp_c, 7.3);
        assert!(store.observation(orphans[0].obs_id)?.is_some());

        let joined = store.joined_observations()?;
        assert_eq!(joined.len(), 3);
        assert!(joined.iter().all(|j| j.station_id != "DEN001"));
        Ok(())
    }

    #[test]
    fn test_update_and_delete_observation() -> Result<()> {
        let store = seeded()?;
        let first = store.observations_for_station("AMA002")?.remove(0);

        let update = ObservationUpdate::default().temp_c(-3.5).date("2026-01-22");
        assert_eq!(store.update_observation(first.obs_id, &update)?, 1);

        let updated = store.observation(first.obs_id)?.unwrap();
        assert_eq!(updated.temp_c, -3.5);
        assert_eq!(updated.date, "2026-01-22");
        assert_eq!(updated.station_id, "AMA002");

        assert_eq!(store.delete_observation(first.obs_id)?, 1);
        assert!(store.observation(first.obs_id)?.is_none());
        Ok(())
    }

    #[test]
    fn test_observation_ids_increase() -> Result<()> {
        let store = seeded()?;
        let ids: Vec<i64> = ["AMA001", "AMA002", "DEN001"]
            .iter()
            .map(|id| store.observations_for_station(id))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .map(|o| o.obs_id)
            .collect();

        assert_eq!(ids, vec![1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_explain_join_plan() -> Result<()> {
        let store = seeded()?;
        let plan = store.explain_join_plan()?;

        assert!(!plan.is_empty());
        assert!(
            plan.iter()
                .any(|step| step.detail.contains("SCAN") || step.detail.contains("SEARCH"))
        );
        Ok(())
    }
}
