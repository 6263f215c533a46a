use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::classification::domain::direction::Direction;
use crate::incident::domain::incident::Incident;
use crate::incident::domain::incident_log::IncidentLog;
use crate::shared::constants::INCIDENT_TIMESTAMP_FORMAT;

#[derive(Debug, Error)]
pub enum IncidentLogError {
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("row {id}: bad timestamp '{value}'")]
    Timestamp { id: i64, value: String },
    #[error("row {id}: {message}")]
    Direction { id: i64, message: String },
    #[error("incident log lock poisoned")]
    Poisoned,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS incidents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    subject_id INTEGER NOT NULL,
    violation_type TEXT NOT NULL,
    snapshot_path TEXT NOT NULL
)";

/// Append-only incident log in a single SQLite table.
pub struct SqliteIncidentLog {
    conn: Connection,
}

impl SqliteIncidentLog {
    pub fn open(path: &Path) -> Result<Self, IncidentLogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, IncidentLogError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, IncidentLogError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Reads every logged incident in insertion order.
    pub fn all(&self) -> Result<Vec<Incident>, IncidentLogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, subject_id, violation_type, snapshot_path
             FROM incidents ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, timestamp, subject_id, violation_type, snapshot_ref)| {
                let timestamp = NaiveDateTime::parse_from_str(&timestamp, INCIDENT_TIMESTAMP_FORMAT)
                    .map_err(|_| IncidentLogError::Timestamp {
                        id,
                        value: timestamp.clone(),
                    })?
                    .and_utc();
                let direction = violation_type
                    .parse::<Direction>()
                    .map_err(|message| IncidentLogError::Direction { id, message })?;
                Ok(Incident {
                    timestamp,
                    subject_id,
                    direction,
                    snapshot_ref,
                })
            })
            .collect()
    }

    pub fn count(&self) -> Result<usize, IncidentLogError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl IncidentLog for SqliteIncidentLog {
    fn append(&mut self, incident: &Incident) -> Result<(), Box<dyn std::error::Error>> {
        self.conn
            .execute(
                "INSERT INTO incidents (timestamp, subject_id, violation_type, snapshot_path)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    incident.timestamp.format(INCIDENT_TIMESTAMP_FORMAT).to_string(),
                    incident.subject_id,
                    incident.direction.as_str(),
                    incident.snapshot_ref,
                ],
            )
            .map_err(IncidentLogError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn incident(subject_id: u32, direction: Direction) -> Incident {
        Incident {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, 5, 7).unwrap(),
            subject_id,
            direction,
            snapshot_ref: format!("snapshots/alert_{subject_id}_20260314_090507_000.jpg"),
        }
    }

    #[test]
    fn test_new_log_is_empty() {
        let log = SqliteIncidentLog::open_in_memory().unwrap();
        assert_eq!(log.count().unwrap(), 0);
        assert!(log.all().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_read_back_in_order() {
        let mut log = SqliteIncidentLog::open_in_memory().unwrap();
        log.append(&incident(1, Direction::Right)).unwrap();
        log.append(&incident(2, Direction::Side)).unwrap();

        let all = log.all().unwrap();
        assert_eq!(all, vec![incident(1, Direction::Right), incident(2, Direction::Side)]);
    }

    #[test]
    fn test_stores_uppercase_violation_type_and_formatted_timestamp() {
        let mut log = SqliteIncidentLog::open_in_memory().unwrap();
        log.append(&incident(1, Direction::Left)).unwrap();

        let (ts, kind): (String, String) = log
            .conn
            .query_row(
                "SELECT timestamp, violation_type FROM incidents",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(ts, "2026-03-14 09:05:07");
        assert_eq!(kind, "LEFT");
    }

    #[test]
    fn test_file_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("incidents.db");
        {
            let mut log = SqliteIncidentLog::open(&path).unwrap();
            log.append(&incident(3, Direction::Right)).unwrap();
        }
        let mut log = SqliteIncidentLog::open(&path).unwrap();
        log.append(&incident(4, Direction::Left)).unwrap();
        assert_eq!(log.count().unwrap(), 2);
        assert_eq!(log.all().unwrap()[0].subject_id, 3);
    }

    #[test]
    fn test_duplicate_incidents_are_both_kept() {
        let mut log = SqliteIncidentLog::open_in_memory().unwrap();
        log.append(&incident(1, Direction::Right)).unwrap();
        log.append(&incident(1, Direction::Right)).unwrap();
        assert_eq!(log.count().unwrap(), 2);
    }
}
