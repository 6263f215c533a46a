pub mod image_snapshot_store;
pub mod memory_incident_log;
pub mod sqlite_incident_log;
