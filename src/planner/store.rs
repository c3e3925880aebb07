use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result};
use log::{info, warn};

use super::event::PlanEvent;

/// Whole-document JSON persistence.
///
/// The on-disk layout is a single pretty-printed array of events. There are
/// no partial updates and no versioning; every save overwrites the document
/// and the last write wins.
pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    /// Store at the default location, creating an empty document on first
    /// run.
    pub fn open_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| eyre!("no data directory available"))?
            .join("tplanner");
        Self::open(dir.join("data.json"))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(&path, "[]")?;
            info!("created event store at {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full event list. Read or parse failures degrade to an empty
    /// list; data loss risk is bounded by the next debounced save.
    pub fn load(&self) -> Vec<PlanEvent> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) => {
                warn!("failed to read {}: {err}", self.path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(events) => events,
            Err(err) => {
                warn!("malformed event document {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Overwrite the document with the full list.
    pub fn save(&self, events: &[PlanEvent]) -> Result<()> {
        let json = serde_json::to_string_pretty(events)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Write the event list to an arbitrary path, pretty-printed.
pub fn export_events(path: &Path, events: &[PlanEvent]) -> Result<()> {
    let json = serde_json::to_string_pretty(events)?;
    fs::write(path, json)?;
    info!("exported {} events to {}", events.len(), path.display());
    Ok(())
}

/// Read an event list from a user-supplied file. The only shape check is
/// that the top-level value is an array; rows then deserialize through the
/// typed model.
pub fn import_events(path: &Path) -> Result<Vec<PlanEvent>> {
    let data = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&data)?;
    if !value.is_array() {
        return Err(eyre!("invalid data format: expected a top-level array"));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn sample(id: &str) -> PlanEvent {
        let mut ev = PlanEvent::new(
            "flight",
            Local.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2025, 6, 10, 11, 0, 0).unwrap(),
        );
        ev.id = id.to_string();
        ev
    }

    #[test]
    fn first_open_creates_an_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let store = EventStore::open(path.clone()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(store.load().is_empty());
    }

    #[test]
    fn malformed_document_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{not json").unwrap();
        let store = EventStore::open(path).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path().join("data.json")).unwrap();
        let events = vec![sample("a"), sample("b")];
        store.save(&events).unwrap();
        assert_eq!(store.load(), events);
    }

    #[test]
    fn import_rejects_non_array_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, r#"{"events": []}"#).unwrap();
        assert!(import_events(&path).is_err());
    }
}
