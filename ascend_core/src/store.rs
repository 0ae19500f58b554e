//! JSON blob persistence with file locking.
//!
//! The whole dataset (entries, profile, accepted quests) lives in one JSON
//! file. Derived values are never trusted from disk; callers recompute.

use crate::dates::day_key;
use crate::entries::normalize_entries;
use crate::quests::ensure_known_quest;
use crate::{AcceptedQuests, DailyEntry, EntryLog, Error, Profile, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Everything the user has stored
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub entries: EntryLog,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub accepted_quests: AcceptedQuests,
}

impl AppData {
    /// Insert or replace the entry for its date
    ///
    /// Keeps the original `created_at` of a replaced entry and stamps
    /// `updated_at` with `now`.
    pub fn upsert_entry(&mut self, mut entry: DailyEntry, now: DateTime<Utc>) {
        let key = day_key(entry.date);
        let created_at = self
            .entries
            .get(&key)
            .and_then(|existing| existing.created_at)
            .or(entry.created_at)
            .unwrap_or(now);

        entry.created_at = Some(created_at);
        entry.updated_at = Some(now);
        tracing::debug!("Upserted entry {}", key);
        self.entries.insert(key, entry);
    }

    /// Mark a catalog quest as accepted
    pub fn accept_quest(&mut self, id: &str) -> Result<()> {
        ensure_known_quest(id)?;
        self.accepted_quests.insert(id.to_string(), true);
        Ok(())
    }

    /// Recompute the profile's derived TDEE fields from the current entries
    pub fn refresh_derived(&mut self, default_window: usize) -> Result<()> {
        let entries = normalize_entries(&self.entries)?;
        self.profile = self.profile.with_derived(&entries, default_window);
        tracing::debug!(
            "Refreshed derived profile: baseline {:?}, dynamic {:?}",
            self.profile.baseline_tdee,
            self.profile.dynamic_tdee
        );
        Ok(())
    }
}

/// Storage backend for [`AppData`]
pub trait DataStore {
    fn load(&self) -> Result<AppData>;
    fn save(&self, data: &AppData) -> Result<()>;
    /// Delete everything; the only way entries are ever removed
    fn reset(&self) -> Result<()>;
}

/// Single JSON file store
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/ascend.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("ascend.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataStore for JsonFileStore {
    /// Load with a shared lock
    ///
    /// A missing file yields empty data. A corrupt or unreadable file logs a
    /// warning and also yields empty data.
    fn load(&self) -> Result<AppData> {
        let path = &self.path;
        if !path.exists() {
            tracing::info!("No data file at {:?}, starting empty", path);
            return Ok(AppData::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open data file {:?}: {}. Starting empty.", path, e);
                return Ok(AppData::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock data file {:?}: {}. Starting empty.", path, e);
            return Ok(AppData::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read data file {:?}: {}. Starting empty.", path, e);
            return Ok(AppData::default());
        }

        file.unlock()?;

        match serde_json::from_str::<AppData>(&contents) {
            Ok(data) => {
                tracing::info!("Loaded {} entries from {:?}", data.entries.len(), path);
                Ok(data)
            }
            Err(e) => {
                tracing::warn!("Failed to parse data file {:?}: {}. Starting empty.", path, e);
                Ok(AppData::default())
            }
        }
    }

    /// Write to a locked temp file, fsync, then rename over the original
    fn save(&self, data: &AppData) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::Store(format!("{:?} has no parent directory", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(data)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved {} entries to {:?}", data.entries.len(), self.path);
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            tracing::info!("Reset data file {:?}", self.path);
        }
        Ok(())
    }
}

/// Load, modify and save back in one step
///
/// Derived profile fields are refreshed before writing so the file never
/// carries a stale TDEE. `default_window` is the dynamic TDEE window used
/// when the profile has none.
pub fn update<S, F>(store: &S, default_window: usize, f: F) -> Result<AppData>
where
    S: DataStore,
    F: FnOnce(&mut AppData) -> Result<()>,
{
    let mut data = store.load()?;
    f(&mut data)?;
    data.refresh_derived(default_window)?;
    store.save(&data)?;
    Ok(data)
}
