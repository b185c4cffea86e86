use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::error::CacheError;
use super::lock::FileLock;
use crate::config;

/// Bound on how long a save waits for the file lock
const SAVE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// The named mapping tables persisted in a cache file.
///
/// Every field defaults to an empty table when absent from a stored
/// container, and unrecognized keys in a stored container are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheTables {
    /// Monster id -> sighting expiry time
    #[serde(default)]
    pub mon_hist: HashMap<String, DateTime<Utc>>,

    /// Stop id -> lure/invasion expiry time
    #[serde(default)]
    pub stop_hist: HashMap<String, DateTime<Utc>>,

    /// Gym id -> egg hatch time
    #[serde(default)]
    pub egg_hist: HashMap<String, DateTime<Utc>>,

    /// Gym id -> raid end time
    #[serde(default)]
    pub raid_hist: HashMap<String, DateTime<Utc>>,

    /// Weather cell id -> last reported weather id
    #[serde(default)]
    pub weather_hist: HashMap<String, u8>,

    /// Gym id -> controlling team id
    #[serde(default)]
    pub gym_team: HashMap<String, u8>,

    /// Gym id -> gym name
    #[serde(default)]
    pub gym_name: HashMap<String, String>,

    /// Gym id -> gym description
    #[serde(default)]
    pub gym_desc: HashMap<String, String>,

    /// Gym id -> gym image URL
    #[serde(default)]
    pub gym_image: HashMap<String, String>,

    /// Stop id -> quest reward label
    #[serde(default)]
    pub reward: HashMap<String, String>,
}

/// A named, file-backed history cache.
///
/// Construction either loads the backing file or creates an empty one; after
/// that the in-memory tables are authoritative and the file only changes on
/// an explicit [`save`](FileCache::save). All file access happens under an
/// exclusive advisory lock.
pub struct FileCache {
    name: String,
    path: PathBuf,
    pub tables: CacheTables,
}

impl FileCache {
    /// Open the named cache under the platform cache directory.
    ///
    /// Fails only when no backing file exists and one cannot be created;
    /// a present-but-corrupt file is logged and treated as empty.
    pub fn new(name: &str) -> Result<Self> {
        let path = config::cache_file(name)?;
        Self::at_path(name, path)
    }

    /// Open the named cache under an explicit base directory.
    pub fn with_base_dir(name: &str, base_dir: &Path) -> Result<Self> {
        let path = config::cache_file_in(base_dir, name);
        Self::at_path(name, path)
    }

    fn at_path(name: &str, path: PathBuf) -> Result<Self> {
        anyhow::ensure!(!name.is_empty(), "Cache name must not be empty");

        let mut cache = FileCache {
            name: name.to_string(),
            path,
            tables: CacheTables::default(),
        };

        debug!("Checking for previous cache at {}", cache.path.display());
        if cache.path.is_file() {
            cache.load();
        } else {
            cache.create_empty().with_context(|| {
                format!("Failed to create cache file {}", cache.path.display())
            })?;
        }
        Ok(cache)
    }

    /// The cache name this instance was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty container so later loads and saves have a file to
    /// lock. Failures here are fatal to construction.
    fn create_empty(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)?;
        let mut lock = FileLock::acquire(file)?;

        let contents = serde_json::to_string_pretty(&CacheTables::default())?;
        lock.file().set_len(0)?;
        lock.file().write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Populate the tables from the backing file. Any failure leaves the
    /// tables in their empty default state; a damaged cache must never
    /// block startup.
    fn load(&mut self) {
        match self.try_load() {
            Ok(()) => debug!("Cache loaded successfully"),
            Err(e) => {
                error!(
                    "There was an error attempting to load the cache. \
                     The old cache will be overwritten."
                );
                error!("{}: {}", e.kind(), e);
            }
        }
    }

    fn try_load(&mut self) -> Result<(), CacheError> {
        let file = File::open(&self.path)?;
        let mut lock = FileLock::acquire(file)?;

        let mut contents = String::new();
        lock.file().read_to_string(&mut contents)?;
        self.tables = serde_json::from_str(&contents)?;
        Ok(())
    }

    /// Snapshot all tables to the backing file.
    ///
    /// Fire-and-forget: a failed save is logged and otherwise invisible to
    /// the caller; the in-memory tables stay authoritative until the next
    /// successful save.
    pub fn save(&self) {
        debug!("Writing cache to file...");
        if let Err(e) = self.try_save() {
            error!("Encountered error while saving cache: {}: {}", e.kind(), e);
            debug!("Save failure detail: {:?}", e);
        }
    }

    fn try_save(&self) -> Result<(), CacheError> {
        // Serialize before touching the file so a failure here writes
        // nothing at all.
        let contents = serde_json::to_string_pretty(&self.tables)?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)?;
        let mut lock = FileLock::acquire_timeout(file, SAVE_LOCK_TIMEOUT)?;

        // Truncate only after the lock is held.
        lock.file().set_len(0)?;
        lock.file().write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Drop entries from the sighting histories whose expiry time has
    /// passed.
    pub fn clean_expired(&mut self, now: DateTime<Utc>) {
        let histories = [
            &mut self.tables.mon_hist,
            &mut self.tables.stop_hist,
            &mut self.tables.egg_hist,
            &mut self.tables.raid_hist,
        ];
        for hist in histories {
            hist.retain(|_, expires| *expires >= now);
        }
    }

    /// Sweep expired history entries, then snapshot to disk.
    pub fn clean_and_save(&mut self) {
        self.clean_expired(Utc::now());
        self.save();
    }

    // ===== Typed accessors =====

    pub fn monster_expiration(&self, monster_id: &str) -> Option<DateTime<Utc>> {
        self.tables.mon_hist.get(monster_id).copied()
    }

    pub fn set_monster_expiration(&mut self, monster_id: impl Into<String>, expires: DateTime<Utc>) {
        self.tables.mon_hist.insert(monster_id.into(), expires);
    }

    pub fn stop_expiration(&self, stop_id: &str) -> Option<DateTime<Utc>> {
        self.tables.stop_hist.get(stop_id).copied()
    }

    pub fn set_stop_expiration(&mut self, stop_id: impl Into<String>, expires: DateTime<Utc>) {
        self.tables.stop_hist.insert(stop_id.into(), expires);
    }

    pub fn egg_expiration(&self, gym_id: &str) -> Option<DateTime<Utc>> {
        self.tables.egg_hist.get(gym_id).copied()
    }

    pub fn set_egg_expiration(&mut self, gym_id: impl Into<String>, hatches: DateTime<Utc>) {
        self.tables.egg_hist.insert(gym_id.into(), hatches);
    }

    pub fn raid_expiration(&self, gym_id: &str) -> Option<DateTime<Utc>> {
        self.tables.raid_hist.get(gym_id).copied()
    }

    pub fn set_raid_expiration(&mut self, gym_id: impl Into<String>, ends: DateTime<Utc>) {
        self.tables.raid_hist.insert(gym_id.into(), ends);
    }

    pub fn weather(&self, cell_id: &str) -> Option<u8> {
        self.tables.weather_hist.get(cell_id).copied()
    }

    pub fn set_weather(&mut self, cell_id: impl Into<String>, weather_id: u8) {
        self.tables.weather_hist.insert(cell_id.into(), weather_id);
    }

    pub fn gym_team(&self, gym_id: &str) -> Option<u8> {
        self.tables.gym_team.get(gym_id).copied()
    }

    pub fn set_gym_team(&mut self, gym_id: impl Into<String>, team_id: u8) {
        self.tables.gym_team.insert(gym_id.into(), team_id);
    }

    pub fn gym_name(&self, gym_id: &str) -> Option<&str> {
        self.tables.gym_name.get(gym_id).map(String::as_str)
    }

    pub fn set_gym_name(&mut self, gym_id: impl Into<String>, name: impl Into<String>) {
        self.tables.gym_name.insert(gym_id.into(), name.into());
    }

    pub fn gym_desc(&self, gym_id: &str) -> Option<&str> {
        self.tables.gym_desc.get(gym_id).map(String::as_str)
    }

    pub fn set_gym_desc(&mut self, gym_id: impl Into<String>, desc: impl Into<String>) {
        self.tables.gym_desc.insert(gym_id.into(), desc.into());
    }

    pub fn gym_image(&self, gym_id: &str) -> Option<&str> {
        self.tables.gym_image.get(gym_id).map(String::as_str)
    }

    pub fn set_gym_image(&mut self, gym_id: impl Into<String>, url: impl Into<String>) {
        self.tables.gym_image.insert(gym_id.into(), url.into());
    }

    pub fn reward(&self, stop_id: &str) -> Option<&str> {
        self.tables.reward.get(stop_id).map(String::as_str)
    }

    pub fn set_reward(&mut self, stop_id: impl Into<String>, reward: impl Into<String>) {
        self.tables.reward.insert(stop_id.into(), reward.into());
    }
}
