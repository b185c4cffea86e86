//! Persistent history cache backing the alert pipeline.
//!
//! This module provides [`FileCache`], which owns the ten per-category
//! mapping tables (monster/stop/egg/raid sighting histories, weather, and
//! gym metadata) and synchronizes them with a single JSON file on disk.
//!
//! The file is guarded by an exclusive advisory lock so that two processes
//! pointed at the same cache name cannot clobber each other's snapshots.

mod error;
mod file;
mod lock;

pub use error::CacheError;
pub use file::{CacheTables, FileCache};
