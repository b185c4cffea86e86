//! Persistent sighting-history cache for an alert pipeline.
//!
//! Alert pipelines see the same monster, stop, or gym many times; this crate
//! keeps the per-category history tables that let the pipeline tell a repeat
//! sighting from a new one, and persists them across restarts in a single
//! locked file on disk.
//!
//! The entry point is [`FileCache`]: construct it with a cache name, mutate
//! its tables while the process runs, and call [`FileCache::save`] whenever
//! the current state should be snapshotted to disk.

pub mod cache;
mod config;

pub use cache::{CacheError, CacheTables, FileCache};
pub use config::cache_file;
