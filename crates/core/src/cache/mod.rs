//! SQLite-backed generational cache store.
//!
//! Each generation is a named store holding response snapshots keyed by
//! request identity. Access is async via tokio-rusqlite. It supports:
//!
//! - Content-addressed entry keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Atomic multi-entry writes for precache population
//! - Store enumeration and deletion for stale-generation cleanup

pub mod connection;
pub mod generations;
pub mod key;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::{RequestKey, compute_cache_key};
pub use store::CacheStore;
