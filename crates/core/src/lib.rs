//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Generational cache store with SQLite backend
//! - Response snapshots shared by the store and the worker
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod snapshot;

pub use cache::{CacheDb, CacheStore, RequestKey};
pub use config::AppConfig;
pub use error::Error;
pub use snapshot::ResponseSnapshot;
