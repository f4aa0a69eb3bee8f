//! Client code for shellcache.
//!
//! This crate provides the network side of the offline asset layer and the
//! request-interception worker that sits between the application and it:
//! routing, the cache-first and network-first strategies, and the
//! install/activate lifecycle over generational stores.

pub mod fetch;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, FetchRequest, Network, NetworkError};
pub use worker::{
    Classification, DeployReport, EventOutcome, Interception, PendingResponse, PrecacheManifest, ResponseSource,
    ServiceWorker, WorkerConfig, WorkerEvent, WorkerPhase, WorkerResponse, WorkerStatus,
};
