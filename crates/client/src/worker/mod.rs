//! The request-interception worker.
//!
//! `ServiceWorker` owns the worker-scoped state (which generation is
//! current, which application instances are open) and hands the router and
//! strategies a per-request handle to the current store.
//!
//! ### Dispatch
//! Lifecycle signals arrive as `WorkerEvent`s through [`ServiceWorker::handle`];
//! each handler runs to completion before the event is acknowledged.
//! Fetch events resolve to an [`Interception`]: either pass-through or a
//! pending response backed by its own task.

mod clients;
mod intercept;
pub mod lifecycle;
pub mod manifest;
pub mod router;
pub mod strategy;

pub use clients::Clients;
pub use intercept::{Interception, PendingResponse};
pub use lifecycle::{ActivateReport, DeployReport, GenerationState, InstallReport, WorkerPhase};
pub use manifest::PrecacheManifest;
pub use router::{Classification, PassReason, Route, Router};
pub use strategy::{CacheFirst, NetworkFirst, ResponseSource, Strategy, WorkerResponse};

use crate::fetch::{Network, resolve};
use serde::Serialize;
use shellcache_core::{AppConfig, CacheDb, CacheStore, Error};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// Settings the worker needs, independent of how they were loaded.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub manifest: PrecacheManifest,
    /// Root-relative path of the offline shell served to navigations.
    pub offline_document: Option<String>,
    pub static_prefixes: Vec<String>,
    pub skip_waiting: bool,
}

impl WorkerConfig {
    pub fn new(origin: Url, manifest: PrecacheManifest) -> Self {
        Self {
            origin,
            manifest,
            offline_document: Some("/index.html".into()),
            static_prefixes: vec!["/icons/".into()],
            skip_waiting: true,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            manifest: PrecacheManifest::new(config.precache.iter().cloned())?,
            offline_document: Some(config.offline_document.clone()),
            static_prefixes: config.static_prefixes.clone(),
            skip_waiting: config.skip_waiting,
        })
    }
}

/// Lifecycle signals delivered to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install(String),
    Activate,
    Fetch(crate::fetch::FetchRequest),
}

/// Result of handling one `WorkerEvent`.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetch(Interception),
}

/// Snapshot of worker-scoped state.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub current_generation: Option<String>,
    pub phase: Option<WorkerPhase>,
    /// Generation being installed, waiting, or the last one that failed.
    pub incoming: Option<GenerationState>,
    pub stores: Vec<String>,
    pub clients: usize,
    pub uncontrolled_clients: usize,
    pub controller_changes: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ControllerState {
    pub(crate) active: Option<GenerationState>,
    pub(crate) incoming: Option<GenerationState>,
    pub(crate) clients: Clients,
    pub(crate) controller_changes: u64,
}

pub(crate) struct WorkerInner {
    pub(crate) db: CacheDb,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) router: Router,
    pub(crate) manifest: PrecacheManifest,
    pub(crate) skip_waiting: bool,
    cache_first: CacheFirst,
    network_first: NetworkFirst,
    pub(crate) state: RwLock<ControllerState>,
    pub(crate) lifecycle: Mutex<()>,
}

impl WorkerInner {
    pub(crate) fn strategy(&self, classification: Classification) -> &dyn Strategy {
        match classification {
            Classification::LargeMedia => &self.network_first,
            Classification::StaticAsset => &self.cache_first,
        }
    }
}

/// Request-interception cache worker. Cloning shares the same state.
#[derive(Clone)]
pub struct ServiceWorker {
    pub(crate) inner: Arc<WorkerInner>,
}

impl ServiceWorker {
    /// Build a worker and resume the generation persisted by the last
    /// activation, if its store still exists.
    pub async fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let offline_document = config
            .offline_document
            .as_deref()
            .map(|path| resolve(&config.origin, path))
            .transpose()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut state = ControllerState::default();
        if let Some(name) = db.current_generation().await? {
            if db.has_store(&name).await? {
                tracing::info!(generation = %name, "resuming persisted generation");
                state.active = Some(GenerationState::restored(&name));
            } else {
                tracing::warn!(generation = %name, "persisted generation has no store, starting uninstalled");
            }
        }

        let inner = WorkerInner {
            router: Router::new(config.origin, config.static_prefixes),
            manifest: config.manifest,
            skip_waiting: config.skip_waiting,
            cache_first: CacheFirst::new(network.clone(), offline_document),
            network_first: NetworkFirst::new(network.clone()),
            network,
            db,
            state: RwLock::new(state),
            lifecycle: Mutex::new(()),
        };

        Ok(Self { inner: Arc::new(inner) })
    }

    /// Dispatch a lifecycle signal and wait for its handler.
    pub async fn handle(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install(generation) => self.install(&generation).await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Fetch(self.intercept(request).await)),
        }
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    pub fn manifest(&self) -> &PrecacheManifest {
        &self.inner.manifest
    }

    pub async fn current_generation(&self) -> Option<String> {
        let state = self.inner.state.read().await;
        state.active.as_ref().map(|active| active.name.clone())
    }

    pub async fn phase(&self) -> Option<WorkerPhase> {
        let state = self.inner.state.read().await;
        state.active.as_ref().map(|active| active.phase)
    }

    pub async fn incoming(&self) -> Option<GenerationState> {
        self.inner.state.read().await.incoming.clone()
    }

    /// Handle to the store of the generation currently serving requests.
    pub async fn current_store(&self) -> Option<CacheStore> {
        self.current_generation()
            .await
            .map(|name| self.inner.db.store(&name))
    }

    /// Register an open application instance. Returns the generation that
    /// controls it, if any.
    pub async fn register_client(&self, id: &str) -> Option<String> {
        let mut state = self.inner.state.write().await;
        let controller = state
            .active
            .as_ref()
            .filter(|active| active.phase == WorkerPhase::Active)
            .map(|active| active.name.clone());
        state.clients.register(id, controller.as_deref())
    }

    pub async fn unregister_client(&self, id: &str) -> bool {
        self.inner.state.write().await.clients.unregister(id)
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let stores = self.inner.db.store_names().await?;
        let state = self.inner.state.read().await;
        Ok(WorkerStatus {
            current_generation: state.active.as_ref().map(|active| active.name.clone()),
            phase: state.active.as_ref().map(|active| active.phase),
            incoming: state.incoming.clone(),
            stores,
            clients: state.clients.len(),
            uncontrolled_clients: state.clients.uncontrolled(),
            controller_changes: state.controller_changes,
        })
    }
}
