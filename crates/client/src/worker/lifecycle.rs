//! Generation lifecycle: install, activate, claim.
//!
//! A generation moves `Installing → Waiting → Activating → Active`, or to
//! `Redundant` when its install fails or a newer generation replaces it.
//! Install and activate are serialized by the lifecycle lock; fetches keep
//! reading the previous generation until activation swaps the pointer.

use super::{ControllerState, ServiceWorker};
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use shellcache_core::Error;
use tokio::sync::MutexGuard;

/// Lifecycle phase of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

/// Check if a phase transition is valid.
pub fn is_valid_transition(from: WorkerPhase, to: WorkerPhase) -> bool {
    use WorkerPhase::*;

    matches!(
        (from, to),
        (Installing, Waiting)
            | (Installing, Redundant)
            | (Waiting, Activating)
            | (Waiting, Redundant)
            | (Activating, Active)
            | (Activating, Redundant)
            | (Active, Redundant)
    )
}

/// A generation tracked by the controller.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationState {
    pub name: String,
    pub phase: WorkerPhase,
    pub since: DateTime<Utc>,
}

impl GenerationState {
    pub fn installing(name: &str) -> Self {
        Self { name: name.to_string(), phase: WorkerPhase::Installing, since: Utc::now() }
    }

    /// A generation picked up from the persisted pointer at startup.
    pub fn restored(name: &str) -> Self {
        Self { name: name.to_string(), phase: WorkerPhase::Active, since: Utc::now() }
    }

    pub fn transition(&mut self, to: WorkerPhase) -> Result<(), Error> {
        if !is_valid_transition(self.phase, to) {
            return Err(Error::InvalidState(format!("{}: cannot move from {:?} to {:?}", self.name, self.phase, to)));
        }
        tracing::info!(generation = %self.name, from = ?self.phase, to = ?to, "generation phase change");
        self.phase = to;
        self.since = Utc::now();
        Ok(())
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Manifest entries now resident in the store.
    pub entries: usize,
    /// The generation was already serving; nothing was fetched.
    pub already_current: bool,
    /// Activation should follow immediately instead of waiting.
    pub skip_waiting: bool,
    /// Waiting generation this install replaced; its store is discarded.
    pub superseded: Option<String>,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub generation: String,
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Stale stores that could not be removed; they are retried on the next activation.
    pub failed: Vec<String>,
    /// Application instances that switched to this generation.
    pub claimed: usize,
}

/// Install followed, when skip-waiting applies, by activation.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub install: InstallReport,
    pub activation: Option<ActivateReport>,
}

impl ServiceWorker {
    /// Install `generation`: fetch every manifest asset and store them all,
    /// or discard the generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any asset cannot be fetched (transport
    /// failure or non-2xx status), stored, or read back. The previously
    /// active generation keeps serving.
    pub async fn install(&self, generation: &str) -> Result<InstallReport, Error> {
        let lifecycle = self.inner.lifecycle.lock().await;
        self.install_locked(generation, &lifecycle).await
    }

    async fn install_locked(&self, generation: &str, _lifecycle: &MutexGuard<'_, ()>) -> Result<InstallReport, Error> {
        if generation.trim().is_empty() {
            return Err(Error::InvalidInput("generation cannot be empty".into()));
        }

        if self.current_generation().await.as_deref() == Some(generation) {
            tracing::info!(generation, "generation already active, skipping install");
            return Ok(InstallReport {
                generation: generation.to_string(),
                entries: self.inner.manifest.len(),
                already_current: true,
                skip_waiting: self.inner.skip_waiting,
                superseded: None,
            });
        }

        let superseded = {
            let mut state = self.inner.state.write().await;
            let superseded = match state.incoming.take() {
                Some(mut previous) if previous.phase == WorkerPhase::Waiting => {
                    tracing::info!(superseded = %previous.name, generation, "replacing waiting generation");
                    previous.transition(WorkerPhase::Redundant)?;
                    Some(previous.name).filter(|name| name != generation)
                }
                _ => None,
            };
            state.incoming = Some(GenerationState::installing(generation));
            superseded
        };

        if let Some(name) = superseded.as_deref()
            && let Err(e) = self.inner.db.delete_store(name).await
        {
            tracing::warn!(store = name, "failed to discard superseded generation: {e}");
        }

        tracing::info!(generation, assets = self.inner.manifest.len(), "installing generation");

        match self.populate(generation).await {
            Ok(entries) => {
                self.set_incoming_phase(WorkerPhase::Waiting).await?;
                Ok(InstallReport {
                    generation: generation.to_string(),
                    entries,
                    already_current: false,
                    skip_waiting: self.inner.skip_waiting,
                    superseded,
                })
            }
            Err(reason) => {
                tracing::warn!(generation, "install failed, discarding generation: {reason}");
                if let Err(e) = self.inner.db.delete_store(generation).await {
                    tracing::warn!(generation, "failed to discard partial store: {e}");
                }
                self.set_incoming_phase(WorkerPhase::Redundant).await?;
                Err(Error::InstallFailed { generation: generation.to_string(), reason })
            }
        }
    }

    /// Fetch the whole manifest, then write it in one transaction and read
    /// every entry back.
    async fn populate(&self, generation: &str) -> Result<usize, String> {
        let db = &self.inner.db;
        if db.has_store(generation).await.map_err(|e| e.to_string())? {
            db.delete_store(generation).await.map_err(|e| e.to_string())?;
        }
        let store = db.open_store(generation).await.map_err(|e| e.to_string())?;

        let requests = self
            .inner
            .manifest
            .requests(self.inner.router.origin())
            .map_err(|e| e.to_string())?;

        let network = &self.inner.network;
        let entries = try_join_all(requests.iter().map(|request| async move {
            let path = request.url.path();
            let response = network.fetch(request).await.map_err(|e| format!("{path}: {e}"))?;
            if !response.is_success() {
                return Err(format!("{path}: status {}", response.status));
            }
            Ok((request.key(), response))
        }))
        .await?;

        store.put_all(&entries).await.map_err(|e| e.to_string())?;

        for (key, _) in &entries {
            match store.get(key).await {
                Ok(Some(_)) => {}
                Ok(None) => return Err(format!("{}: not retrievable after store", key.url().path())),
                Err(e) => return Err(format!("{}: {e}", key.url().path())),
            }
        }

        Ok(entries.len())
    }

    async fn set_incoming_phase(&self, phase: WorkerPhase) -> Result<(), Error> {
        let mut state = self.inner.state.write().await;
        match state.incoming.as_mut() {
            Some(incoming) => incoming.transition(phase),
            None => Err(Error::InvalidState("no generation is being installed".into())),
        }
    }

    /// Promote the waiting generation: persist it as current, delete every
    /// other store, then claim all open instances.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if no installed generation is waiting.
    /// Failures to delete individual stale stores are logged and reported,
    /// not returned.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let lifecycle = self.inner.lifecycle.lock().await;
        self.activate_locked(None, &lifecycle).await
    }

    /// Activate the waiting generation, which must be `expected` when given.
    async fn activate_locked(
        &self, expected: Option<&str>, _lifecycle: &MutexGuard<'_, ()>,
    ) -> Result<ActivateReport, Error> {
        let generation = {
            let state = self.inner.state.read().await;
            state
                .incoming
                .as_ref()
                .filter(|incoming| incoming.phase == WorkerPhase::Waiting)
                .map(|incoming| incoming.name.clone())
                .ok_or_else(|| Error::InvalidState("no installed generation is waiting to activate".into()))?
        };
        if let Some(expected) = expected
            && expected != generation
        {
            return Err(Error::InvalidState(format!("{generation} is waiting, refusing to activate it for {expected}")));
        }

        self.inner.db.set_current_generation(&generation).await?;

        {
            let mut state = self.inner.state.write().await;
            let Some(mut next) = state.incoming.take() else {
                return Err(Error::InvalidState("waiting generation disappeared".into()));
            };
            next.transition(WorkerPhase::Activating)?;
            if let Some(mut previous) = state.active.replace(next) {
                previous.transition(WorkerPhase::Redundant)?;
            }
        }

        let (deleted, failed) = self.delete_stale_stores(&generation).await;

        let claimed = {
            let mut state = self.inner.state.write().await;
            if let Some(active) = state.active.as_mut() {
                active.transition(WorkerPhase::Active)?;
            }
            claim_clients(&mut state)
        };

        tracing::info!(generation, deleted = deleted.len(), claimed, "generation activated");

        Ok(ActivateReport { generation, deleted, failed, claimed })
    }

    async fn delete_stale_stores(&self, keep: &str) -> (Vec<String>, Vec<String>) {
        let names = match self.inner.db.store_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("could not enumerate stores for cleanup: {e}");
                return (Vec::new(), Vec::new());
            }
        };

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for name in names.into_iter().filter(|name| name != keep) {
            match self.inner.db.delete_store(&name).await {
                Ok(_) => {
                    tracing::info!(store = %name, "deleted stale generation");
                    deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(store = %name, "failed to delete stale generation: {e}");
                    failed.push(name);
                }
            }
        }
        (deleted, failed)
    }

    /// Take control of every open instance so it routes through the active
    /// generation without a reload.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotActive` if no generation is active.
    pub async fn claim(&self) -> Result<usize, Error> {
        let mut state = self.inner.state.write().await;
        let active = state
            .active
            .as_ref()
            .is_some_and(|active| active.phase == WorkerPhase::Active);
        if !active {
            return Err(Error::NotActive);
        }
        Ok(claim_clients(&mut state))
    }

    /// Install `generation` and, when skip-waiting is configured, activate it.
    ///
    /// Install and activation run under one hold of the lifecycle lock, so
    /// an overlapping deploy cannot promote this generation or be promoted
    /// by it.
    pub async fn deploy(&self, generation: &str) -> Result<DeployReport, Error> {
        let lifecycle = self.inner.lifecycle.lock().await;
        let install = self.install_locked(generation, &lifecycle).await?;
        let activation = if install.skip_waiting && !install.already_current {
            Some(self.activate_locked(Some(generation), &lifecycle).await?)
        } else {
            None
        };
        Ok(DeployReport { install, activation })
    }
}

fn claim_clients(state: &mut ControllerState) -> usize {
    let Some(generation) = state.active.as_ref().map(|active| active.name.clone()) else {
        return 0;
    };
    let changed = state.clients.claim(&generation);
    if changed > 0 {
        state.controller_changes += changed as u64;
        tracing::info!(generation, changed, "claimed clients");
    }
    changed
}
