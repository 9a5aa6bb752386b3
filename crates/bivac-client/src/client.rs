//! Self-refreshing client.
//!
//! A [`BivacClient`] owns the credential, the volume store and one background
//! poll loop that keeps the store fresh. Dropping the client cancels the loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::http::RequestExecutor;
use crate::poller::{PollHandle, autoreload};
use crate::store::{RefreshOutcome, VolumeSnapshot, VolumeStore};

pub struct BivacClient {
    gateway: Gateway,
    store: Arc<VolumeStore>,
    poller: PollHandle,
}

impl BivacClient {
    /// Build the client and start polling `/volumes` every
    /// `config.poll_interval`.
    ///
    /// Must be called from within a tokio runtime. Polls are no-ops until a
    /// credential is set, either here through `config.credential` or later
    /// through [`set_credential`](Self::set_credential).
    pub fn new(config: ClientConfig) -> Result<Self> {
        let executor = Arc::new(RequestExecutor::new(&config)?);
        let store = Arc::new(VolumeStore::new(executor.clone()));

        let poll_store = store.clone();
        let poller = autoreload(
            move || {
                let store = poll_store.clone();
                async move { store.refresh().await.map(|_| ()) }
            },
            config.poll_interval,
        );

        info!(
            base_url = %executor.base_url(),
            interval = ?config.poll_interval,
            "Volume autoreload started"
        );

        Ok(Self {
            gateway: Gateway::new(executor),
            store,
            poller,
        })
    }

    /// Install a new credential and refresh right away instead of waiting
    /// for the next tick.
    ///
    /// The credential stays installed even if the refresh fails. A poll
    /// already in flight finishes first, so the snapshot left behind is the
    /// one fetched with the new token.
    pub async fn set_credential(&self, token: impl Into<String>) -> Result<RefreshOutcome> {
        self.gateway
            .executor()
            .set_credential(Credential::new(token));
        self.store.refresh().await
    }

    /// Forget the credential; later polls become no-ops.
    pub fn clear_credential(&self) {
        self.gateway.executor().set_credential(Credential::unset());
    }

    pub fn has_credential(&self) -> bool {
        self.gateway.executor().has_credential()
    }

    /// Refresh the store now, outside the poll schedule.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.store.refresh().await
    }

    pub fn volumes(&self) -> Arc<VolumeSnapshot> {
        self.store.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<VolumeSnapshot>> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &VolumeStore {
        &self.store
    }

    /// One-shot operations (ping, info, backup, ...).
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn poller(&self) -> &PollHandle {
        &self.poller
    }

    /// Stop background polling. The client keeps working for one-shot calls.
    pub fn stop(&self) {
        if !self.poller.is_cancelled() {
            info!("Stopping volume autoreload");
            self.poller.cancel();
        }
    }
}

impl Drop for BivacClient {
    fn drop(&mut self) {
        self.poller.cancel();
    }
}

impl std::fmt::Debug for BivacClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BivacClient")
            .field("executor", self.gateway.executor())
            .field("volumes", &self.store.current().len())
            .field("poller", &self.poller.state())
            .finish()
    }
}
