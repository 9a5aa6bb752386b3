//! Keyed, observable snapshot of the manager's volumes.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::error::Result;
use crate::http::RequestExecutor;
use crate::volume::VolumeRecord;

pub(crate) const VOLUMES_PATH: &str = "/volumes";

/// Immutable view of the volumes from one successful fetch, ordered by ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeSnapshot {
    volumes: BTreeMap<String, VolumeRecord>,
    fetched_at: Option<DateTime<Utc>>,
}

impl VolumeSnapshot {
    /// Sort `records` by ID and index them. On duplicate IDs the last one wins.
    pub fn from_records(mut records: Vec<VolumeRecord>) -> Self {
        records.sort_by(|a, b| a.id().cmp(b.id()));

        let mut volumes = BTreeMap::new();
        for record in records {
            volumes.insert(record.id().to_owned(), record);
        }

        Self {
            volumes,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, id: &str) -> Option<&VolumeRecord> {
        self.volumes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.volumes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.volumes.keys().map(String::as_str)
    }

    /// Records in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &VolumeRecord> {
        self.volumes.values()
    }

    /// `None` until the first successful refresh.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// What a call to [`VolumeStore::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No credential set; nothing was requested.
    Skipped,
    /// The snapshot was replaced.
    Replaced { volumes: usize },
}

/// Holder of the current [`VolumeSnapshot`].
///
/// Readers get whole snapshots only; a refresh swaps the `Arc` in one step.
/// Refreshes run one at a time, in call order.
#[derive(Debug)]
pub struct VolumeStore {
    executor: Arc<RequestExecutor>,
    tx: watch::Sender<Arc<VolumeSnapshot>>,
    refreshing: Mutex<()>,
}

impl VolumeStore {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        let (tx, _) = watch::channel(Arc::new(VolumeSnapshot::default()));
        Self {
            executor,
            tx,
            refreshing: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<VolumeSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<VolumeSnapshot>> {
        self.tx.subscribe()
    }

    /// Fetch `/volumes` and replace the snapshot.
    ///
    /// Does nothing when no credential is set. On error the previous
    /// snapshot is left in place.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let _guard = self.refreshing.lock().await;

        if !self.executor.has_credential() {
            debug!("No credential set; skipping volume refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        let records: Vec<VolumeRecord> = self.executor.get_json(VOLUMES_PATH).await?;
        let snapshot = VolumeSnapshot::from_records(records);
        let volumes = snapshot.len();

        self.tx.send_replace(Arc::new(snapshot));
        info!(volumes, "Volume snapshot replaced");

        Ok(RefreshOutcome::Replaced { volumes })
    }
}
