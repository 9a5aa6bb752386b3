//! Typed one-shot operations on the manager API.
//!
//! Failures are returned to the caller untouched; nothing here retries.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::http::RequestExecutor;
use crate::store::VOLUMES_PATH;
use crate::volume::VolumeRecord;

pub(crate) const PING_PATH: &str = "/ping";
pub(crate) const INFO_PATH: &str = "/info";

pub fn backup_path(volume_id: &str, force: bool) -> String {
    format!("/backup/{}?force={}", urlencoding::encode(volume_id), force)
}

pub fn restore_path(volume_id: &str, snapshot: &str, force: bool) -> String {
    format!(
        "/restore/{}/{}?force={}",
        urlencoding::encode(volume_id),
        urlencoding::encode(snapshot),
        force
    )
}

pub fn restic_path(volume_id: &str) -> String {
    format!("/restic/{}", urlencoding::encode(volume_id))
}

/// `{"type": ..., "data": ...}` wrapper the manager puts around answers.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "type", default)]
    #[allow(dead_code)]
    kind: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, path: &str) -> Result<T> {
        self.data
            .ok_or_else(|| ClientError::unexpected_payload(path, "missing `data` field"))
    }
}

#[derive(Debug, Serialize)]
struct RawCommand<'a, S: Serialize> {
    cmd: &'a [S],
}

#[derive(Debug, Clone)]
pub struct Gateway {
    executor: Arc<RequestExecutor>,
}

impl Gateway {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Health check.
    ///
    /// Returns `200` when the manager answers `200` with `{"type": "pong"}`,
    /// `500` when it answers `200` with anything else, and the raw status
    /// code otherwise.
    pub async fn ping(&self) -> Result<StatusCode> {
        let response = self.executor.request(Method::GET, PING_PATH, None).await?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = %status, "Ping answered with non-OK status");
            return Ok(status);
        }

        let body = response.bytes().await?;
        let is_pong = serde_json::from_slice::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(|value| value.get("type"))
            .and_then(Value::as_str)
            == Some("pong");

        if is_pong {
            Ok(StatusCode::OK)
        } else {
            debug!("Ping answered 200 with an unexpected payload");
            Ok(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }

    /// Manager information (`data` of `GET /info`).
    pub async fn info(&self) -> Result<Value> {
        let envelope: Envelope<Value> = self.executor.get_json(INFO_PATH).await?;
        envelope.into_data(INFO_PATH)
    }

    /// Current volume list, unsorted, without touching any store.
    pub async fn volumes(&self) -> Result<Vec<VolumeRecord>> {
        self.executor.get_json(VOLUMES_PATH).await
    }

    pub async fn backup(&self, volume_id: &str, force: bool) -> Result<Value> {
        self.executor
            .post_json_empty(&backup_path(volume_id, force))
            .await
    }

    pub async fn restore(&self, volume_id: &str, snapshot: &str, force: bool) -> Result<Value> {
        self.executor
            .post_json_empty(&restore_path(volume_id, snapshot, force))
            .await
    }

    /// Run a raw restic command against the volume's repository and return
    /// its output.
    ///
    /// Callers that don't care about the output can spawn the returned
    /// future and drop the join handle.
    pub async fn run_maintenance_command<S>(&self, volume_id: &str, command: &[S]) -> Result<String>
    where
        S: AsRef<str> + Serialize,
    {
        let path = restic_path(volume_id);
        let envelope: Envelope<String> = self
            .executor
            .post_json(&path, &RawCommand { cmd: command })
            .await?;
        envelope.into_data(&path)
    }
}
