//! Client for the bivac backup manager HTTP API.
//!
//! [`BivacClient`] keeps an ordered snapshot of the manager's volumes fresh by
//! polling `/volumes` in the background, and exposes the one-shot operations
//! (ping, info, backup, restore, raw restic commands) through [`Gateway`].
//!
//! ```no_run
//! # async fn run() -> bivac_client::Result<()> {
//! use bivac_client::{BivacClient, ClientConfig};
//!
//! let client = BivacClient::new(ClientConfig::new("http://127.0.0.1:8182"))?;
//! client.set_credential("psk").await?;
//!
//! for volume in client.volumes().iter() {
//!     println!("{} {:?}", volume.id(), volume.status().last_backup_status);
//! }
//!
//! client.gateway().backup("pgdata", false).await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod credential;
mod error;
pub mod gateway;
pub mod http;
pub mod poller;
pub mod proxy;
pub mod store;
pub mod volume;

pub use client::BivacClient;
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{ClientError, Result};
pub use gateway::Gateway;
pub use http::{RequestExecutor, client_builder};
pub use poller::{PollHandle, PollState, autoreload};
pub use proxy::{ProxyAuth, ProxyConfig, ProxyType};
pub use store::{RefreshOutcome, VolumeSnapshot, VolumeStore};
pub use volume::{BackupStatus, VolumeRecord};

pub use reqwest::StatusCode;
