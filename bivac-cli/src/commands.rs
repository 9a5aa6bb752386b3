use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bivac_client::{
    BivacClient, ClientConfig, Gateway, ProxyConfig, RequestExecutor, StatusCode, VolumeRecord,
};
use tracing::{info, warn};

use crate::output::OutputManager;

pub struct CommandExecutor {
    config: ClientConfig,
    output: OutputManager,
}

impl CommandExecutor {
    pub fn new(config: ClientConfig, output: OutputManager) -> Self {
        Self { config, output }
    }

    pub fn build_config(
        remote_address: String,
        psk: Option<String>,
        timeout: Duration,
        proxy: Option<String>,
        proxy_username: Option<String>,
        proxy_password: Option<String>,
    ) -> ClientConfig {
        let mut config = ClientConfig::new(remote_address).with_request_timeout(timeout);
        config.credential = psk;

        if let Some(url) = proxy {
            let mut proxy = ProxyConfig::from_url(url);
            if let Some(username) = proxy_username {
                proxy = proxy.with_auth(username, proxy_password.unwrap_or_default());
            }
            config = config.with_proxy(proxy);
        }

        config
    }

    fn gateway(&self) -> Result<Gateway> {
        let executor = RequestExecutor::new(&self.config)
            .context("failed to create HTTP client")?;
        Ok(Gateway::new(Arc::new(executor)))
    }

    /// Gateway to a manager that just answered pong.
    async fn connect(&self) -> Result<Gateway> {
        let gateway = self.gateway()?;
        let status = gateway
            .ping()
            .await
            .context("failed to connect to the remote bivac instance")?;
        if status != StatusCode::OK {
            bail!("wrong response from the bivac instance: HTTP {status}");
        }
        Ok(gateway)
    }

    pub async fn ping(&self) -> Result<()> {
        let status = self.gateway()?.ping().await?;
        let result = serde_json::json!({ "status": status.as_u16() });

        if status == StatusCode::OK {
            println!("{}", self.output.message("Manager answered pong", &result)?);
            return Ok(());
        }

        if self.output.format().is_json() {
            println!("{}", self.output.json(&result)?);
        }
        bail!("manager is unhealthy: HTTP {status}")
    }

    pub async fn info(&self) -> Result<()> {
        let info = self.connect().await?.info().await?;

        if self.output.format().is_json() {
            println!("{}", self.output.json(&info)?);
            return Ok(());
        }

        match info.as_object() {
            Some(fields) => {
                for (key, value) in fields {
                    let value = value
                        .as_str()
                        .map(str::to_owned)
                        .unwrap_or_else(|| value.to_string());
                    println!("{key}: {value}");
                }
            }
            None => println!("{info}"),
        }
        Ok(())
    }

    pub async fn volumes(&self, ids: &[String]) -> Result<()> {
        let mut volumes = self.connect().await?.volumes().await?;
        volumes.sort_by(|a, b| a.id().cmp(b.id()));

        if ids.is_empty() {
            println!("{}", self.output.volumes(&volumes)?);
            return Ok(());
        }

        for volume in select_volumes(&volumes, ids)? {
            println!("{}", self.output.volume_detail(volume)?);
        }
        Ok(())
    }

    pub async fn backup(&self, ids: &[String], force: bool) -> Result<()> {
        let gateway = self.connect().await?;

        for id in ids {
            info!(volume = %id, force, "Requesting backup");
            let result = gateway
                .backup(id, force)
                .await
                .with_context(|| format!("failed to back up volume `{id}`"))?;
            println!(
                "{}",
                self.output
                    .message(&format!("Backup of `{id}` requested"), &result)?
            );
        }
        Ok(())
    }

    pub async fn restore(&self, volume: &str, snapshot: &str, force: bool) -> Result<()> {
        let result = self
            .connect()
            .await?
            .restore(volume, snapshot, force)
            .await
            .with_context(|| format!("failed to restore volume `{volume}`"))?;
        println!(
            "{}",
            self.output.message(
                &format!("Restore of `{volume}` from `{snapshot}` requested"),
                &result
            )?
        );
        Ok(())
    }

    pub async fn restic(&self, volume: &str, command: &[String]) -> Result<()> {
        let output = self
            .connect()
            .await?
            .run_maintenance_command(volume, command)
            .await
            .with_context(|| format!("failed to run restic command on `{volume}`"))?;

        if self.output.format().is_json() {
            println!("{}", self.output.json(&serde_json::json!({ "output": output }))?);
        } else {
            println!("{output}");
        }
        Ok(())
    }

    /// Poll until Ctrl-C, printing the volume table after every refresh.
    pub async fn watch(&self, interval: Duration) -> Result<()> {
        if self.config.credential.is_none() {
            bail!("a pre-shared key is required to watch volumes (--psk or BIVAC_SERVER_PSK)");
        }

        let client = BivacClient::new(self.config.clone().with_poll_interval(interval))
            .context("failed to create bivac client")?;
        let mut updates = client.subscribe();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    break;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    if let Some(fetched_at) = snapshot.fetched_at() {
                        info!(volumes = snapshot.len(), at = %fetched_at, "Volumes refreshed");
                    }
                    println!("{}", self.output.volumes(snapshot.iter())?);
                }
            }
        }

        client.stop();
        client.poller().stopped().await;
        Ok(())
    }
}

/// The volumes named by `ids`, in request order.
///
/// Unknown IDs are logged; the call fails only when none of them exist.
fn select_volumes<'a>(
    volumes: &'a [VolumeRecord],
    ids: &[String],
) -> Result<Vec<&'a VolumeRecord>> {
    let mut selected = Vec::with_capacity(ids.len());
    for id in ids {
        match volumes.iter().find(|v| v.id() == id.as_str()) {
            Some(volume) => selected.push(volume),
            None => warn!(volume = %id, "Volume not found"),
        }
    }

    if selected.is_empty() {
        bail!("no volume matches {}", ids.join(", "));
    }
    Ok(selected)
}
