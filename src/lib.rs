//! wigle-upload -- package wireless observation records as a WigleWifi
//! archive and upload it to the collection service.
//!
//! The pipeline validates the upload identity, writes a gzip-compressed CSV
//! export, posts it as a multipart "stumble file", and reduces the service's
//! reply to a single [`upload::UploadOutcome`].

pub mod config;
pub mod export;
pub mod model;
pub mod storage;
pub mod upload;

use std::path::Path;

use anyhow::{Context, Result};

use crate::model::NetworkRecord;

/// Read a JSON array of networks (with their observations) from `path`.
pub fn load_records(path: &Path) -> Result<Vec<NetworkRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records file: {}", path.display()))?;
    let networks: Vec<NetworkRecord> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse records file: {}", path.display()))?;
    tracing::info!(path = %path.display(), networks = networks.len(), "loaded record snapshot");
    Ok(networks)
}

/// Upload `networks` under `credentials` on a background task and wait for
/// the outcome.
pub async fn run_upload(
    networks: &[NetworkRecord],
    credentials: upload::Credentials,
    config: &config::UploaderConfig,
) -> Result<upload::UploadOutcome> {
    let coordinator = upload::UploadCoordinator::from_config(networks, config)
        .context("failed to build upload client")?;
    Ok(coordinator.spawn(credentials).outcome().await)
}
