//! Drives one export-and-upload run from credential check to outcome.
//!
//! Stages run strictly in order; any failure jumps straight to `Done`:
//!
//! ```text
//! Idle -> Validating -> Serializing -> Uploading -> Classifying -> Done
//! ```

use std::sync::Arc;

use chrono::Local;
use tokio::runtime::Handle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::client::{HttpUploadClient, UploadClient, UploadRequest};
use super::notify::{self, CompletionHandle};
use super::{classify_response, Credentials, UploadError, UploadOutcome, STUMBLE_FILE_FIELD};
use crate::config::UploaderConfig;
use crate::export;
use crate::model::NetworkRecord;
use crate::storage::{export_filename, FallbackStorage, ResolvedPath, StorageResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    Serializing,
    Uploading,
    Classifying,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::Validating => write!(f, "validating"),
            Stage::Serializing => write!(f, "serializing"),
            Stage::Uploading => write!(f, "uploading"),
            Stage::Classifying => write!(f, "classifying"),
            Stage::Done => write!(f, "done"),
        }
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "upload stage");
}

/// Owns a snapshot of the records and the collaborators for a single run.
pub struct UploadCoordinator {
    networks: Arc<Vec<NetworkRecord>>,
    client: Arc<dyn UploadClient>,
    storage: Arc<dyn StorageResolver>,
    endpoint: String,
}

impl UploadCoordinator {
    /// Copies `networks`, so the producer may keep mutating its own collection.
    pub fn new(
        networks: &[NetworkRecord],
        client: Arc<dyn UploadClient>,
        storage: Arc<dyn StorageResolver>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            networks: Arc::new(networks.to_vec()),
            client,
            storage,
            endpoint: endpoint.into(),
        }
    }

    /// Wire up the HTTP client and fallback storage described by `config`.
    pub fn from_config(
        networks: &[NetworkRecord],
        config: &UploaderConfig,
    ) -> Result<Self, UploadError> {
        let client = HttpUploadClient::new(config.service.timeout())?;
        let storage = FallbackStorage::from_config(&config.storage);
        Ok(Self::new(
            networks,
            Arc::new(client),
            Arc::new(storage),
            config.service.endpoint.clone(),
        ))
    }

    /// Run on a background task of the current tokio runtime; the outcome
    /// arrives through the handle.
    ///
    /// Panics when called outside a runtime context. Threads that are not
    /// part of a runtime use [`UploadCoordinator::spawn_on`].
    pub fn spawn(self, credentials: Credentials) -> CompletionHandle {
        self.spawn_on(&Handle::current(), credentials)
    }

    /// Run on a background task of `runtime`. Callable from any thread, so a
    /// plain thread can pair it with [`CompletionHandle::wait_blocking`].
    pub fn spawn_on(self, runtime: &Handle, credentials: Credentials) -> CompletionHandle {
        let (notifier, handle) = notify::channel();
        runtime.spawn(async move {
            let outcome = self.run(&credentials).await;
            notifier.notify(outcome);
        });
        handle
    }

    /// Execute every stage in place and return the terminal outcome.
    pub async fn run(&self, credentials: &Credentials) -> UploadOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("upload_run", %run_id, networks = self.networks.len());

        async move {
            enter(Stage::Idle);
            enter(Stage::Validating);
            if let Err(e) = credentials.validate() {
                error!(error = %e, username = %credentials.username, "credential check failed");
                enter(Stage::Done);
                return UploadOutcome::from(e);
            }

            let outcome = match self.export_and_upload(credentials).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "upload run aborted");
                    UploadOutcome::Exception
                }
            };

            enter(Stage::Done);
            info!(%outcome, "upload run finished");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn export_and_upload(&self, credentials: &Credentials) -> Result<UploadOutcome, UploadError> {
        enter(Stage::Serializing);
        let file_name = export_filename(&Local::now());
        let resolved = self.write_export(file_name.clone()).await?;
        info!(
            path = %resolved.path.display(),
            location = %resolved.location,
            "export archive written"
        );

        enter(Stage::Uploading);
        let file = tokio::fs::File::open(&resolved.path).await?;
        let file_len = file.metadata().await?.len();
        let body = self
            .client
            .upload(UploadRequest {
                endpoint: self.endpoint.clone(),
                file_name,
                field_name: STUMBLE_FILE_FIELD.to_string(),
                file,
                file_len,
                params: credentials.form_params(),
            })
            .await?;

        enter(Stage::Classifying);
        let outcome = classify_response(&body);
        if outcome == UploadOutcome::Fail {
            error!(response = %body, "service did not accept upload");
        }
        Ok(outcome)
    }

    async fn write_export(&self, file_name: String) -> Result<ResolvedPath, UploadError> {
        let networks = Arc::clone(&self.networks);
        let storage = Arc::clone(&self.storage);

        let resolved = tokio::task::spawn_blocking(move || -> std::io::Result<ResolvedPath> {
            let resolved = storage.resolve(&file_name)?;
            export::write_archive(&resolved.path, &networks)?;
            Ok(resolved)
        })
        .await??;

        Ok(resolved)
    }
}
