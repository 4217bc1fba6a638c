//! Multipart file upload over HTTP.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Body, Client};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::UploadError;

/// One multipart POST: a single file part plus string parts.
#[derive(Debug)]
pub struct UploadRequest {
    pub endpoint: String,
    pub file_name: String,
    pub field_name: String,
    pub file: tokio::fs::File,
    pub file_len: u64,
    pub params: Vec<(String, String)>,
}

/// Performs the upload and returns the raw response body.
#[async_trait::async_trait]
pub trait UploadClient: Send + Sync {
    async fn upload(&self, req: UploadRequest) -> Result<String, UploadError>;
}

/// [`UploadClient`] backed by `reqwest`. Redirects are not followed and no
/// cookies are kept between calls.
pub struct HttpUploadClient {
    client: Client,
}

impl HttpUploadClient {
    pub fn new(timeout: Duration) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UploadClient for HttpUploadClient {
    async fn upload(&self, req: UploadRequest) -> Result<String, UploadError> {
        let body = Body::wrap_stream(ReaderStream::new(req.file));
        let file_part = Part::stream_with_length(body, req.file_len)
            .file_name(req.file_name.clone())
            .mime_str("application/octet-stream")?;

        let mut form = Form::new().part(req.field_name.clone(), file_part);
        for (name, value) in req.params {
            form = form.text(name, value);
        }

        info!(endpoint = %req.endpoint, file = %req.file_name, bytes = req.file_len, "uploading stumble file");
        let response = self.client.post(&req.endpoint).multipart(form).send().await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(%status, body_len = text.len(), "upload response received");

        Ok(text)
    }
}
