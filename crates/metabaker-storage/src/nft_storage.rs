//! NFT.Storage HTTP client
//!
//! `POST /upload` stores a multipart directory, `GET /<cid>` reports its pin
//! status. Every request carries the API token as a bearer credential.

use metabaker_core::{ContentId, ContentStore, MetabakerError, PinStatus, Result, UploadFile};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    value: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UploadValue {
    cid: String,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    pin: PinValue,
}

#[derive(Debug, Deserialize)]
struct PinValue {
    status: String,
}

/// [`ContentStore`] backed by an NFT.Storage compatible API
#[derive(Debug, Clone)]
pub struct NftStorageClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl NftStorageClient {
    /// Create client
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` if the token is empty
    /// - `MetabakerError::Config` if the HTTP client cannot be built
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(MetabakerError::invalid_argument("storage token is empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetabakerError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn decode<T: DeserializeOwned>(what: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| MetabakerError::external(format!("{what}: HTTP {status}: {e}")))?;

        match (body.ok, body.value, body.error) {
            (true, Some(value), _) => Ok(value),
            (_, _, Some(error)) => Err(MetabakerError::external(format!(
                "{what}: {} {}",
                error.name, error.message
            ))),
            _ => Err(MetabakerError::external(format!("{what}: HTTP {status}: empty response"))),
        }
    }
}

#[async_trait::async_trait]
impl ContentStore for NftStorageClient {
    async fn upload_directory(&self, files: Vec<UploadFile>) -> Result<ContentId> {
        let count = files.len();
        let form = files.into_iter().fold(Form::new(), |form, file| {
            form.part("file", Part::bytes(file.bytes).file_name(file.name))
        });

        tracing::debug!("Uploading {} files to {}", count, self.endpoint);
        let response = self
            .client
            .post(format!("{}/upload", self.endpoint))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MetabakerError::external(format!("upload: {e}")))?;

        let value: UploadValue = Self::decode("upload", response).await?;
        ContentId::new(value.cid)
    }

    async fn status(&self, cid: &ContentId) -> Result<PinStatus> {
        let response = self
            .client
            .get(format!("{}/{}", self.endpoint, cid))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MetabakerError::external(format!("status {cid}: {e}")))?;

        let value: StatusValue = Self::decode("status", response).await?;
        Ok(PinStatus::parse(&value.pin.status))
    }
}
