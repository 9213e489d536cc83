//! HTTP client for the contract API.
//!
//! [`ContractsApi`] is the seam the store talks through, so the store can
//! run against the daemon over HTTP or against an in-process fake.

use std::time::Duration;

use async_trait::async_trait;
use charter_types::{
    Contract, ContractEvent, ContractId, ContractPage, ContractPatch, DeleteResult, ErrorBody,
    NewContract, UpdateResult,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::filters::Filters;

/// Errors that can occur while talking to the contract API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with an error body.
    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The event socket failed to connect or dropped.
    #[error("Event socket {url} failed: {reason}")]
    Socket { url: String, reason: String },

    /// A response or event frame was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Operations the contract API offers.
#[async_trait]
pub trait ContractsApi: Send + Sync {
    async fn list(&self, filters: &Filters) -> Result<ContractPage>;
    async fn get(&self, id: &ContractId) -> Result<Contract>;
    async fn create(&self, new: &NewContract) -> Result<Contract>;
    async fn update(&self, id: &ContractId, patch: &ContractPatch) -> Result<Contract>;
    async fn delete(&self, id: &ContractId) -> Result<DeleteResult>;
}

/// Decode one WebSocket text frame into an event.
pub fn decode_event_frame(frame: &str) -> Result<ContractEvent> {
    serde_json::from_str(frame).map_err(|e| ClientError::Decode(e.to_string()))
}

/// [`ContractsApi`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpContractsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContractsApi {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:4000/api";

    /// `base_url` is the prefix the `/contracts` routes hang off, e.g.
    /// `http://localhost:4000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, url: String, request: reqwest::RequestBuilder) -> Result<T> {
        debug!("Sending {}", url);
        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ClientError::Request {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .map(|body| body.error)
                .unwrap_or(raw);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl Default for HttpContractsApi {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl ContractsApi for HttpContractsApi {
    async fn list(&self, filters: &Filters) -> Result<ContractPage> {
        let url = self.url("/contracts");
        let request = self.client.get(&url).query(&filters.query_pairs());
        self.send(url, request).await
    }

    async fn get(&self, id: &ContractId) -> Result<Contract> {
        let url = self.url(&format!("/contracts/{id}"));
        let request = self.client.get(&url);
        self.send(url, request).await
    }

    async fn create(&self, new: &NewContract) -> Result<Contract> {
        let url = self.url("/contracts");
        let request = self.client.post(&url).json(new);
        self.send(url, request).await
    }

    async fn update(&self, id: &ContractId, patch: &ContractPatch) -> Result<Contract> {
        let url = self.url(&format!("/contracts/{id}"));
        let request = self.client.put(&url).json(patch);
        let body: UpdateResult = self.send(url, request).await?;
        body.result
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Decode("update returned no record".to_string()))
    }

    async fn delete(&self, id: &ContractId) -> Result<DeleteResult> {
        let url = self.url(&format!("/contracts/{id}"));
        let request = self.client.delete(&url);
        self.send(url, request).await
    }
}
