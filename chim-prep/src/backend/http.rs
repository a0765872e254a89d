//! REST client for the importer endpoints

use super::{BackendError, ImportBackend};
use async_trait::async_trait;
use chim_common::config::ClientConfig;
use chim_common::models::{
    CurrentOperationResponse, ErrorEnvelope, ImportFileData, StartImportRequest,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

pub(crate) const USER_AGENT: &str = concat!("chim-prep/", env!("CARGO_PKG_VERSION"));
const API_PREFIX: &str = "/api/v1";

/// HTTP implementation of [`ImportBackend`]
#[derive(Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(auth_headers(config)?)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL of an API endpoint, e.g. `endpoint("startImport")`
    pub fn endpoint(&self, name: &str) -> String {
        api_url(&self.base_url, name)
    }

    async fn get_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, BackendError> {
        let url = self.endpoint(name);
        debug!(url = %url, "GET");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        decode_body(response).await
    }
}

#[async_trait]
impl ImportBackend for HttpBackend {
    async fn get_import_file_data(&self) -> Result<Option<ImportFileData>, BackendError> {
        match self.get_json::<Option<ImportFileData>>("getImportFileData").await {
            Err(BackendError::Api { status: 404, .. }) => Ok(None),
            other => other,
        }
    }

    async fn get_current_import_operation(
        &self,
    ) -> Result<CurrentOperationResponse, BackendError> {
        self.get_json("getCurrentImportOperation").await
    }

    async fn start_import(&self, request: &StartImportRequest) -> Result<(), BackendError> {
        let url = self.endpoint("startImport");
        debug!(
            url = %url,
            users = request.input.users.len(),
            channels = request.input.channels.len(),
            "POST"
        );
        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

pub(crate) fn api_url(server_url: &str, name: &str) -> String {
    format!("{}{}/{}", server_url.trim_end_matches('/'), API_PREFIX, name)
}

/// `X-User-Id`/`X-Auth-Token` when both are configured
pub(crate) fn auth_headers(config: &ClientConfig) -> Result<HeaderMap, BackendError> {
    let mut headers = HeaderMap::new();
    if let (Some(user_id), Some(token)) = (&config.user_id, &config.auth_token) {
        headers.insert("X-User-Id", header_value(user_id)?);
        headers.insert("X-Auth-Token", header_value(token)?);
    }
    Ok(headers)
}

fn header_value(raw: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(raw)
        .map_err(|_| BackendError::Parse("credential contains invalid header characters".into()))
}

async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Build an `Api` error, pulling the server's message out of the envelope
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error),
        Err(_) => None,
    };
    BackendError::Api {
        status: status.as_u16(),
        message: message.filter(|m| !m.trim().is_empty()),
    }
}
