use std::time::Duration;

use reqwest::{Client, Request};
use safer_core::error::AppError;
use safer_core::models::QueryRequest;
use safer_core::traits::Fetcher;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("safer-snapshot/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher using reqwest.
///
/// Submits the query as a form-encoded POST. The response status is not
/// treated as an error: whatever page comes back is handed to the parser,
/// which reports a structure mismatch if it is not a carrier snapshot.
///
/// reqwest sends no User-Agent of its own, so the client identifies itself
/// as `safer-snapshot/<version>`; this is the only header added on top of
/// the form content type.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
    endpoint: Option<Url>,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
            endpoint: None,
        })
    }

    /// Send queries to `endpoint` instead of the URL carried by the request.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, AppError> {
        let url = Url::parse(endpoint)
            .map_err(|e| AppError::ConfigError(format!("Invalid endpoint '{endpoint}': {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::ConfigError(format!(
                    "Endpoint scheme '{scheme}' is not allowed (only http/https)"
                )));
            }
        }

        self.endpoint = Some(url);
        Ok(self)
    }

    /// Build the POST without sending it.
    pub fn build_request(&self, request: &QueryRequest) -> Result<Request, AppError> {
        let url = match &self.endpoint {
            Some(endpoint) => endpoint.as_str(),
            None => request.url.as_str(),
        };

        self.client
            .post(url)
            .form(&request.form_fields())
            .build()
            .map_err(|e| AppError::HttpError(format!("Failed to build request: {e}")))
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &QueryRequest) -> Result<String, AppError> {
        let http_request = self.build_request(request)?;
        let url = http_request.url().to_string();

        let response = self.client.execute(http_request).await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Non-success status from {}, parsing anyway", url);
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}
