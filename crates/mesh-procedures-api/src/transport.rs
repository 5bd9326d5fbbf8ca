// crates/mesh-procedures-api/src/transport.rs
// ============================================================================
// Module: HTTP Transport
// Description: Blocking reqwest transport for the data mesh API.
// Purpose: Turn transport-neutral requests into HTTP calls and back.
// Dependencies: mesh-procedures-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! Requests are resolved against a base URL and always declare a JSON content
//! type. They carry the bearer token when logged in and the `x-account`
//! header when asked to, empty when no account is configured. Redirects are
//! never followed. Response bodies are read up to a fixed limit; anything that is
//! not JSON is kept as raw text with a `Null` body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use mesh_procedures_core::ApiRequest;
use mesh_procedures_core::ApiResponse;
use mesh_procedures_core::HttpMethod;
use mesh_procedures_core::MeshTransport;
use mesh_procedures_core::RequestAuth;
use mesh_procedures_core::RequestBody;
use mesh_procedures_core::TransportError;
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the account the calls act on.
pub const ACCOUNT_HEADER: &str = "x-account";
/// Content type of every request body.
const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: Url,
    /// Value of the `x-account` header; sent empty when unset.
    pub account: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Largest response body read, in bytes.
    pub max_response_bytes: usize,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl HttpTransportConfig {
    /// Creates settings with a 30 s timeout and a 4 MiB response limit.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            account: None,
            timeout: Duration::from_secs(30),
            max_response_bytes: 4 * 1024 * 1024,
            user_agent: "mesh-procedures/0.1".to_string(),
        }
    }

    /// Sets the account header value.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

/// Transport construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportBuildError {
    /// The base URL cannot anchor relative paths.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Underlying client.
    client: Client,
    /// Base URL with a trailing slash.
    base_url: Url,
    /// Account header value.
    account: Option<String>,
    /// Response size limit.
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Builds a transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportBuildError`] when the base URL is not http(s) or
    /// the client cannot be constructed.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let mut base_url = config.base_url;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(TransportBuildError::InvalidBaseUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|err| TransportBuildError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            account: config.account,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves the full URL of a request, query string included.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] when the path cannot be
    /// joined to the base URL.
    pub fn request_url(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for param in &request.query {
                pairs.append_pair(&param.name, &param.value);
            }
        }
        Ok(url)
    }

    /// Reads a response body up to the configured limit.
    fn read_body(&self, response: reqwest::blocking::Response) -> Result<String, TransportError> {
        let limit = self.max_response_bytes;
        if response.content_length().is_some_and(|length| length > limit as u64) {
            return Err(TransportError::ResponseTooLarge(format!("limit {limit} bytes")));
        }
        let mut bytes = Vec::new();
        response
            .take(limit as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| TransportError::Transport(err.to_string()))?;
        if bytes.len() > limit {
            return Err(TransportError::ResponseTooLarge(format!("limit {limit} bytes")));
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl MeshTransport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.request_url(request)?;
        let mut builder = self.client.request(method(request.method), url);
        if let RequestAuth::Bearer(token) = &request.auth {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
        }
        if request.include_account {
            builder = builder.header(ACCOUNT_HEADER, self.account.as_deref().unwrap_or_default());
        }
        builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let body = serde_json::to_vec(value)
                    .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;
                builder.body(body)
            }
            RequestBody::Raw(text) => builder.body(text.clone()),
        };
        let response = builder.send().map_err(|err| TransportError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let raw = self.read_body(response)?;
        Ok(ApiResponse::from_text(status, raw))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a core method to a reqwest method.
const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
