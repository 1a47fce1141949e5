//! The single HTTP entry point to the backend.
//!
//! Every call goes through [`RequestGateway`]: it joins the path onto the
//! configured base address, builds the request with JSON defaults, lets the
//! registered [`RequestInterceptor`]s adjust the built request, and only then
//! sends it. The bearer token is therefore looked up when a request is sent,
//! never when it is constructed.

use crate::core::session::SessionStore;
use crate::utils::url::{construct_api_url, normalize_base_url};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Failures of a gateway call.
#[derive(Debug)]
pub enum ApiError {
    /// The request never reached the backend, or no response came back.
    Network(reqwest::Error),
    /// The backend answered with a non-success status.
    Rejected { status: StatusCode, message: String },
    /// A success response whose body does not have the expected shape.
    MalformedResponse {
        path: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    /// The backend's own message for a rejection, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => {
                Some(message.trim())
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(err) => err.status(),
            ApiError::MalformedResponse { .. } => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(err) => write!(f, "Could not reach the server: {err}"),
            ApiError::Rejected { status, message } if message.trim().is_empty() => {
                write!(f, "Server rejected the request with status {status}")
            }
            ApiError::Rejected { status, message } => {
                write!(f, "Server rejected the request with status {status}: {}", message.trim())
            }
            ApiError::MalformedResponse { path, source } => {
                write!(f, "Unexpected response from {path}: {source}")
            }
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Network(err) => Some(err),
            ApiError::Rejected { .. } => None,
            ApiError::MalformedResponse { source, .. } => Some(source),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err)
    }
}

/// Transforms every outbound request right before it is sent.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut Request);
}

/// Adds `Authorization: Bearer <token>` from the current session, if any.
pub struct BearerAuth {
    session: Arc<dyn SessionStore>,
}

impl BearerAuth {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

impl RequestInterceptor for BearerAuth {
    fn intercept(&self, request: &mut Request) {
        let Some(record) = self.session.read() else {
            return;
        };
        let Some(token) = record.bearer_token() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => debug!("Stored token is not a valid header value; sending without it"),
        }
    }
}

/// Configured HTTP client for the backend. Cheap to clone.
#[derive(Clone)]
pub struct RequestGateway {
    client: Client,
    base_url: String,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl RequestGateway {
    /// Gateway whose requests carry the bearer token of `session`.
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url).with_interceptor(BearerAuth::new(session)))
    }

    /// Gateway over a preconfigured client, with no interceptors yet.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Builds the request, runs the interceptors, sends it and decodes the body.
    pub async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let request = self.prepare(method, path, body)?;
        debug!(method = %request.method(), url = %request.url(), "Sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(%status, path, "Backend rejected request");
            return Err(ApiError::Rejected {
                status,
                message: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| ApiError::MalformedResponse {
            path: path.to_string(),
            source,
        })
    }

    /// The request exactly as it would go on the wire.
    pub fn prepare<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request, ApiError> {
        let url = construct_api_url(&self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .headers(default_headers());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let mut request = builder.build()?;
        for interceptor in &self.interceptors {
            interceptor.intercept(&mut request);
        }
        Ok(request)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}
