use std::sync::Arc;

use reqwest::{Client, Method, Response};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::auth::{Anonymous, AuthProvider};

/// Base URL the helper points at when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

/// Errors produced while issuing a request.
///
/// A response that arrives with a non-success status is not an error here;
/// the helper hands it back untouched and the caller decides what it means.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Thin wrapper around [`reqwest::Client`] exposing one method per verb.
///
/// Each call resolves its path against the configured base URL, attaches the
/// `authorization` header from the [`AuthProvider`], serializes the optional
/// payload as JSON and returns whatever response the server sent. No
/// retries, no timeouts, no status interpretation.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth: Arc<dyn AuthProvider>,
}

impl ApiClient {
    /// Creates a helper for the given base URL with the default anonymous
    /// authorization provider.
    pub fn new(base_url: Url) -> Self {
        Self::with_auth(base_url, Arc::new(Anonymous))
    }

    /// Creates a helper that sources its `authorization` header from the
    /// given provider.
    pub fn with_auth(base_url: Url, auth: Arc<dyn AuthProvider>) -> Self {
        Self::with_http(base_url, Client::new(), auth)
    }

    /// Full constructor taking an existing HTTP client, for callers that
    /// share one connection pool across several helpers.
    pub fn with_http(base_url: Url, http: Client, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            http,
            base_url,
            auth,
        }
    }

    pub async fn get(&self, path: &str, payload: Option<&Value>) -> Result<Response, ClientError> {
        self.request(Method::GET, path, payload).await
    }

    pub async fn delete(
        &self,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Response, ClientError> {
        self.request(Method::DELETE, path, payload).await
    }

    pub async fn post(&self, path: &str, payload: Option<&Value>) -> Result<Response, ClientError> {
        self.request(Method::POST, path, payload).await
    }

    pub async fn put(&self, path: &str, payload: Option<&Value>) -> Result<Response, ClientError> {
        self.request(Method::PUT, path, payload).await
    }

    pub async fn patch(
        &self,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Response, ClientError> {
        self.request(Method::PATCH, path, payload).await
    }

    /// Issues a single request with the given method.
    ///
    /// `Some(payload)` becomes a JSON body, `None` sends no body at all.
    async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let url = self.base_url.join(path)?;
        let mut request = self
            .http
            .request(method, url)
            .header("authorization", self.auth.authorization_value());
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        Ok(request.send().await?)
    }
}
