//! # Scaleway HTTP Client
//!
//! Authenticated HTTP plumbing shared by the product APIs.

use anyhow::Context;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::DEFAULT_SCALEWAY_API_URL;
use crate::scaleway::Error;

const AUTH_HEADER: &str = "X-Auth-Token";

/// Authenticated Scaleway API client
///
/// Cheap to clone; the underlying HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    default_region: String,
}

impl Client {
    /// Build a client from the standard `SCW_*` environment variables
    ///
    /// `SCW_SECRET_KEY` is required; `SCW_API_URL` and `SCW_DEFAULT_REGION`
    /// are optional.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key =
            std::env::var("SCW_SECRET_KEY").context("SCW_SECRET_KEY must be set")?;
        let base_url = std::env::var("SCW_API_URL")
            .unwrap_or_else(|_| DEFAULT_SCALEWAY_API_URL.to_string());
        let default_region =
            std::env::var("SCW_DEFAULT_REGION").unwrap_or_else(|_| "fr-par".to_string());

        Ok(Self::new(base_url, secret_key, default_region))
    }

    /// Build a client with explicit credentials
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            default_region: default_region.into(),
        }
    }

    /// Returns the given region, or the configured default when empty
    pub fn region_or_default<'a>(&'a self, region: &'a str) -> &'a str {
        if region.is_empty() {
            &self.default_region
        } else {
            region
        }
    }

    /// Send a request and decode a JSON response
    pub(crate) async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, Error> {
        let response = self.send(method, path, body).await?;
        Ok(response.json().await?)
    }

    /// Send a request and discard the response body
    pub(crate) async fn request_empty<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), Error> {
        self.send(method, path, body).await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .header(AUTH_HEADER, &self.secret_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status, &text));
        }
        Ok(response)
    }
}
