//! HTTP client wrapper for site requests.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::{DeployError, Result};

/// HTTP client for making requests to the site.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, timeout })
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(proxy: &str, timeout: Duration) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| DeployError::Validation(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder().proxy(proxy).build()?;

        Ok(Self { client, timeout })
    }

    /// Make a POST request with JSON body.
    ///
    /// # Arguments
    /// * `url` - URL to post to
    /// * `body` - JSON body as string
    /// * `token` - Bearer token, if authenticated
    /// * `extra` - Additional headers
    ///
    /// # Returns
    /// Response body as string
    pub async fn post(
        &self,
        url: &str,
        body: String,
        token: Option<&str>,
        extra: &[(&'static str, String)],
    ) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| DeployError::AuthFailed("token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DeployError::Validation(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| DeployError::Validation(format!("Invalid header value: {}", value)))?;
            headers.insert(name, value);
        }

        let send = self.client.post(url).headers(headers).body(body).send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| DeployError::Timeout)??;

        if !response.status().is_success() {
            return Err(DeployError::HttpError(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}
