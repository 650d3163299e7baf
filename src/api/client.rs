//! Site API client with request/response handling.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::{DeployError, Result};
use crate::http::HttpClient;
use crate::secret::Password;

/// Path of the authentication endpoint, relative to the site URL
const AUTH_ENDPOINT: &str = "_api/auth";

/// Path of the batch endpoint, relative to the site URL
const BATCH_ENDPOINT: &str = "_api/batch";

/// Body of a successful authentication.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// The `error` member of a failed result entry.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(default)]
    message: String,
}

/// Site API client.
#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
    site: Url,
    request_id: u32,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for `site`.
    pub fn new(site: Url, http: HttpClient) -> Self {
        Self {
            http,
            site,
            request_id: rand::random(),
            token: None,
        }
    }

    /// Set the bearer token for authenticated requests.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.site.as_str().trim_end_matches('/'), path)
    }

    /// Authenticate and keep the returned token.
    pub async fn login(&mut self, user: &str, password: &Password) -> Result<()> {
        let url = self.endpoint(AUTH_ENDPOINT);
        let body = json!({ "user": user, "password": password.expose() }).to_string();

        debug!(user, url = %url, "authenticating");
        let response_text = match self.http.post(&url, body, None, &[]).await {
            Err(DeployError::HttpError(code @ (401 | 403))) => {
                return Err(DeployError::AuthFailed(format!(
                    "site rejected the credentials of {} (HTTP {})",
                    user, code
                )));
            }
            other => other?,
        };

        let response: Value = serde_json::from_str(&response_text)?;
        if let Some(DeployError::Server { message, .. }) = server_error(&response) {
            return Err(DeployError::AuthFailed(message));
        }

        let auth: AuthResponse = serde_json::from_value(response)
            .map_err(|_| DeployError::InvalidResponse("auth response has no token".into()))?;
        self.set_token(auth.token);
        Ok(())
    }

    /// Send a batch of commands as a single request.
    ///
    /// # Arguments
    /// * `commands` - JSON command objects, executed by the site in order
    /// * `headers` - Extra request headers
    ///
    /// # Returns
    /// One result entry per command, in command order
    pub async fn request_batch(
        &mut self,
        commands: Vec<Value>,
        headers: &[(&'static str, String)],
    ) -> Result<Vec<Value>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        self.request_id = self.request_id.wrapping_add(1);
        let url = format!("{}?id={}", self.endpoint(BATCH_ENDPOINT), self.request_id);
        let body = serde_json::to_string(&commands)?;

        debug!(
            url = %url,
            commands = commands.len(),
            bytes = body.len(),
            "sending batch"
        );
        let response_text = self
            .http
            .post(&url, body, self.token.as_deref(), headers)
            .await?;
        debug!(bytes = response_text.len(), "batch response");

        let response: Value = serde_json::from_str(&response_text)?;
        if let Some(err) = server_error(&response) {
            return Err(err);
        }

        match response {
            Value::Array(entries) if entries.len() == commands.len() => Ok(entries),
            Value::Array(entries) => Err(DeployError::InvalidResponse(format!(
                "expected {} results, got {}",
                commands.len(),
                entries.len()
            ))),
            _ => Err(DeployError::InvalidResponse(
                "batch response is not an array".into(),
            )),
        }
    }
}

/// Extract the `{"error": {"type": .., "message": ..}}` failure of a result entry.
pub fn server_error(entry: &Value) -> Option<DeployError> {
    let error = entry.get("error")?;
    let body = ErrorBody::deserialize(error).unwrap_or_default();
    Some(DeployError::server(
        body.type_name.unwrap_or_else(|| "ServerError".to_string()),
        body.message,
    ))
}
