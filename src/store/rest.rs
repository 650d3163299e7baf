//! Remote store backed by the site's HTTP batch endpoint.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use super::{
    Batch, CommitReport, ExistingFolderPolicy, FolderInfo, OpenHandles, PendingOperation,
    RemoteStore, aggregate_failures,
};
use crate::api::{ApiClient, server_error};
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::http::HttpClient;
use crate::secret::Password;

/// Header telling the site how to treat creates of folders that already exist
const EXISTING_FOLDERS_HEADER: &str = "x-existing-folders";

/// HTTP-backed remote store.
#[derive(Debug)]
pub struct RestStore {
    api: ApiClient,
    policy: ExistingFolderPolicy,
}

impl RestStore {
    /// Wrap an already authenticated client.
    pub fn new(api: ApiClient, policy: ExistingFolderPolicy) -> Self {
        Self { api, policy }
    }

    /// Build a client from `config` and authenticate against the site.
    pub async fn connect(config: &DeployConfig) -> Result<Self> {
        let http = match &config.proxy {
            Some(proxy) => HttpClient::with_proxy(proxy, config.timeout)?,
            None => HttpClient::new(config.timeout)?,
        };
        Self::open(
            config.site_url.clone(),
            http,
            &config.user,
            &config.password,
            config.existing_folders,
        )
        .await
    }

    /// Authenticate against `site` over `http`.
    pub async fn open(
        site: Url,
        http: HttpClient,
        user: &str,
        password: &Password,
        policy: ExistingFolderPolicy,
    ) -> Result<Self> {
        let mut api = ApiClient::new(site.clone(), http);
        api.login(user, password).await?;
        info!(site = %site, user, "connected");
        Ok(Self::new(api, policy))
    }

    fn headers(&self) -> [(&'static str, String); 1] {
        [(EXISTING_FOLDERS_HEADER, self.policy.as_str().to_string())]
    }
}

/// Wire command for one pending operation. Upload content is read here.
async fn encode_operation(op: &PendingOperation, handles: &mut OpenHandles) -> Result<Value> {
    match op {
        PendingOperation::CreateFolder { parent, name } => Ok(json!({
            "a": "folder.create",
            "parent": parent.as_ref().map(|p| p.path()),
            "name": name,
        })),
        PendingOperation::UploadFile {
            parent,
            name,
            handle,
            overwrite,
        } => {
            let content = handles.read_all(*handle).await?;
            Ok(json!({
                "a": "file.add",
                "parent": parent.path(),
                "name": name,
                "overwrite": overwrite,
                "size": content.len(),
                "content": general_purpose::STANDARD.encode(&content),
            }))
        }
    }
}

/// Fold per-operation results into a report or one aggregated failure.
fn collect_results(operations: &[PendingOperation], results: &[Value]) -> Result<CommitReport> {
    let mut report = CommitReport::default();
    let mut failures = Vec::new();

    for (op, entry) in operations.iter().zip(results) {
        if let Some(err) = server_error(entry) {
            debug!(target_path = %op.target_path(), error = %err, "operation failed");
            failures.push(err);
            continue;
        }
        match op {
            PendingOperation::CreateFolder { .. } => {
                if entry.get("created").and_then(|v| v.as_bool()) != Some(false) {
                    report.folders_created += 1;
                }
            }
            PendingOperation::UploadFile { .. } => {
                report.files_uploaded += 1;
                report.bytes_uploaded += entry.get("size").and_then(|v| v.as_u64()).unwrap_or(0);
            }
        }
    }

    aggregate_failures(failures, operations.len())?;
    Ok(report)
}

#[async_trait]
impl RemoteStore for RestStore {
    fn store_type(&self) -> &'static str {
        "rest"
    }

    async fn load_folder(&mut self, path: &str) -> Result<FolderInfo> {
        let headers = self.headers();
        let results = self
            .api
            .request_batch(vec![json!({ "a": "folder.get", "path": path })], &headers)
            .await?;

        let entry = results
            .first()
            .ok_or_else(|| DeployError::InvalidResponse("empty lookup response".into()))?;
        if let Some(err) = server_error(entry) {
            return Err(err);
        }

        Ok(FolderInfo {
            path: entry
                .get("path")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| path.to_string()),
            item_count: entry.get("items").and_then(|v| v.as_u64()).unwrap_or(0),
        })
    }

    async fn commit(&mut self, batch: Batch, handles: &mut OpenHandles) -> Result<CommitReport> {
        let operations = batch.into_operations();
        let mut commands = Vec::with_capacity(operations.len());
        for op in &operations {
            commands.push(encode_operation(op, handles).await?);
        }

        let headers = self.headers();
        let results = self.api.request_batch(commands, &headers).await?;
        collect_results(&operations, &results)
    }
}
