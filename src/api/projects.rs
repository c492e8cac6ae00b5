//! Managed channels ("projects") and their external-account authorization.

use super::envelope::Envelope;
use crate::client::{ApiClient, RequestOptions};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Interval between authorization status polls
pub const AUTHORIZE_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// How long an authorization is waited for before giving up
pub const AUTHORIZE_POLL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub auth_status: i64,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub channel_country: Option<String>,
    #[serde(default)]
    pub channel_published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Project {
    pub fn is_authorized(&self) -> bool {
        self.auth_status != 0
    }
}

/// Body of create and update calls
#[derive(Debug, Clone, Serialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: String,
}

impl ProjectInput {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self, AppError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::InvalidRequest("Project name must not be empty".to_string()));
        }
        Ok(Self {
            name,
            description: description.into(),
        })
    }
}

pub async fn list_projects(client: &ApiClient) -> Result<Vec<Project>, AppError> {
    let envelope: Envelope<Vec<Project>> = client.get("/project", RequestOptions::new()).await?;
    envelope.into_response_or_default()
}

pub async fn create_project(client: &ApiClient, input: &ProjectInput) -> Result<(), AppError> {
    let envelope: Envelope<Value> = client.post("/project", input, RequestOptions::new()).await?;
    envelope.check()
}

pub async fn update_project(client: &ApiClient, id: i64, input: &ProjectInput) -> Result<(), AppError> {
    let envelope: Envelope<Value> = client
        .put(&format!("/project/{}", id), input, RequestOptions::new())
        .await?;
    envelope.check()
}

pub async fn delete_project(client: &ApiClient, id: i64) -> Result<(), AppError> {
    let envelope: Envelope<Value> = client
        .delete(&format!("/project/{}", id), RequestOptions::new())
        .await?;
    envelope.check()
}

/// URL the user must open to grant the project access to their channel
pub async fn authorization_url(client: &ApiClient, id: i64) -> Result<String, AppError> {
    let envelope: Envelope<String> = client
        .get(&format!("/googleAuth/authorize/{}", id), RequestOptions::new())
        .await?;
    match envelope.into_response() {
        Ok(url) if !url.is_empty() => Ok(url),
        Ok(_) => Err(AppError::InvalidRequest(
            "Server returned an empty authorization URL".to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// Poll the project list until the project reports as authorized.
///
/// Returns the authorized project, or `None` once `timeout` elapses. Poll
/// failures are skipped, except an expired session which ends the wait.
pub async fn wait_for_authorization(
    client: &ApiClient,
    id: i64,
    interval: Duration,
    timeout: Duration,
) -> Result<Option<Project>, AppError> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        if tokio::time::Instant::now() >= deadline {
            return Ok(None);
        }

        match list_projects(client).await {
            Ok(projects) => {
                if let Some(project) = projects.into_iter().find(|p| p.id == id) {
                    if project.is_authorized() {
                        tracing::info!(project_id = id, "Project authorized");
                        return Ok(Some(project));
                    }
                }
            }
            Err(e) if e.is_session_expired() => return Err(e),
            Err(e) => tracing::debug!(project_id = id, error = %e, "Authorization poll failed"),
        }
    }
}

/// Trigger a full data sync for the project's channel
pub async fn sync_project(client: &ApiClient, id: i64) -> Result<(), AppError> {
    let envelope: Envelope<Value> = client
        .get(&format!("/data/sync-all/{}", id), RequestOptions::new())
        .await?;
    envelope.check()
}
