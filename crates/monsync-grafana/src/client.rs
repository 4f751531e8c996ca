//! HTTP client for the Grafana API

use crate::error::{StoreError, StoreResult};
use crate::store::{DashboardStore, DashboardWrite, Folder, NewFolder, RemoteDashboard};
use async_trait::async_trait;
use monsync_types::AppliedDashboard;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Grafana HTTP API client
pub struct GrafanaApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    dashboard: Map<String, Value>,
    #[serde(default)]
    meta: DashboardMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardMeta {
    #[serde(default)]
    is_folder: bool,
    #[serde(default)]
    folder_id: Option<u64>,
}

impl GrafanaApiClient {
    /// Create a new client. Every request is bounded by `timeout`.
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for(response).await)
        }
    }

    async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> StoreResult<Option<T>> {
        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(error_for(response).await),
        }
    }

    async fn send_delete(&self, request: RequestBuilder) -> StoreResult<()> {
        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(error_for(response).await),
        }
    }
}

async fn error_for(response: Response) -> StoreError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::BAD_REQUEST => StoreError::BadRequest(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StoreError::Conflict(message),
        _ => StoreError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn remote_dashboard(uid: &str, response: DashboardResponse) -> StoreResult<RemoteDashboard> {
    let id = response
        .dashboard
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| StoreError::InvalidResponse(format!("dashboard {uid} has no numeric id")))?;
    let version = response
        .dashboard
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let remote_uid = response
        .dashboard
        .get("uid")
        .and_then(Value::as_str)
        .unwrap_or(uid)
        .to_string();

    Ok(RemoteDashboard {
        id,
        uid: remote_uid,
        version,
        is_folder: response.meta.is_folder,
        folder_id: response.meta.folder_id,
        model: response.dashboard,
    })
}

#[async_trait]
impl DashboardStore for GrafanaApiClient {
    // GET /api/folders/:uid
    async fn get_folder(&self, uid: &str) -> StoreResult<Option<Folder>> {
        self.send_optional(self.request(Method::GET, &format!("/api/folders/{}", uid)))
            .await
    }

    // POST /api/folders
    async fn create_folder(&self, folder: &NewFolder) -> StoreResult<Folder> {
        self.send(self.request(Method::POST, "/api/folders").json(folder))
            .await
    }

    // DELETE /api/folders/:uid
    async fn delete_folder(&self, uid: &str) -> StoreResult<()> {
        self.send_delete(self.request(Method::DELETE, &format!("/api/folders/{}", uid)))
            .await
    }

    // GET /api/dashboards/uid/:uid
    async fn get_dashboard(&self, uid: &str) -> StoreResult<Option<RemoteDashboard>> {
        let response: Option<DashboardResponse> = self
            .send_optional(self.request(Method::GET, &format!("/api/dashboards/uid/{}", uid)))
            .await?;
        response.map(|r| remote_dashboard(uid, r)).transpose()
    }

    // POST /api/dashboards/db
    async fn create_or_update_dashboard(
        &self,
        write: &DashboardWrite,
    ) -> StoreResult<AppliedDashboard> {
        self.send(self.request(Method::POST, "/api/dashboards/db").json(write))
            .await
    }

    // DELETE /api/dashboards/uid/:uid
    async fn delete_dashboard(&self, uid: &str) -> StoreResult<()> {
        self.send_delete(self.request(Method::DELETE, &format!("/api/dashboards/uid/{}", uid)))
            .await
    }
}
