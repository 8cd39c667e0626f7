//! `reqwest`-backed remote store.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use lineitems_auth::{RoleResolutionError, RoleResolver};
use lineitems_core::{LineItemId, ParentId};
use lineitems_sales::LineItem;

use crate::api::LineItemApi;
use crate::config::ClientConfig;
use crate::error::RemoteError;

/// HTTP client for the line-item API. No retries; every failure is reported
/// to the caller as a [`RemoteError`].
#[derive(Debug, Clone)]
pub struct HttpLineItemApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElevatedRoleResponse {
    elevated: bool,
}

impl HttpLineItemApi {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(api_url)
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.api_token {
            Some(token) => Self::with_token(&config.api_url, token),
            None => Self::new(&config.api_url),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Resolve `segments` under the API root. Each segment is percent-encoded
    /// separately; a `/` inside an id becomes `%2F`.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(RemoteError::InvalidRequest(format!(
                "'{dot}' is not a valid path segment"
            )));
        }

        let mut url = Url::parse(&self.api_url).map_err(|e| {
            RemoteError::InvalidRequest(format!("bad API URL '{}': {e}", self.api_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                RemoteError::InvalidRequest(format!("API URL '{}' cannot carry a path", self.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteError> {
        let req = self.client.request(method, self.url(segments)?);
        Ok(match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send(&self, req: RequestBuilder, subject: &str) -> Result<Response, RemoteError> {
        let resp = req
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            return Err(RemoteError::Api(
                status.as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        subject: &str,
    ) -> Result<T, RemoteError> {
        let resp = self.send(self.request(Method::GET, segments)?, subject).await?;
        resp.json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LineItemApi for HttpLineItemApi {
    async fn fetch_line_items(&self, parent_id: &ParentId) -> Result<Vec<LineItem>, RemoteError> {
        let items: Vec<LineItem> = self
            .get_json(&["parents", parent_id.as_str(), "line-items"], parent_id.as_str())
            .await?;
        tracing::debug!(%parent_id, count = items.len(), "fetched line items");
        Ok(items)
    }

    async fn delete_line_item(&self, line_item_id: &LineItemId) -> Result<(), RemoteError> {
        let req = self.request(Method::DELETE, &["line-items", line_item_id.as_str()])?;
        self.send(req, line_item_id.as_str()).await?;
        Ok(())
    }
}

#[async_trait]
impl RoleResolver for HttpLineItemApi {
    async fn check_elevated_role(&self) -> Result<bool, RoleResolutionError> {
        let resp: ElevatedRoleResponse = self
            .get_json(&["me", "elevated-role"], "elevated role")
            .await
            .map_err(|e| RoleResolutionError::Remote(e.to_string()))?;
        Ok(resp.elevated)
    }
}
