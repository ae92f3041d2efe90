//! [`ResourceSource`] over the console's `describe*` endpoints.

use std::marker::PhantomData;

use console_core::ResourceKind;
use console_query::{ConsoleConfig, FetchError, FetchPage, FetchParams, ResourceSource};
use serde::de::DeserializeOwned;

/// Endpoint listing resources of `kind`.
pub fn describe_path(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Sessions => "describeSessions",
        ResourceKind::Servers => "describeServers",
        ResourceKind::Users => "describeUsers",
        ResourceKind::UserGroups => "describeUserGroups",
        ResourceKind::SessionTemplates => "describeSessionTemplates",
    }
}

/// Client for one resource list of the console API.
pub struct RestSource<T> {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    _item: PhantomData<fn() -> T>,
}

impl<T> RestSource<T> {
    pub fn new(config: &ConsoleConfig, kind: ResourceKind) -> Self {
        Self::with_client(reqwest::Client::new(), config, kind)
    }

    pub fn with_client(client: reqwest::Client, config: &ConsoleConfig, kind: ResourceKind) -> Self {
        Self {
            client,
            url: format!("{}/{}", config.api_url, describe_path(kind)),
            token: config.api_token.clone(),
            _item: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl<T> ResourceSource<T> for RestSource<T>
where
    T: DeserializeOwned + Send,
{
    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<T>, FetchError> {
        let mut req = self.client.post(&self.url).json(&params);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::warn!(url = %self.url, status = status.as_u16(), %message, "describe request rejected");
            return Err(FetchError::api(status.as_u16(), message));
        }

        resp.json::<FetchPage<T>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Server message from an error body: the `message` or `error` field of a
/// JSON payload, else the raw text. `None` for an empty body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(payload)) = serde_json::from_str(body) {
        let field = ["message", "error"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(|v| v.as_str()));
        if let Some(msg) = field {
            return Some(msg.to_string());
        }
    }

    Some(body.to_string())
}
