//! HTTP client for the livetrack server.

use anyhow::{Context, Result};
use livetrack_core::{Pilot, SchemaVersion};
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::stream::PilotStream;

/// Client for a livetrack server.
pub struct LivetrackClient {
    pub(crate) base_url: String,
    pub(crate) producer_token: Option<String>,
    pub(crate) client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SetPilotsResponse {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    version: SchemaVersion,
}

impl LivetrackClient {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            producer_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Token sent as `Authorization: Bearer` on producer calls.
    pub fn set_producer_token(&mut self, token: Option<String>) {
        self.producer_token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current pilot list.
    pub async fn list_pilots(&self) -> Result<Vec<Pilot>> {
        let url = format!("{}/v1/pilots", self.base_url);
        let response = check(self.client.get(&url).send().await?, "list pilots").await?;
        Ok(response.json().await?)
    }

    /// Schema version the server admits.
    pub async fn schema(&self) -> Result<SchemaVersion> {
        let url = format!("{}/v1/schema", self.base_url);
        let response = check(self.client.get(&url).send().await?, "get schema").await?;
        let body: SchemaResponse = response.json().await?;
        Ok(body.version)
    }

    /// Replace the server's list. Returns the number of pilots stored.
    pub async fn set_pilots(&self, records: &[Value]) -> Result<usize> {
        let url = format!("{}/v1/pilots", self.base_url);
        let request = self.producer(self.client.put(&url)).json(records);
        let response = check(request.send().await?, "set pilots").await?;
        let body: SetPilotsResponse = response.json().await?;
        Ok(body.count)
    }

    /// Insert or replace one pilot by name.
    pub async fn upsert_pilot(&self, record: &Value) -> Result<Pilot> {
        let url = format!("{}/v1/pilots", self.base_url);
        let request = self.producer(self.client.post(&url)).json(record);
        let response = check(request.send().await?, "upsert pilot").await?;
        Ok(response.json().await?)
    }

    /// Empty the server's list.
    pub async fn clear(&self) -> Result<()> {
        let url = format!("{}/v1/pilots", self.base_url);
        let request = self.producer(self.client.delete(&url));
        check(request.send().await?, "clear pilots").await?;
        Ok(())
    }

    /// Connect to the live stream of pilot lists.
    pub async fn connect_stream(&self) -> Result<PilotStream> {
        let url = build_ws_url(&self.base_url, "/v1/stream")?;
        PilotStream::connect(url).await
    }

    fn producer(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.producer_token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Turn non-2xx responses into errors that carry the server's message.
async fn check(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    anyhow::bail!("Failed to {}: {} {}", action, status, detail)
}

pub(crate) fn build_ws_url(base: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid server URL {base}"))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => other,
    }
    .to_string();

    url.set_scheme(&scheme)
        .map_err(|_| anyhow::anyhow!("Invalid base URL scheme"))?;
    url.set_path(path);
    Ok(url)
}
