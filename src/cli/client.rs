use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Thin client for the `/api` surface, unwrapping `{success, data}` envelopes
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(server).with_context(|| format!("invalid server URL '{}'", server))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("bulkctl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid API path '{}'", path))
    }

    fn token(&self) -> anyhow::Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| anyhow!("a bearer token is required (--token or BULKCTL_TOKEN)"))
    }

    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>, mapping: Option<&Value>) -> anyhow::Result<Value> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(mapping) = mapping {
            form = form.text("columnMapping", mapping.to_string());
        }

        let res = self
            .http
            .post(self.url("/api/csv/upload")?)
            .bearer_auth(self.token()?)
            .multipart(form)
            .send()
            .await?;
        data(res).await
    }

    pub async fn process(&self, body: &Value) -> anyhow::Result<Value> {
        let res = self
            .http
            .post(self.url("/api/csv/process")?)
            .bearer_auth(self.token()?)
            .json(body)
            .send()
            .await?;
        data(res).await
    }

    pub async fn progress<T: DeserializeOwned>(&self, job_id: &str) -> anyhow::Result<T> {
        let res = self
            .http
            .get(self.url(&format!("/api/csv/process/{}", job_id))?)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        data(res).await
    }

    pub async fn export(&self, query: &[(&str, String)]) -> anyhow::Result<String> {
        let res = self
            .http
            .get(self.url("/api/csv/export")?)
            .bearer_auth(self.token()?)
            .query(query)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(envelope_error(res).await);
        }
        Ok(res.text().await?)
    }
}

async fn data<T: DeserializeOwned>(res: Response) -> anyhow::Result<T> {
    if !res.status().is_success() {
        return Err(envelope_error(res).await);
    }

    let mut body: Value = res.json().await.context("server returned invalid JSON")?;
    let data = body
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| anyhow!("response envelope has no data"))?;
    Ok(serde_json::from_value(data)?)
}

async fn envelope_error(res: Response) -> anyhow::Error {
    let status = res.status();
    let body: Value = match res.json().await {
        Ok(body) => body,
        Err(_) => return anyhow!("HTTP {}", status),
    };

    let message = body.get("error").and_then(Value::as_str).unwrap_or("request failed");
    match body.get("code").and_then(Value::as_str) {
        Some(code) => anyhow!("HTTP {} {}: {}", status.as_u16(), code, message),
        None => anyhow!("HTTP {}: {}", status.as_u16(), message),
    }
}

