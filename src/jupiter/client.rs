use crate::jupiter::{QuoteRequest, QuoteResponse, SwapAggregator, SwapRequest, SwapResponse};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Jupiter v6 quote/swap API.
pub struct JupiterClient {
    pub name: String,
    pub base_url: String,
    headers: HeaderMap,
    client: Client,
}

impl JupiterClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            headers.insert("x-api-key", HeaderValue::from_str(&key)?);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            name: "jupiter".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl SwapAggregator for JupiterClient {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse> {
        debug!("Requesting Jupiter quote: {:?}", request);

        let resp = self
            .client
            .get(self.url("quote"))
            .headers(self.headers.clone())
            .query(request)
            .send()
            .await?;

        read_json(resp, "quote").await
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapResponse> {
        debug!("Requesting Jupiter swap transaction for {}", request.user_public_key);

        let resp = self
            .client
            .post(self.url("swap"))
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        read_json(resp, "swap").await
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(anyhow!("{} request failed ({}): {}", what, status, api_message(&text)));
    }

    // Some failures come back as 200 with an `error` field.
    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(&text) {
        if let Some(err) = body.get("error").and_then(Value::as_str) {
            return Err(anyhow!("{} request failed: {}", what, err));
        }
    }

    serde_json::from_str(&text).map_err(|e| anyhow!("invalid {} response: {}", what, e))
}

fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
