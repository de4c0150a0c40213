use anyhow::{Context, Result};
use futures_util::StreamExt;
use serde_json::Value;
use switchboard_shared::{FunctionDeclaration, QueryRequest, RoutedResponse};

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Posts one query and returns the raw JSON line the router streamed back.
    pub async fn query_raw(&self, query: &str) -> Result<String> {
        let url = format!("{}/query", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&QueryRequest::new(query))
            .send()
            .await
            .with_context(|| format!("Failed to reach router at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"].as_str().unwrap_or("no details");
            anyhow::bail!("Request failed ({}): {}", status, message);
        }

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
            if let Some(line) = take_line(&mut buffer) {
                return Ok(line);
            }
        }

        // Tolerate a body that ends without the trailing newline.
        let rest = String::from_utf8_lossy(&buffer).trim().to_string();
        if rest.is_empty() {
            anyhow::bail!("Router closed the stream without a response");
        }
        Ok(rest)
    }

    pub async fn query(&self, query: &str) -> Result<RoutedResponse> {
        let line = self.query_raw(query).await?;
        serde_json::from_str(&line).context("Router sent a malformed response")
    }

    pub async fn tools(&self) -> Result<Vec<FunctionDeclaration>> {
        let url = format!("{}/tools", self.base_url);
        let tools = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<FunctionDeclaration>>()
            .await?;
        Ok(tools)
    }

    pub async fn health(&self) -> Result<String> {
        let body = self
            .client
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(body["message"].as_str().unwrap_or_default().to_string())
    }
}

/// Removes and returns the first complete, non-blank line in `buffer`.
fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
        let line = String::from_utf8_lossy(&line).trim().to_string();
        if !line.is_empty() {
            return Some(line);
        }
    }
    None
}
