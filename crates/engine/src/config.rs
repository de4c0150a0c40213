use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Placeholder values shipped in sample `.env` files. Treated as unset.
const PLACEHOLDER_KEYS: &[&str] = &["YOUR_GOOGLE_API_KEY", "YOUR_OPENWEATHER_API_KEY"];

/// Process-wide configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub google_api_key: Option<String>,
    pub openweather_api_key: Option<String>,
    pub addr: SocketAddr,
    pub model: String,
    pub upstream_timeout: Duration,
    pub gemini_base_url: String,
    pub openweather_base_url: String,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let credential = |key: &str| value(key).filter(|v| !PLACEHOLDER_KEYS.contains(&v.as_str()));

        let addr = value("SWITCHBOARD_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("SWITCHBOARD_ADDR must be a socket address like 0.0.0.0:8080")?;

        let timeout_secs = match value("SWITCHBOARD_UPSTREAM_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("SWITCHBOARD_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("SWITCHBOARD_UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            google_api_key: credential("GOOGLE_API_KEY"),
            openweather_api_key: credential("OPENWEATHER_API_KEY"),
            addr,
            model: value("SWITCHBOARD_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            upstream_timeout: Duration::from_secs(timeout_secs),
            gemini_base_url: value("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            openweather_base_url: value("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
        })
    }

    /// Log which handlers will fail for lack of credentials.
    pub fn warn_missing_credentials(&self) {
        if self.google_api_key.is_none() {
            log::warn!("GOOGLE_API_KEY is not set; classification and llm answers will fail");
        }
        if self.openweather_api_key.is_none() {
            log::warn!("OPENWEATHER_API_KEY is not set; weather lookups will fail");
        }
    }
}
