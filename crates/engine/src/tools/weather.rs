use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{ToolErrorKind, ToolOutcome};
use crate::config::EngineConfig;

/// Current conditions for one location, in metric units.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub description: String,
    pub location: String,
    pub country: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("OPENWEATHER_API_KEY is not configured")]
    MissingApiKey,

    #[error("no weather data found for '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, location: &str) -> Result<CurrentConditions, WeatherError>;
}

#[derive(Deserialize, Debug)]
struct OwmResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    #[serde(default)]
    sys: Option<OwmSys>,
}

#[derive(Deserialize, Debug)]
struct OwmMain {
    temp: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct OwmWeather {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize, Debug)]
struct OwmSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OwmError {
    #[serde(default)]
    message: String,
}

/// OpenWeatherMap current-weather client.
pub struct OpenWeatherClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(config: &EngineConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent("Switchboard/0.1")
            .timeout(config.upstream_timeout)
            .connect_timeout(config.upstream_timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| {
                WeatherError::Unavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: config.openweather_api_key.clone(),
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn parse_conditions(
        location: &str,
        body: OwmResponse,
    ) -> Result<CurrentConditions, WeatherError> {
        let name = if body.name.is_empty() {
            location.to_string()
        } else {
            body.name
        };

        let temperature_c = body.main.and_then(|m| m.temp).ok_or_else(|| {
            WeatherError::Unavailable(format!("weather data for {} is missing temperature", name))
        })?;

        let description = body
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let country = body
            .sys
            .and_then(|s| s.country)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(CurrentConditions {
            temperature_c,
            description,
            location: name,
            country,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<CurrentConditions, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherError::Unavailable("weather provider timed out".to_string())
                } else {
                    WeatherError::Unavailable(format!("weather provider unreachable: {}", e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound(location.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OwmError>(&text)
                .map(|e| e.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.to_string());
            return Err(WeatherError::Unavailable(format!(
                "weather provider returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body = response
            .json::<OwmResponse>()
            .await
            .map_err(|e| WeatherError::Unavailable(format!("unreadable weather data: {}", e)))?;

        Self::parse_conditions(location, body)
    }
}

pub struct WeatherTool {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherTool {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, location: &str) -> ToolOutcome {
        match self.provider.current(location).await {
            Ok(c) => ToolOutcome::Success(format!(
                "It's {:.2}°C and {} in {}, {}.",
                c.temperature_c, c.description, c.location, c.country
            )),
            Err(WeatherError::MissingApiKey) => ToolOutcome::failure(
                ToolErrorKind::MissingCredential,
                WeatherError::MissingApiKey.to_string(),
            ),
            Err(e @ WeatherError::NotFound(_)) => {
                ToolOutcome::failure(ToolErrorKind::LocationNotFound, e.to_string())
            }
            Err(e @ WeatherError::Unavailable(_)) => {
                log::warn!("Weather lookup for '{}' failed: {}", location, e);
                ToolOutcome::failure(ToolErrorKind::UpstreamUnavailable, e.to_string())
            }
        }
    }
}
