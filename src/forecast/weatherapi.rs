use super::types::ForecastResponse;
use crate::config::Config;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
}

pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(config: &Config) -> Result<Self, WeatherApiError> {
        let client = Client::builder()
            .user_agent("WeatherAlertBot/1.0")
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.weatherapi_base_url.clone(),
            api_key: config.weatherapi_key.clone(),
        })
    }

    /// Fetches a 7-day forecast with air quality and weather alerts included.
    pub async fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<ForecastResponse, WeatherApiError> {
        let url = format!("{}/v1/forecast.json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", &format!("{},{}", lat, lon)),
                ("days", "7"),
                ("aqi", "yes"),
                ("alerts", "yes"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherApiError::ApiError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}
