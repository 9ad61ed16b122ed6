use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub weatherapi_key: String,
    pub weatherapi_base_url: String,
    pub telegram_bot_token: String,
    pub telegram_base_url: String,
    pub telegram_chat_id: Option<i64>,
    pub viacep_base_url: String,
    pub nominatim_base_url: String,
    pub settings_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            weatherapi_key: env::var("WEATHERAPI_KEY")
                .map_err(|_| anyhow::anyhow!("WEATHERAPI_KEY not set"))?,
            weatherapi_base_url: env::var("WEATHERAPI_BASE_URL")
                .unwrap_or_else(|_| "http://api.weatherapi.com".to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|_| anyhow::anyhow!("TELEGRAM_BOT_TOKEN not set"))?,
            telegram_base_url: env::var("TELEGRAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .ok()
                .and_then(|raw| raw.parse().ok()),
            viacep_base_url: env::var("VIACEP_BASE_URL")
                .unwrap_or_else(|_| "https://viacep.com.br".to_string()),
            nominatim_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            settings_path: env::var("USER_SETTINGS_PATH")
                .unwrap_or_else(|_| "user_settings.json".to_string()),
        })
    }
}

/// Fixed alerting knobs. Immutable once the process starts.
#[derive(Clone, Copy, Debug)]
pub struct AlertConfig {
    /// Rain-probability percentage that triggers a push alert.
    pub rain_threshold: u8,
    /// Minutes between automatic forecast checks.
    pub check_interval_minutes: u64,
    /// Minutes a fetched forecast stays valid in the cache.
    pub cache_ttl_minutes: u64,
    /// Local hour for the morning report job.
    pub morning_report_hour: u32,
    /// Local hour for the evening report job.
    pub evening_report_hour: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            rain_threshold: 70,
            check_interval_minutes: 30,
            cache_ttl_minutes: 15,
            morning_report_hour: 7,
            evening_report_hour: 19,
        }
    }
}

/// Safety limits for drone flight checks.
#[derive(Clone, Copy, Debug)]
pub struct FlightLimits {
    pub max_wind_kph: f64,
    pub min_visibility_km: f64,
    pub max_rain_chance: u8,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
}

impl Default for FlightLimits {
    fn default() -> Self {
        Self {
            max_wind_kph: 35.0,
            min_visibility_km: 3.0,
            max_rain_chance: 30,
            min_temp_c: 0.0,
            max_temp_c: 40.0,
        }
    }
}
