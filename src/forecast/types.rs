use serde::{Deserialize, Serialize};

/// Subset of the WeatherAPI forecast response the bot actually reads.
/// Numeric fields default to zero so a missing field degrades to "no data"
/// instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub location: LocationInfo,
    #[serde(default)]
    pub current: Current,
    #[serde(default)]
    pub forecast: Forecast,
    #[serde(default)]
    pub alerts: Option<WeatherAlerts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Current {
    #[serde(default)]
    pub temp_c: f64,
    #[serde(default)]
    pub feelslike_c: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_kph: f64,
    #[serde(default)]
    pub wind_dir: String,
    #[serde(default)]
    pub vis_km: f64,
    #[serde(default)]
    pub uv: f64,
    #[serde(default)]
    pub pressure_mb: f64,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub air_quality: Option<AirQuality>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirQuality {
    #[serde(default)]
    pub pm2_5: f64,
    #[serde(default)]
    pub pm10: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastDay {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub day: DaySummary,
    #[serde(default)]
    pub astro: Astro,
    #[serde(default)]
    pub hour: Vec<HourEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaySummary {
    #[serde(default)]
    pub maxtemp_c: f64,
    #[serde(default)]
    pub mintemp_c: f64,
    #[serde(default)]
    pub daily_chance_of_rain: u8,
    #[serde(default)]
    pub totalprecip_mm: f64,
    #[serde(default)]
    pub maxwind_kph: f64,
    #[serde(default)]
    pub condition: Condition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Astro {
    #[serde(default)]
    pub sunrise: String,
    #[serde(default)]
    pub sunset: String,
    #[serde(default)]
    pub moonrise: String,
    #[serde(default)]
    pub moonset: String,
    #[serde(default)]
    pub moon_phase: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourEntry {
    /// Local timestamp as "YYYY-MM-DD HH:MM".
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub chance_of_rain: u8,
    #[serde(default)]
    pub precip_mm: f64,
    #[serde(default)]
    pub temp_c: f64,
    #[serde(default)]
    pub condition: Condition,
}

impl HourEntry {
    /// Clock portion of the timestamp ("HH:MM"), or the raw string when the
    /// format is unexpected.
    pub fn clock_label(&self) -> &str {
        self.time.split(' ').nth(1).unwrap_or(&self.time)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherAlerts {
    #[serde(default)]
    pub alert: Vec<WeatherAlert>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherAlert {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub effective: String,
    #[serde(default)]
    pub expires: String,
}
