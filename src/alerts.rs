use crate::config::FlightLimits;
use crate::forecast::types::ForecastResponse;

/// Outcome of a rolling-window rain check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RainDecision {
    /// Max chance over the window crossed the threshold.
    Alert { max_chance: u8, window_hours: usize },
    Calm,
}

/// Maximum `chance_of_rain` over `window` hours starting at `start_hour`
/// (0-23). The window crosses into the next day's hourly series when it spans
/// midnight. Hours past the end of the forecast are ignored.
pub fn max_rain_chance(forecast: &ForecastResponse, start_hour: usize, window: usize) -> u8 {
    let days = &forecast.forecast.forecastday;
    let mut max_chance = 0;

    for offset in 0..window {
        let absolute = start_hour + offset;
        let day_index = absolute / 24;
        let hour_index = absolute % 24;

        if let Some(entry) = days.get(day_index).and_then(|day| day.hour.get(hour_index)) {
            max_chance = max_chance.max(entry.chance_of_rain);
        }
    }

    max_chance
}

/// Total `precip_mm` over the same rolling window as [`max_rain_chance`].
pub fn total_precipitation(forecast: &ForecastResponse, start_hour: usize, window: usize) -> f64 {
    let days = &forecast.forecast.forecastday;
    let mut total = 0.0;

    for offset in 0..window {
        let absolute = start_hour + offset;
        if let Some(entry) = days
            .get(absolute / 24)
            .and_then(|day| day.hour.get(absolute % 24))
        {
            total += entry.precip_mm;
        }
    }

    total
}

pub fn evaluate_rain(
    forecast: &ForecastResponse,
    start_hour: usize,
    window: usize,
    threshold: u8,
) -> RainDecision {
    let max_chance = max_rain_chance(forecast, start_hour, window);
    if max_chance >= threshold {
        RainDecision::Alert {
            max_chance,
            window_hours: window,
        }
    } else {
        RainDecision::Calm
    }
}

/// Per-criterion drone flight safety verdict. Safe only when every individual
/// check passes.
#[derive(Debug, Clone)]
pub struct FlightCheck {
    pub wind_kph: f64,
    pub vis_km: f64,
    pub temp_c: f64,
    pub rain_chance: u8,
    pub wind_ok: bool,
    pub visibility_ok: bool,
    pub temperature_ok: bool,
    pub rain_ok: bool,
}

impl FlightCheck {
    pub fn is_safe(&self) -> bool {
        self.wind_ok && self.visibility_ok && self.temperature_ok && self.rain_ok
    }
}

/// Compares current conditions plus the current hour's rain chance against
/// the fixed safety limit table.
pub fn check_flight_conditions(
    forecast: &ForecastResponse,
    now_hour: usize,
    limits: &FlightLimits,
) -> FlightCheck {
    let current = &forecast.current;
    let rain_chance = forecast
        .forecast
        .forecastday
        .first()
        .and_then(|day| day.hour.get(now_hour))
        .map(|entry| entry.chance_of_rain)
        .unwrap_or(0);

    FlightCheck {
        wind_kph: current.wind_kph,
        vis_km: current.vis_km,
        temp_c: current.temp_c,
        rain_chance,
        wind_ok: current.wind_kph <= limits.max_wind_kph,
        visibility_ok: current.vis_km >= limits.min_visibility_km,
        temperature_ok: current.temp_c >= limits.min_temp_c && current.temp_c <= limits.max_temp_c,
        rain_ok: rain_chance <= limits.max_rain_chance,
    }
}

/// Recommendation for the mulberry tarp based on overnight rain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarpStatus {
    /// Chance above 70 %: lower the tarp.
    LowerTarp,
    /// Chance above 40 %: keep watching the forecast.
    Watch,
    /// Tarp can stay up.
    Keep,
}

#[derive(Debug, Clone)]
pub struct TarpReport {
    pub status: TarpStatus,
    pub max_night_chance: u8,
    pub total_precip_mm: f64,
}

/// Evaluates the overnight window: today's hours from 18:00 (plus any early
/// hours still in today's series) and tomorrow's hours through 06:00.
pub fn tarp_report(forecast: &ForecastResponse) -> TarpReport {
    let days = &forecast.forecast.forecastday;
    let mut max_night_chance = 0;
    let mut total_precip_mm = 0.0;

    if let Some(today) = days.first() {
        for (hour, entry) in today.hour.iter().enumerate() {
            if hour >= 18 || hour <= 6 {
                max_night_chance = max_night_chance.max(entry.chance_of_rain);
                total_precip_mm += entry.precip_mm;
            }
        }
    }
    if let Some(tomorrow) = days.get(1) {
        for entry in tomorrow.hour.iter().take(7) {
            max_night_chance = max_night_chance.max(entry.chance_of_rain);
            total_precip_mm += entry.precip_mm;
        }
    }

    let status = if max_night_chance > 70 {
        TarpStatus::LowerTarp
    } else if max_night_chance > 40 {
        TarpStatus::Watch
    } else {
        TarpStatus::Keep
    };

    TarpReport {
        status,
        max_night_chance,
        total_precip_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::types::{ForecastDay, HourEntry};

    fn day_with_chances(chances: [u8; 24]) -> ForecastDay {
        let mut day = ForecastDay::default();
        day.hour = chances
            .iter()
            .map(|&chance_of_rain| HourEntry {
                chance_of_rain,
                ..Default::default()
            })
            .collect();
        day
    }

    fn forecast_with_days(days: Vec<ForecastDay>) -> ForecastResponse {
        let mut forecast = ForecastResponse::default();
        forecast.forecast.forecastday = days;
        forecast
    }

    #[test]
    fn test_alert_when_next_hour_crosses_threshold() {
        let mut chances = [10u8; 24];
        chances[11] = 85; // now = 10, next hour spikes
        let forecast = forecast_with_days(vec![day_with_chances(chances)]);

        let decision = evaluate_rain(&forecast, 10, 3, 70);
        assert_eq!(
            decision,
            RainDecision::Alert {
                max_chance: 85,
                window_hours: 3
            }
        );
    }

    #[test]
    fn test_calm_when_all_below_threshold() {
        let forecast = forecast_with_days(vec![day_with_chances([69u8; 24])]);
        assert_eq!(evaluate_rain(&forecast, 10, 3, 70), RainDecision::Calm);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut chances = [0u8; 24];
        chances[5] = 70;
        let forecast = forecast_with_days(vec![day_with_chances(chances)]);

        assert!(matches!(
            evaluate_rain(&forecast, 5, 1, 70),
            RainDecision::Alert { max_chance: 70, .. }
        ));
    }

    #[test]
    fn test_window_wraps_past_midnight() {
        let mut today = [10u8; 24];
        today[23] = 20;
        let mut tomorrow = [0u8; 24];
        tomorrow[0] = 90;
        tomorrow[1] = 30;
        tomorrow[2] = 99; // outside the 3-hour window
        let forecast =
            forecast_with_days(vec![day_with_chances(today), day_with_chances(tomorrow)]);

        assert_eq!(max_rain_chance(&forecast, 23, 3), 90);
    }

    #[test]
    fn test_window_past_forecast_end_ignores_missing_hours() {
        let forecast = forecast_with_days(vec![day_with_chances([40u8; 24])]);
        // Window reaches into a second day that does not exist.
        assert_eq!(max_rain_chance(&forecast, 23, 6), 40);
    }

    fn flight_forecast(wind: f64, vis: f64, temp: f64, rain: u8) -> ForecastResponse {
        let mut chances = [0u8; 24];
        chances[12] = rain;
        let mut forecast = forecast_with_days(vec![day_with_chances(chances)]);
        forecast.current.wind_kph = wind;
        forecast.current.vis_km = vis;
        forecast.current.temp_c = temp;
        forecast
    }

    #[test]
    fn test_flight_safe_when_all_criteria_pass() {
        let limits = FlightLimits::default();
        let check = check_flight_conditions(&flight_forecast(20.0, 10.0, 28.0, 10), 12, &limits);
        assert!(check.wind_ok && check.visibility_ok && check.temperature_ok && check.rain_ok);
        assert!(check.is_safe());
    }

    #[test]
    fn test_flight_unsafe_on_strong_wind() {
        let limits = FlightLimits::default();
        let check = check_flight_conditions(&flight_forecast(36.0, 10.0, 28.0, 10), 12, &limits);
        assert!(!check.wind_ok);
        assert!(check.visibility_ok && check.temperature_ok && check.rain_ok);
        assert!(!check.is_safe());
    }

    #[test]
    fn test_flight_unsafe_on_low_visibility() {
        let limits = FlightLimits::default();
        let check = check_flight_conditions(&flight_forecast(20.0, 2.0, 28.0, 10), 12, &limits);
        assert!(!check.visibility_ok);
        assert!(!check.is_safe());
    }

    #[test]
    fn test_flight_unsafe_outside_temperature_bounds() {
        let limits = FlightLimits::default();
        let cold = check_flight_conditions(&flight_forecast(20.0, 10.0, -1.0, 10), 12, &limits);
        assert!(!cold.temperature_ok);
        assert!(!cold.is_safe());

        let hot = check_flight_conditions(&flight_forecast(20.0, 10.0, 41.0, 10), 12, &limits);
        assert!(!hot.temperature_ok);
        assert!(!hot.is_safe());
    }

    #[test]
    fn test_flight_unsafe_on_rain_risk() {
        let limits = FlightLimits::default();
        let check = check_flight_conditions(&flight_forecast(20.0, 10.0, 28.0, 31), 12, &limits);
        assert!(!check.rain_ok);
        assert!(!check.is_safe());
    }

    #[test]
    fn test_tarp_lower_when_night_chance_high() {
        let mut today = [10u8; 24];
        today[20] = 80;
        let forecast = forecast_with_days(vec![day_with_chances(today)]);

        let report = tarp_report(&forecast);
        assert_eq!(report.status, TarpStatus::LowerTarp);
        assert_eq!(report.max_night_chance, 80);
    }

    #[test]
    fn test_tarp_watch_band() {
        let mut today = [10u8; 24];
        today[22] = 55;
        let forecast = forecast_with_days(vec![day_with_chances(today)]);
        assert_eq!(tarp_report(&forecast).status, TarpStatus::Watch);
    }

    #[test]
    fn test_tarp_considers_tomorrow_early_hours() {
        let today = [10u8; 24];
        let mut tomorrow = [0u8; 24];
        tomorrow[3] = 90; // 03:00 tomorrow, inside the overnight window
        tomorrow[10] = 95; // mid-morning, outside it
        let forecast =
            forecast_with_days(vec![day_with_chances(today), day_with_chances(tomorrow)]);

        let report = tarp_report(&forecast);
        assert_eq!(report.status, TarpStatus::LowerTarp);
        assert_eq!(report.max_night_chance, 90);
    }

    #[test]
    fn test_tarp_keep_ignores_midday_rain() {
        let mut today = [0u8; 24];
        today[12] = 95; // noon rain is irrelevant overnight
        let forecast = forecast_with_days(vec![day_with_chances(today)]);
        assert_eq!(tarp_report(&forecast).status, TarpStatus::Keep);
    }
}
