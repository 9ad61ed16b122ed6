use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod alerts;
mod bot;
mod commands;
mod config;
mod forecast;
mod geocode;
mod location;
mod scheduler;
mod subscribers;
mod telegram;

use bot::AppState;
use config::{AlertConfig, Config, FlightLimits};
use forecast::cache::ForecastCache;
use forecast::weatherapi::WeatherApiClient;
use geocode::CepResolver;
use location::{DroneSiteRegistry, LocationStore};
use subscribers::SubscriberRegistry;
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_alert_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let alert_config = AlertConfig::default();

    let weather_client = WeatherApiClient::new(&config)?;
    let cache = Arc::new(ForecastCache::new(
        weather_client,
        Duration::from_secs(alert_config.cache_ttl_minutes * 60),
    ));
    let location = Arc::new(LocationStore::load(&config.settings_path));
    let drone_sites = Arc::new(DroneSiteRegistry::new());
    let subscribers = Arc::new(SubscriberRegistry::new());
    if let Some(chat_id) = config.telegram_chat_id {
        subscribers.subscribe(chat_id).await;
        tracing::info!("seeded subscriber {chat_id} from environment");
    }
    let telegram = Arc::new(TelegramClient::new(&config)?);
    let resolver = CepResolver::new(&config)?;

    let settings = location.current().await;
    tracing::info!("{} subscriber(s) at startup", subscribers.count().await);
    tracing::info!(
        "monitoring {}/{} every {} minutes, rain threshold {}%",
        settings.cidade,
        settings.estado,
        alert_config.check_interval_minutes,
        alert_config.rain_threshold
    );

    tokio::spawn(scheduler::run_periodic_checks(
        Arc::clone(&cache),
        Arc::clone(&location),
        Arc::clone(&subscribers),
        Arc::clone(&telegram),
        alert_config,
    ));
    tokio::spawn(scheduler::run_morning_report(
        Arc::clone(&subscribers),
        Arc::clone(&telegram),
        alert_config,
    ));
    tokio::spawn(scheduler::run_evening_report(
        Arc::clone(&subscribers),
        Arc::clone(&telegram),
        alert_config,
    ));

    let state = AppState {
        alert_config,
        flight_limits: FlightLimits::default(),
        cache,
        location,
        drone_sites,
        subscribers,
        resolver,
        telegram,
    };

    bot::run(state).await;
    Ok(())
}
