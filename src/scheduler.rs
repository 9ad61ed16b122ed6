use crate::alerts::{self, RainDecision};
use crate::config::AlertConfig;
use crate::forecast::cache::{ForecastCache, ForecastProvider};
use crate::location::{LocationSettings, LocationStore};
use crate::subscribers::SubscriberRegistry;
use crate::telegram::Notifier;
use chrono::{Duration as ChronoDuration, Local, NaiveTime, Timelike};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Hours ahead the periodic rain check looks at.
const RAIN_CHECK_WINDOW_HOURS: usize = 3;

/// Daily report bodies were never defined upstream; only the headers go out.
const MORNING_REPORT: &str = "🌅 *RELATÓRIO MATINAL*";
const EVENING_REPORT: &str = "🌙 *RELATÓRIO NOTURNO*";

fn rain_alert_message(max_chance: u8, location: &LocationSettings) -> String {
    format!(
        "⚠️ *ALERTA DE CHUVA*\n\n\
         🌧️ Chance de chuva: {max_chance}%\n\
         ⏰ Nas próximas {RAIN_CHECK_WINDOW_HOURS} horas\n\
         📍 {}/{}\n\n\
         🏠 *Recomendação:* baixe a lona da amora!",
        location.cidade, location.estado
    )
}

/// Sends `text` to every subscriber. A failed delivery is logged and skipped;
/// it never blocks the remaining recipients. Returns the delivered count.
pub async fn broadcast<N: Notifier>(
    notifier: &N,
    subscribers: &SubscriberRegistry,
    text: &str,
) -> usize {
    let mut delivered = 0;
    for chat_id in subscribers.snapshot().await {
        match notifier.notify(chat_id, text).await {
            Ok(()) => {
                delivered += 1;
                tracing::info!("notification delivered to {chat_id}");
            }
            Err(e) => tracing::error!("failed to notify {chat_id}: {e}"),
        }
    }
    delivered
}

/// One scheduler tick: fetch (through the cache), evaluate the rain window,
/// fan out on alert. A fetch failure skips the tick; the next one retries
/// naturally.
pub async fn run_rain_check<P, N>(
    cache: &ForecastCache<P>,
    location: &LocationStore,
    subscribers: &SubscriberRegistry,
    notifier: &N,
    config: &AlertConfig,
) where
    P: ForecastProvider,
    N: Notifier,
{
    let settings = location.current().await;
    let Some(forecast) = cache.get(settings.latitude, settings.longitude).await else {
        tracing::warn!("skipping rain check: no forecast data available");
        return;
    };

    let now_hour = Local::now().hour() as usize;
    match alerts::evaluate_rain(
        &forecast,
        now_hour,
        RAIN_CHECK_WINDOW_HOURS,
        config.rain_threshold,
    ) {
        RainDecision::Alert { max_chance, .. } => {
            tracing::info!("rain alert triggered at {max_chance}%");
            let message = rain_alert_message(max_chance, &settings);
            broadcast(notifier, subscribers, &message).await;
        }
        RainDecision::Calm => {
            tracing::debug!("rain check below threshold, nothing to send");
        }
    }
}

/// The "every N minutes" job shape. Ticks never overlap; a slow tick delays
/// the next one.
pub async fn run_periodic_checks<P, N>(
    cache: Arc<ForecastCache<P>>,
    location: Arc<LocationStore>,
    subscribers: Arc<SubscriberRegistry>,
    notifier: Arc<N>,
    config: AlertConfig,
) where
    P: ForecastProvider,
    N: Notifier,
{
    let mut ticker =
        tokio::time::interval(Duration::from_secs(config.check_interval_minutes * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_rain_check(
            &cache,
            &location,
            &subscribers,
            notifier.as_ref(),
            &config,
        )
        .await;
    }
}

/// The "daily at HH:00" job shape, local wall clock.
pub async fn run_daily_report<N: Notifier>(
    subscribers: Arc<SubscriberRegistry>,
    notifier: Arc<N>,
    hour: u32,
    header: &'static str,
) {
    loop {
        tokio::time::sleep(until_next_local(hour)).await;
        tracing::info!("sending daily report for {hour:02}:00");
        broadcast(notifier.as_ref(), &subscribers, header).await;
    }
}

pub async fn run_morning_report<N: Notifier>(
    subscribers: Arc<SubscriberRegistry>,
    notifier: Arc<N>,
    config: AlertConfig,
) {
    run_daily_report(subscribers, notifier, config.morning_report_hour, MORNING_REPORT).await;
}

pub async fn run_evening_report<N: Notifier>(
    subscribers: Arc<SubscriberRegistry>,
    notifier: Arc<N>,
    config: AlertConfig,
) {
    run_daily_report(subscribers, notifier, config.evening_report_hour, EVENING_REPORT).await;
}

/// Time until the next local occurrence of `hour:00`, rolling to tomorrow
/// when today's slot already passed.
fn until_next_local(hour: u32) -> Duration {
    let now = Local::now().naive_local();
    let target = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(target);
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}
