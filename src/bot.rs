use crate::commands::{self, Command};
use crate::config::{AlertConfig, FlightLimits};
use crate::forecast::cache::ForecastCache;
use crate::forecast::weatherapi::WeatherApiClient;
use crate::geocode::CepResolver;
use crate::location::{DroneSiteRegistry, LocationStore};
use crate::subscribers::SubscriberRegistry;
use crate::telegram::{TelegramClient, TgMessage};
use std::sync::Arc;
use std::time::Duration;

const POLL_TIMEOUT_SECS: u64 = 30;

/// Everything the command handlers need, shared with the background jobs.
pub struct AppState {
    pub alert_config: AlertConfig,
    pub flight_limits: FlightLimits,
    pub cache: Arc<ForecastCache<WeatherApiClient>>,
    pub location: Arc<LocationStore>,
    pub drone_sites: Arc<DroneSiteRegistry>,
    pub subscribers: Arc<SubscriberRegistry>,
    pub resolver: CepResolver,
    pub telegram: Arc<TelegramClient>,
}

/// Long-polls Telegram for updates and dispatches commands. Poll failures
/// back off briefly and retry; the loop never exits.
pub async fn run(state: AppState) {
    let mut offset = 0i64;
    tracing::info!("bot loop started");

    loop {
        match state.telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some(message) = update.message {
                        handle_message(&state, message).await;
                    }
                }
            }
            Err(e) => {
                tracing::error!("polling for updates failed: {e}");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn handle_message(state: &AppState, message: TgMessage) {
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(command) = Command::parse(text) else {
        return;
    };

    let chat_id = message.chat.id;
    let first_name = message
        .from
        .as_ref()
        .map(|user| user.first_name.as_str())
        .unwrap_or("amigo");
    tracing::debug!("handling {command:?} from chat {chat_id}");

    let reply = commands::respond(state, chat_id, first_name, command).await;
    if let Err(e) = state.telegram.send_message(chat_id, &reply).await {
        tracing::error!("failed to reply to chat {chat_id}: {e}");
    }
}
