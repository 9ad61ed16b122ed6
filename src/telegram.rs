use crate::config::Config;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Telegram API error: {0}")]
    ApiError(String),
}

/// Outbound notification channel. Delivery may fail per recipient; callers
/// decide whether that aborts anything (fan-out does not).
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), TelegramError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    #[serde(default)]
    pub first_name: String,
}

/// Minimal Bot API client: `sendMessage` plus `getUpdates` long polling.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &Config) -> Result<Self, TelegramError> {
        // No global timeout; getUpdates long-polls, so each request sets its
        // own deadline.
        let client = Client::builder()
            .user_agent("WeatherAlertBot/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.telegram_base_url.clone(),
            token: config.telegram_bot_token.clone(),
        })
    }

    fn endpoint(&self, api_method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, api_method)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(self.endpoint("sendMessage"))
            .timeout(Duration::from_secs(10))
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::ApiError(format!("HTTP {}: {}", status, body)));
        }

        // Telegram can answer 200 with ok:false; the envelope is the real
        // verdict.
        let parsed: ApiResponse<serde_json::Value> = response.json().await?;
        if !parsed.ok {
            return Err(TelegramError::ApiError(
                parsed.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    /// Long-polls for updates after `offset`. The HTTP deadline leaves slack
    /// past the poll timeout so the server can answer first.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TgUpdate>, TelegramError> {
        let response = self
            .client
            .get(self.endpoint("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + 10))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout_secs.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::ApiError(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ApiResponse<Vec<TgUpdate>> = response.json().await?;
        if !parsed.ok {
            return Err(TelegramError::ApiError(
                parsed.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(parsed.result.unwrap_or_default())
    }
}

impl Notifier for TelegramClient {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.send_message(chat_id, text).await
    }
}
