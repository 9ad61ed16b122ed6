use super::types::ForecastResponse;
use super::weatherapi::{WeatherApiClient, WeatherApiError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Source of forecast data. The production implementation is
/// [`WeatherApiClient`]; tests substitute a scripted provider.
pub trait ForecastProvider: Send + Sync {
    fn fetch(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<ForecastResponse, WeatherApiError>> + Send;
}

impl ForecastProvider for WeatherApiClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastResponse, WeatherApiError> {
        self.fetch_forecast(lat, lon).await
    }
}

#[derive(Debug, Clone)]
struct CachedForecast {
    payload: Arc<ForecastResponse>,
    fetched_at: Instant,
}

/// Single-entry forecast cache with a fixed TTL.
///
/// One entry serves the whole process; the operating assumption is that the
/// configured location stays effectively constant between updates. Payload and
/// timestamp are always replaced together under the write lock, so readers
/// never see a mismatched pair.
pub struct ForecastCache<P> {
    provider: P,
    ttl: Duration,
    entry: RwLock<Option<CachedForecast>>,
}

impl<P: ForecastProvider> ForecastCache<P> {
    pub fn new(provider: P, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Direct access for one-off fetches of arbitrary coordinates. The cache
    /// entry belongs to the configured location; ad-hoc lookups must not
    /// replace it.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the cached forecast when it is still fresh, otherwise refetches
    /// from the provider. On provider failure returns `None` and leaves the
    /// existing entry untouched; stale data is never served as a fallback.
    pub async fn get(&self, lat: f64, lon: f64) -> Option<Arc<ForecastResponse>> {
        {
            let guard = self.entry.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    tracing::debug!("forecast cache hit");
                    return Some(Arc::clone(&cached.payload));
                }
            }
        }

        match self.provider.fetch(lat, lon).await {
            Ok(payload) => {
                let payload = Arc::new(payload);
                let mut guard = self.entry.write().await;
                *guard = Some(CachedForecast {
                    payload: Arc::clone(&payload),
                    fetched_at: Instant::now(),
                });
                tracing::info!("forecast data refreshed");
                Some(payload)
            }
            Err(e) => {
                tracing::error!("forecast fetch failed: {e}");
                None
            }
        }
    }

    #[cfg(test)]
    async fn snapshot(&self) -> Option<(Arc<ForecastResponse>, Instant)> {
        self.entry
            .read()
            .await
            .as_ref()
            .map(|cached| (Arc::clone(&cached.payload), cached.fetched_at))
    }
}
