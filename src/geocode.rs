use crate::config::Config;
use crate::location::LocationSettings;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CepError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("CEP not found")]
    CepNotFound,
    #[error("invalid CEP format: {0}")]
    InvalidCep(String),
    #[error("no coordinates found for {0}")]
    NoCoordinates(String),
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: bool,
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Two-step postal lookup: ViaCEP resolves the CEP to city/state, Nominatim
/// resolves city/state to coordinates. Either step failing means no change to
/// the stored location; the caller just reports the failure.
pub struct CepResolver {
    client: Client,
    viacep_base_url: String,
    nominatim_base_url: String,
}

impl CepResolver {
    pub fn new(config: &Config) -> Result<Self, CepError> {
        let client = Client::builder()
            .user_agent("WeatherAlertBot/1.0")
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            viacep_base_url: config.viacep_base_url.clone(),
            nominatim_base_url: config.nominatim_base_url.clone(),
        })
    }

    pub async fn resolve(&self, cep: &str) -> Result<LocationSettings, CepError> {
        let cep = normalize_cep(cep).ok_or_else(|| CepError::InvalidCep(cep.to_string()))?;
        let url = format!("{}/ws/{}/json/", self.viacep_base_url, cep);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CepError::CepNotFound);
        }

        let data: ViaCepResponse = response.json().await?;
        if data.erro || data.localidade.is_empty() {
            return Err(CepError::CepNotFound);
        }

        let places: Vec<NominatimPlace> = self
            .client
            .get(format!("{}/search", self.nominatim_base_url))
            .query(&[
                ("city", data.localidade.as_str()),
                ("state", data.uf.as_str()),
                ("country", "Brazil"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let place_label = format!("{}/{}", data.localidade, data.uf);
        let place = places
            .first()
            .ok_or_else(|| CepError::NoCoordinates(place_label.clone()))?;
        let latitude = place
            .lat
            .parse()
            .map_err(|_| CepError::NoCoordinates(place_label.clone()))?;
        let longitude = place
            .lon
            .parse()
            .map_err(|_| CepError::NoCoordinates(place_label))?;

        Ok(LocationSettings {
            cidade: data.localidade,
            estado: data.uf,
            latitude,
            longitude,
            cep,
        })
    }
}

/// Accepts eight digits with an optional hyphen ("59000000" or "59000-000"),
/// surrounding whitespace tolerated, and normalizes to the hyphenated form.
/// Anything else is rejected before it can reach a request path.
fn normalize_cep(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return None;
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 8 {
        return None;
    }
    Some(format!("{}-{}", &digits[..5], &digits[5..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(viacep: String, nominatim: String) -> Config {
        Config {
            weatherapi_key: "key".to_string(),
            weatherapi_base_url: String::new(),
            telegram_bot_token: "token".to_string(),
            telegram_base_url: String::new(),
            telegram_chat_id: None,
            viacep_base_url: viacep,
            nominatim_base_url: nominatim,
            settings_path: String::new(),
        }
    }

    #[tokio::test]
    async fn test_resolve_happy_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ws/50000-000/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"localidade": "Recife", "uf": "PE"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("city", "Recife"))
            .and(query_param("state", "PE"))
            .and(query_param("country", "Brazil"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"lat": "-8.05", "lon": "-34.88"}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let resolver = CepResolver::new(&test_config(server.uri(), server.uri())).unwrap();
        let resolved = resolver.resolve("50000-000").await.unwrap();

        assert_eq!(resolved.cidade, "Recife");
        assert_eq!(resolved.estado, "PE");
        assert_eq!(resolved.latitude, -8.05);
        assert_eq!(resolved.cep, "50000-000");
    }

    #[tokio::test]
    async fn test_unknown_cep_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ws/00000-000/json/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"erro": true}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let resolver = CepResolver::new(&test_config(server.uri(), server.uri())).unwrap();
        assert!(matches!(
            resolver.resolve("00000-000").await,
            Err(CepError::CepNotFound)
        ));
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_stored_location_unchanged() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ws/99999-999/json/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = LocationStore::load(dir.path().join("user_settings.json"));
        let before = store.current().await;

        let resolver = CepResolver::new(&test_config(server.uri(), server.uri())).unwrap();
        assert!(resolver.resolve("99999-999").await.is_err());

        assert_eq!(store.current().await, before);
    }

    #[tokio::test]
    async fn test_malformed_cep_is_rejected_before_any_request() {
        // No mocks mounted: a request for the crafted path would 404 and the
        // error variant below would not match.
        let server = MockServer::start().await;
        let resolver = CepResolver::new(&test_config(server.uri(), server.uri())).unwrap();

        for bad in ["../secrets", "59000 000", "59000-00", "abc12-345", ""] {
            assert!(matches!(
                resolver.resolve(bad).await,
                Err(CepError::InvalidCep(_))
            ));
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_digits_only_cep_is_normalized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ws/50000-000/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"localidade": "Recife", "uf": "PE"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"lat": "-8.05", "lon": "-34.88"}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let resolver = CepResolver::new(&test_config(server.uri(), server.uri())).unwrap();
        let resolved = resolver.resolve(" 50000000 ").await.unwrap();
        assert_eq!(resolved.cep, "50000-000");
    }

    #[tokio::test]
    async fn test_no_geocode_results_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ws/50000-000/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"localidade": "Recife", "uf": "PE"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let resolver = CepResolver::new(&test_config(server.uri(), server.uri())).unwrap();
        assert!(matches!(
            resolver.resolve("50000-000").await,
            Err(CepError::NoCoordinates(_))
        ));
    }
}
