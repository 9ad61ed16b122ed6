use crate::alerts::{self, FlightCheck, TarpReport, TarpStatus};
use crate::bot::AppState;
use crate::config::AlertConfig;
use crate::forecast::types::ForecastResponse;
use crate::location::{Coordinates, LocationSettings};
use chrono::{Local, Timelike};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Clima,
    Chuva,
    DiasDeChuva,
    BaixarLona,
    Relatorio,
    Drone(Option<String>),
    AddLocal(Vec<String>),
    Alertas(AlertAction),
    Cep(Option<String>),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    On,
    Off,
    Status,
}

impl Command {
    /// Parses a chat message into a command. Non-command text returns `None`
    /// and is ignored by the bot.
    pub fn parse(text: &str) -> Option<Command> {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        let mut parts = trimmed.split_whitespace();
        let head = parts.next()?;
        // "/clima@SomeBot" arrives in group chats.
        let name = head
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" | "ajuda" => Command::Help,
            "clima" => Command::Clima,
            "chuva" => Command::Chuva,
            "diasdechuva" => Command::DiasDeChuva,
            "baixarlona" => Command::BaixarLona,
            "relatorio" => Command::Relatorio,
            "drone" => Command::Drone(parts.next().map(str::to_string)),
            "addlocal" => Command::AddLocal(parts.map(str::to_string).collect()),
            "alertas" => Command::Alertas(match parts.next() {
                Some("on") => AlertAction::On,
                Some("off") => AlertAction::Off,
                _ => AlertAction::Status,
            }),
            "cep" => Command::Cep(parts.next().map(str::to_string)),
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Executes a parsed command against the shared services and returns the
/// reply text.
pub async fn respond(state: &AppState, chat_id: i64, first_name: &str, command: Command) -> String {
    match command {
        Command::Start => {
            state.subscribers.subscribe(chat_id).await;
            welcome_message(first_name, &state.location.current().await, &state.alert_config)
        }
        Command::Help => help_message(&state.alert_config),
        Command::Clima => match fetch(state).await {
            Some(forecast) => current_weather_message(&forecast),
            None => no_data_message(),
        },
        Command::Chuva => match fetch(state).await {
            Some(forecast) => rain_forecast_message(&forecast, now_hour()),
            None => no_data_message(),
        },
        Command::DiasDeChuva => match fetch(state).await {
            Some(forecast) => week_forecast_message(&forecast),
            None => no_data_message(),
        },
        Command::BaixarLona => match fetch(state).await {
            Some(forecast) => tarp_message(&alerts::tarp_report(&forecast)),
            None => no_data_message(),
        },
        Command::Relatorio => match fetch(state).await {
            Some(forecast) => report_message(&forecast, now_hour()),
            None => no_data_message(),
        },
        Command::Drone(None) => match fetch(state).await {
            Some(forecast) => flight_message(
                &alerts::check_flight_conditions(&forecast, now_hour(), &state.flight_limits),
                "Local atual",
            ),
            None => no_data_message(),
        },
        Command::Drone(Some(name)) => match state.drone_sites.get(&name).await {
            Some(coords) => {
                // Ad-hoc coordinates bypass the cache; its single entry
                // belongs to the configured location.
                match state
                    .cache
                    .provider()
                    .fetch_forecast(coords.latitude, coords.longitude)
                    .await
                {
                    Ok(forecast) => flight_message(
                        &alerts::check_flight_conditions(
                            &forecast,
                            now_hour(),
                            &state.flight_limits,
                        ),
                        &name,
                    ),
                    Err(e) => {
                        tracing::error!("flight check fetch for '{name}' failed: {e}");
                        no_data_message()
                    }
                }
            }
            None => unknown_site_message(&name, &state.drone_sites.names().await),
        },
        Command::AddLocal(args) => match parse_site_args(&args) {
            SiteArgs::Ok { name, coords } => {
                state.drone_sites.add(&name, coords).await;
                format!("✅ Local '{name}' adicionado com sucesso!")
            }
            SiteArgs::MissingArgs => "❌ Formato incorreto. Use:\n\
                 /addlocal nome latitude longitude\n\
                 Exemplo: `/addlocal Parque -5.8802 -35.2477`"
                .to_string(),
            SiteArgs::BadCoordinates => "❌ Coordenadas inválidas!".to_string(),
        },
        Command::Alertas(AlertAction::On) => {
            state.subscribers.subscribe(chat_id).await;
            "✅ *ALERTAS ATIVADOS*\n\n\
             Você receberá avisos de chuva forte (>70%) e os relatórios das 7h e 19h.\n\
             A verificação roda a cada 30 minutos."
                .to_string()
        }
        Command::Alertas(AlertAction::Off) => {
            state.subscribers.unsubscribe(chat_id).await;
            "🔕 *ALERTAS DESATIVADOS*\n\n\
             Use /alertas on para reativar quando quiser."
                .to_string()
        }
        Command::Alertas(AlertAction::Status) => {
            let active = state.subscribers.is_subscribed(chat_id).await;
            alert_status_message(active, &state.alert_config)
        }
        Command::Cep(None) => {
            "❌ Informe o CEP. Exemplo: `/cep 59000-000`".to_string()
        }
        Command::Cep(Some(cep)) => match state.resolver.resolve(&cep).await {
            Ok(resolved) => {
                let label = format!("{}/{}", resolved.cidade, resolved.estado);
                match state.location.replace(resolved).await {
                    Ok(()) => format!("✅ Localização atualizada: {label}"),
                    Err(e) => {
                        tracing::error!("failed to persist location: {e}");
                        "❌ Erro ao salvar a nova localização".to_string()
                    }
                }
            }
            Err(e) => {
                tracing::warn!("CEP lookup failed: {e}");
                "❌ CEP não encontrado".to_string()
            }
        },
        Command::Unknown(name) => {
            format!("❌ Comando /{name} não reconhecido. Use /help para ver as opções.")
        }
    }
}

async fn fetch(state: &AppState) -> Option<std::sync::Arc<ForecastResponse>> {
    let settings = state.location.current().await;
    state.cache.get(settings.latitude, settings.longitude).await
}

fn now_hour() -> usize {
    Local::now().hour() as usize
}

fn no_data_message() -> String {
    "❌ Não foi possível obter dados meteorológicos no momento.".to_string()
}

enum SiteArgs {
    Ok { name: String, coords: Coordinates },
    MissingArgs,
    BadCoordinates,
}

fn parse_site_args(args: &[String]) -> SiteArgs {
    let [name, lat, lon] = args else {
        return SiteArgs::MissingArgs;
    };
    match (lat.parse(), lon.parse()) {
        (Ok(latitude), Ok(longitude)) => SiteArgs::Ok {
            name: name.clone(),
            coords: Coordinates {
                latitude,
                longitude,
            },
        },
        _ => SiteArgs::BadCoordinates,
    }
}

fn unknown_site_message(name: &str, known: &[String]) -> String {
    let mut message = format!("❌ Local '{name}' não encontrado.\n");
    if known.is_empty() {
        message.push_str("Nenhum local salvo ainda.\n");
    } else {
        message.push_str("Locais salvos:\n");
        for site in known {
            message.push_str(&format!("• {site}\n"));
        }
    }
    message.push_str("\nPara adicionar: /addlocal nome latitude longitude");
    message
}

fn condition_emoji(condition: &str) -> &'static str {
    const TABLE: [(&str, &str); 8] = [
        ("thunder", "⛈️"),
        ("heavy rain", "⛈️"),
        ("rain", "🌧️"),
        ("drizzle", "🌦️"),
        ("sunny", "☀️"),
        ("clear", "☀️"),
        ("cloud", "⛅"),
        ("fog", "🌫️"),
    ];

    let lowered = condition.to_lowercase();
    for (needle, emoji) in TABLE {
        if lowered.contains(needle) {
            return emoji;
        }
    }
    "🌤️"
}

fn welcome_message(
    first_name: &str,
    location: &LocationSettings,
    config: &AlertConfig,
) -> String {
    format!(
        "🤖 *Bot de Previsão do Tempo - {}/{}*\n\n\
         Olá, {first_name}! 👋 Você foi inscrito nos alertas automáticos.\n\n\
         *Comandos:*\n\
         • /clima - condições atuais\n\
         • /chuva - chance de chuva nas próximas horas\n\
         • /diasdechuva - previsão da semana\n\
         • /baixarlona - status da lona da amora\n\
         • /drone - condições para voo\n\
         • /addlocal - salvar local para o drone\n\
         • /relatorio - relatório completo\n\
         • /alertas - configurar alertas\n\
         • /cep - mudar a localização\n\
         • /help - ajuda\n\n\
         🔄 Verificação a cada {} minutos\n\
         🚨 Alerta a partir de {}% de chance de chuva",
        location.cidade, location.estado, config.check_interval_minutes, config.rain_threshold
    )
}

fn help_message(config: &AlertConfig) -> String {
    format!(
        "❓ *AJUDA*\n\n\
         • /clima - clima atual detalhado\n\
         • /chuva - previsão de chuva (12h)\n\
         • /diasdechuva - previsão para 7 dias\n\
         • /baixarlona - análise noturna para a lona\n\
         • /drone [local] - checagem de segurança para voo\n\
         • /addlocal nome lat lon - salva um local para checagens de voo\n\
         • /relatorio - relatório meteorológico completo\n\
         • /alertas on|off - liga/desliga notificações\n\
         • /cep 00000-000 - atualiza a localização\n\n\
         Alertas automáticos saem quando a chance de chuva passa de {}%, \
         com verificação a cada {} minutos e relatórios às {}h e {}h.",
        config.rain_threshold,
        config.check_interval_minutes,
        config.morning_report_hour,
        config.evening_report_hour
    )
}

fn alert_status_message(active: bool, config: &AlertConfig) -> String {
    format!(
        "📋 *STATUS DOS ALERTAS*\n\n\
         Status atual: {}\n\n\
         • Intervalo: {} minutos\n\
         • Limite de chuva: {}%\n\
         • Relatórios: {}h e {}h",
        if active { "🔔 ATIVO" } else { "🔕 DESATIVADO" },
        config.check_interval_minutes,
        config.rain_threshold,
        config.morning_report_hour,
        config.evening_report_hour
    )
}

fn current_weather_message(forecast: &ForecastResponse) -> String {
    let current = &forecast.current;
    let location = &forecast.location;

    format!(
        "{} *CLIMA ATUAL - {}*\n\n\
         🌡️ Temperatura: {}°C (sensação: {}°C)\n\
         🌤️ Condição: {}\n\
         💧 Umidade: {}%\n\
         💨 Vento: {} km/h {}\n\
         📊 Pressão: {} mb\n\
         👁️ Visibilidade: {} km\n\
         ☀️ Índice UV: {}\n\n\
         📍 {}, {}\n\
         🕐 Última atualização: {}",
        condition_emoji(&current.condition.text),
        location.name,
        current.temp_c,
        current.feelslike_c,
        current.condition.text,
        current.humidity,
        current.wind_kph,
        current.wind_dir,
        current.pressure_mb,
        current.vis_km,
        current.uv,
        location.name,
        location.region,
        current.last_updated
    )
}

fn rain_forecast_message(forecast: &ForecastResponse, start_hour: usize) -> String {
    let days = &forecast.forecast.forecastday;
    let mut message = String::from("🌧️ *PREVISÃO DE CHUVA - PRÓXIMAS 12 HORAS*\n\n");

    for offset in 0..12 {
        let absolute = start_hour + offset;
        let Some(entry) = days
            .get(absolute / 24)
            .and_then(|day| day.hour.get(absolute % 24))
        else {
            continue;
        };

        let emoji = match entry.chance_of_rain {
            80.. => "⛈️",
            60..=79 => "🌧️",
            30..=59 => "🌦️",
            _ => "☁️",
        };
        message.push_str(&format!(
            "{emoji} *{}* - {}%",
            entry.clock_label(),
            entry.chance_of_rain
        ));
        if entry.precip_mm > 0.0 {
            message.push_str(&format!(" ({}mm)", entry.precip_mm));
        }
        message.push('\n');
    }

    let max_chance = alerts::max_rain_chance(forecast, start_hour, 12);
    message.push_str(&format!(
        "\n📊 *RESUMO:* maior chance {}%\n",
        max_chance
    ));
    if max_chance >= 70 {
        message.push_str("⚠️ Alta probabilidade de chuva - baixe a lona da amora!");
    } else if max_chance >= 40 {
        message.push_str("🌦️ Possibilidade moderada - considere levar guarda-chuva.");
    } else {
        message.push_str("☀️ Baixa chance de chuva.");
    }
    message
}

fn week_forecast_message(forecast: &ForecastResponse) -> String {
    let mut message = String::from("📅 *PREVISÃO PARA OS PRÓXIMOS DIAS*\n\n");

    for day in &forecast.forecast.forecastday {
        let summary = &day.day;
        message.push_str(&format!(
            "{} *{}*\n🌡️ {}°C - {}°C\n🌧️ Chuva: {}%",
            condition_emoji(&summary.condition.text),
            day.date,
            summary.mintemp_c,
            summary.maxtemp_c,
            summary.daily_chance_of_rain
        ));
        if summary.totalprecip_mm > 0.0 {
            message.push_str(&format!(" ({}mm)", summary.totalprecip_mm));
        }
        if summary.daily_chance_of_rain > 70 {
            message.push_str(" ⚠️");
        }
        message.push_str("\n\n");
    }

    let rainy_days = forecast
        .forecast
        .forecastday
        .iter()
        .filter(|day| day.day.daily_chance_of_rain > 50)
        .count();
    message.push_str(&format!(
        "📊 Dias com chance de chuva (>50%): {rainy_days}"
    ));
    message
}

fn tarp_message(report: &TarpReport) -> String {
    let (headline, advice) = match report.status {
        TarpStatus::LowerTarp => (
            "🔴 *BAIXAR A LONA*",
            "⚠️ Baixe a lona da amora antes das 18h e confira a fixação.",
        ),
        TarpStatus::Watch => (
            "🟡 *ATENÇÃO*",
            "Monitore a previsão e deixe a lona acessível.",
        ),
        TarpStatus::Keep => (
            "🟢 *LONA PODE FICAR*",
            "✅ Sem previsão de chuva forte para esta noite.",
        ),
    };

    format!(
        "🏠 *STATUS DA LONA DA AMORA*\n\n\
         {headline}\n\n\
         📊 *Análise noturna (18h-6h):*\n\
         • Maior chance de chuva: {}%\n\
         • Precipitação prevista: {:.1}mm\n\n\
         {advice}",
        report.max_night_chance, report.total_precip_mm
    )
}

fn flight_message(check: &FlightCheck, site: &str) -> String {
    let verdict = if check.is_safe() {
        "✅ SEGURO PARA VOO"
    } else {
        "❌ NÃO RECOMENDADO"
    };

    let line = |ok: bool, good: String, bad: String| if ok { good } else { bad };

    format!(
        "🚁 *STATUS PARA VOO*\n📍 Local: {site}\n\n\
         *Status geral:* {verdict}\n\n\
         • {}\n• {}\n• {}\n• {}",
        line(
            check.wind_ok,
            format!("✅ Vento adequado: {} km/h", check.wind_kph),
            format!("❌ Vento muito forte: {} km/h", check.wind_kph),
        ),
        line(
            check.visibility_ok,
            format!("✅ Boa visibilidade: {} km", check.vis_km),
            format!("❌ Visibilidade baixa: {} km", check.vis_km),
        ),
        line(
            check.temperature_ok,
            format!("✅ Temperatura adequada: {}°C", check.temp_c),
            format!("❌ Temperatura inadequada: {}°C", check.temp_c),
        ),
        line(
            check.rain_ok,
            format!("✅ Sem risco de chuva: {}%", check.rain_chance),
            format!("❌ Risco de chuva: {}%", check.rain_chance),
        ),
    )
}

fn report_message(forecast: &ForecastResponse, start_hour: usize) -> String {
    let current = &forecast.current;
    let mut message = format!(
        "📊 *RELATÓRIO METEOROLÓGICO COMPLETO*\n📍 {}, {}\n\n\
         🌡️ *Condições atuais:*\n\
         • Temperatura: {}°C (sensação: {}°C)\n\
         • Condição: {}\n\
         • Umidade: {}% | Pressão: {} mb\n\
         • Vento: {} km/h {} | Visibilidade: {} km\n",
        forecast.location.name,
        forecast.location.region,
        current.temp_c,
        current.feelslike_c,
        current.condition.text,
        current.humidity,
        current.pressure_mb,
        current.wind_kph,
        current.wind_dir,
        current.vis_km
    );

    if let Some(today) = forecast.forecast.forecastday.first() {
        message.push_str(&format!(
            "\n📈 *Extremos de hoje:*\n\
             • Máxima: {}°C | Mínima: {}°C\n\
             • Chance de chuva: {}% | Precipitação: {}mm\n\
             • Vento máximo: {} km/h\n\
             \n🌅 Nascer do sol: {} | Pôr do sol: {}\n\
             🌙 Fase da lua: {}\n",
            today.day.maxtemp_c,
            today.day.mintemp_c,
            today.day.daily_chance_of_rain,
            today.day.totalprecip_mm,
            today.day.maxwind_kph,
            today.astro.sunrise,
            today.astro.sunset,
            today.astro.moon_phase
        ));
    }

    let max_chance = alerts::max_rain_chance(forecast, start_hour, 6);
    let total_precip = alerts::total_precipitation(forecast, start_hour, 6);
    message.push_str(&format!(
        "\n🌧️ *Análise de chuva (próximas 6h):*\n\
         • Maior chance: {}%\n\
         • Precipitação prevista: {:.1}mm\n",
        max_chance, total_precip
    ));

    if let Some(aqi) = &current.air_quality {
        message.push_str(&format!(
            "\n🌬️ *Qualidade do ar:* PM2.5 {} μg/m³ | PM10 {} μg/m³\n",
            aqi.pm2_5, aqi.pm10
        ));
    }

    if let Some(alerts_block) = &forecast.alerts {
        if !alerts_block.alert.is_empty() {
            message.push_str("\n⚠️ *Alertas meteorológicos:*\n");
            for alert in &alerts_block.alert {
                message.push_str(&format!("• {}\n", alert.headline));
            }
        }
    }

    message.push_str("\n🏠 *Recomendação para a lona:* ");
    if max_chance > 70 {
        message.push_str("🛡️ baixar a lona - alta chance de chuva!");
    } else if max_chance > 40 {
        message.push_str("⚠️ ficar atento - possibilidade de chuva.");
    } else {
        message.push_str("✅ a lona pode ficar.");
    }
    message
}
