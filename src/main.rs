// Main entry point - Dependency injection and polling loop
mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::alert_service::AlertService;
use crate::application::notifier::Notifier;
use crate::domain::aqi::AqiConverter;
use crate::infrastructure::config::{load_app_config, ConfigError, NotifierKind};
use crate::infrastructure::console_notifier::ConsoleNotifier;
use crate::infrastructure::gmail_notifier::GmailNotifier;
use crate::infrastructure::oauth_token::TokenStore;
use crate::infrastructure::purpleair_client::PurpleAirClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;

    // Create collaborators (infrastructure layer)
    let source = Arc::new(PurpleAirClient::new(
        app_config.purpleair.root_url.clone(),
        app_config.purpleair.api_key.clone(),
        app_config.sensor_query()?,
    ));

    let notifier: Arc<dyn Notifier> = match app_config.alert.notifier {
        NotifierKind::Console => Arc::new(ConsoleNotifier),
        NotifierKind::Gmail => {
            let gmail = app_config
                .gmail
                .clone()
                .ok_or(ConfigError::MissingGmailSettings)?;
            Arc::new(GmailNotifier::new(
                TokenStore::new(gmail.token_path),
                gmail.from_email,
                gmail.to_email,
            ))
        }
    };

    // Create service (application layer)
    let converter = AqiConverter::with_humidity_correction(app_config.alert.apply_humidity_correction);
    tracing::info!(
        "Alerting above AQI {} via {:?} (humidity correction: {})",
        app_config.alert.aqi_threshold,
        app_config.alert.notifier,
        converter.applies_humidity_correction()
    );
    let service = AlertService::new(source, notifier, converter, app_config.alert.aqi_threshold);

    let Some(interval_secs) = app_config.alert.poll_interval_secs else {
        let summary = service.run_once().await?;
        tracing::info!(
            "Checked {} sensors, alerted on {}",
            summary.sensors,
            summary.alerted
        );
        return Ok(());
    };

    // One pass per tick; a failed pass is logged and the next tick tries again
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match service.run_once().await {
                    Ok(summary) => tracing::info!(
                        "Checked {} sensors, alerted on {}",
                        summary.sensors,
                        summary.alerted
                    ),
                    Err(e) => tracing::error!("Polling pass failed: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
