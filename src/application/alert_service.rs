// Alert service - Use case for one fetch, compute, filter, notify pass
use crate::application::notifier::Notifier;
use crate::application::sensor_source::SensorSource;
use crate::domain::alert::AqiReport;
use crate::domain::aqi::AqiConverter;
use crate::presentation::report::summary_line;
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub sensors: usize,
    pub alerted: usize,
}

#[derive(Clone)]
pub struct AlertService {
    source: Arc<dyn SensorSource>,
    notifier: Arc<dyn Notifier>,
    converter: AqiConverter,
    aqi_threshold: f64,
}

impl AlertService {
    pub fn new(
        source: Arc<dyn SensorSource>,
        notifier: Arc<dyn Notifier>,
        converter: AqiConverter,
        aqi_threshold: f64,
    ) -> Self {
        Self {
            source,
            notifier,
            converter,
            aqi_threshold,
        }
    }

    pub async fn run_once(&self) -> anyhow::Result<RunSummary> {
        let readings = self
            .source
            .fetch_readings()
            .await
            .context("Failed to fetch sensor readings")?;

        for reading in &readings {
            tracing::debug!(
                "Sensor {} ({}): pm2.5={} humidity={:?}",
                reading.sensor_index,
                reading.name,
                reading.pm25,
                reading.humidity
            );
        }

        let report = AqiReport::from_readings(&readings, &self.converter);
        tracing::info!("all aqi: {}", summary_line(&report));
        for (name, aqi) in report.iter() {
            tracing::debug!(
                "Sensor {}: aqi={} category={}",
                name,
                aqi,
                aqi.category().unwrap_or("n/a")
            );
        }

        let alerts = report.exceeding(self.aqi_threshold);
        if alerts.is_empty() {
            tracing::info!(
                "No sensors above AQI threshold {} ({} sensors checked)",
                self.aqi_threshold,
                report.len()
            );
        } else {
            tracing::warn!(
                "{} sensor(s) above AQI threshold {}",
                alerts.len(),
                self.aqi_threshold
            );
            self.notifier
                .notify(&alerts)
                .await
                .context("Failed to deliver alert")?;
        }

        Ok(RunSummary {
            sensors: report.len(),
            alerted: alerts.len(),
        })
    }
}
