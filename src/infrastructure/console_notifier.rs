// Notifier that prints alerts to stdout
use crate::application::notifier::Notifier;
use crate::domain::alert::AqiReport;
use crate::presentation::report::alert_message;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, alerts: &AqiReport) -> anyhow::Result<()> {
        print!("{}", alert_message(alerts));
        tracing::info!("Printed alert for {} sensor(s)", alerts.len());
        Ok(())
    }
}
