// Notifier trait for delivering alerts
use crate::domain::alert::AqiReport;
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert for sensors above the threshold
    async fn notify(&self, alerts: &AqiReport) -> anyhow::Result<()>;
}
