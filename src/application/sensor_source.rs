// Source trait for sensor readings
use crate::domain::reading::SensorReading;
use async_trait::async_trait;

#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Fetch the current readings for every configured sensor
    async fn fetch_readings(&self) -> anyhow::Result<Vec<SensorReading>>;
}
