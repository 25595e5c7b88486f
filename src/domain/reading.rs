// Sensor reading domain model

#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_index: u64,
    pub name: String,
    /// Raw PM2.5 (ATM) concentration in µg/m³.
    pub pm25: f64,
    /// Relative humidity in percent, when the sensor reports it.
    pub humidity: Option<f64>,
}

impl SensorReading {
    pub fn new(sensor_index: u64, name: String, pm25: f64, humidity: Option<f64>) -> Self {
        Self {
            sensor_index,
            name,
            pm25,
            humidity,
        }
    }
}
