// Alert domain model - sensor name to AQI mapping
use super::aqi::{Aqi, AqiConverter};
use super::reading::SensorReading;
use std::collections::BTreeMap;

/// AQI values keyed by sensor name.
///
/// Names are plain map keys: a later reading with the same name replaces the
/// earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AqiReport {
    entries: BTreeMap<String, Aqi>,
}

impl AqiReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_readings(readings: &[SensorReading], converter: &AqiConverter) -> Self {
        let mut report = Self::new();
        for reading in readings {
            let aqi = converter.get_aqi_from_pm(reading.pm25, reading.humidity);
            report.insert(reading.name.clone(), aqi);
        }
        report
    }

    pub fn insert(&mut self, name: String, aqi: Aqi) {
        self.entries.insert(name, aqi);
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<Aqi> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Aqi)> {
        self.entries.iter().map(|(name, aqi)| (name.as_str(), *aqi))
    }

    /// Sensors that should be alerted on: an index strictly above `threshold`,
    /// or an undefined (off-scale) value.
    pub fn exceeding(&self, threshold: f64) -> AqiReport {
        let entries = self
            .entries
            .iter()
            .filter(|(_, aqi)| match aqi {
                Aqi::Index(v) => *v > threshold,
                Aqi::Undefined => true,
            })
            .map(|(name, aqi)| (name.clone(), *aqi))
            .collect();
        AqiReport { entries }
    }
}
