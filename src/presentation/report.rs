// Text rendering for AQI reports and alert messages
use crate::domain::alert::AqiReport;

pub const ALERT_SUBJECT: &str = "PurpleAir Alerts - High AQI Detected";

const ALERT_HEADER: &str = "There are high AQI levels detected near you: \n";

/// Body of the alert sent for sensors above the threshold
pub fn alert_message(alerts: &AqiReport) -> String {
    let mut message = String::from(ALERT_HEADER);
    for (name, aqi) in alerts.iter() {
        message.push_str(&format!("Sensor <{}>: {}\n", name, aqi));
    }
    message
}

/// One-line rendering of every sensor in a report, for logs
pub fn summary_line(report: &AqiReport) -> String {
    let pairs: Vec<String> = report
        .iter()
        .map(|(name, aqi)| format!("{}: {}", name, aqi))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aqi::Aqi;

    fn report() -> AqiReport {
        let mut report = AqiReport::new();
        report.insert("Porch".to_string(), Aqi::Index(83.5));
        report.insert("Ridge".to_string(), Aqi::Undefined);
        report.insert("Yard".to_string(), Aqi::Index(100.0));
        report
    }

    #[test]
    fn test_alert_message() {
        assert_eq!(
            alert_message(&report()),
            "There are high AQI levels detected near you: \nSensor <Porch>: 83.5\nSensor <Ridge>: -\nSensor <Yard>: 100.0\n"
        );
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(&report()), "{Porch: 83.5, Ridge: -, Yard: 100.0}");
        assert_eq!(summary_line(&AqiReport::new()), "{}");
    }
}
