use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/purpleair";
pub const CONFIG_PATH_ENV: &str = "PURPLEAIR_ALERT_CONFIG";
const ENV_PREFIX: &str = "PURPLEAIR_ALERT";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub purpleair: PurpleAirSettings,
    #[serde(default)]
    pub alert: AlertSettings,
    #[serde(default)]
    pub gmail: Option<GmailSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PurpleAirSettings {
    pub api_key: String,
    #[serde(default = "default_root_url")]
    pub root_url: String,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub sensor_indices: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub nwlng: f64,
    pub nwlat: f64,
    pub selng: f64,
    pub selat: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertSettings {
    #[serde(default = "default_aqi_threshold")]
    pub aqi_threshold: f64,
    #[serde(default = "default_true")]
    pub apply_humidity_correction: bool,
    #[serde(default)]
    pub notifier: NotifierKind,
    /// Run once when unset, otherwise poll on this interval.
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            aqi_threshold: default_aqi_threshold(),
            apply_humidity_correction: true,
            notifier: NotifierKind::default(),
            poll_interval_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Console,
    Gmail,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GmailSettings {
    pub from_email: String,
    pub to_email: String,
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

/// Which sensors a poll asks PurpleAir for
#[derive(Debug, Clone, PartialEq)]
pub enum SensorQuery {
    BoundingBox(BoundingBox),
    SensorList(Vec<u64>),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("purpleair.api_key is empty")]
    MissingApiKey,
    #[error("set either purpleair.bounding_box or purpleair.sensor_indices")]
    NoSensorSelection,
    #[error("purpleair.bounding_box and purpleair.sensor_indices are mutually exclusive")]
    ConflictingSensorSelection,
    #[error("bounding box corners are inverted: north-west ({nwlng}, {nwlat}) must be above and left of south-east ({selng}, {selat})")]
    InvertedBoundingBox {
        nwlng: f64,
        nwlat: f64,
        selng: f64,
        selat: f64,
    },
    #[error("alert.aqi_threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
    #[error("alert.poll_interval_secs must be greater than zero")]
    ZeroPollInterval,
    #[error("alert.notifier is gmail but the [gmail] section is missing")]
    MissingGmailSettings,
    #[error("gmail.{0} is empty")]
    MissingEmail(&'static str),
}

fn default_root_url() -> String {
    "https://api.purpleair.com/v1/sensors".to_string()
}

fn default_aqi_threshold() -> f64 {
    50.0
}

fn default_true() -> bool {
    true
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

impl AppConfig {
    /// Check the settings for combinations that cannot produce a useful run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.purpleair.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        self.sensor_query()?;

        if !self.alert.aqi_threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(self.alert.aqi_threshold));
        }
        if self.alert.poll_interval_secs == Some(0) {
            return Err(ConfigError::ZeroPollInterval);
        }

        if self.alert.notifier == NotifierKind::Gmail {
            let gmail = self.gmail.as_ref().ok_or(ConfigError::MissingGmailSettings)?;
            if gmail.from_email.trim().is_empty() {
                return Err(ConfigError::MissingEmail("from_email"));
            }
            if gmail.to_email.trim().is_empty() {
                return Err(ConfigError::MissingEmail("to_email"));
            }
        }

        Ok(())
    }

    pub fn sensor_query(&self) -> Result<SensorQuery, ConfigError> {
        let settings = &self.purpleair;
        match (&settings.bounding_box, settings.sensor_indices.is_empty()) {
            (Some(_), false) => Err(ConfigError::ConflictingSensorSelection),
            (None, true) => Err(ConfigError::NoSensorSelection),
            (None, false) => Ok(SensorQuery::SensorList(settings.sensor_indices.clone())),
            (Some(bbox), true) => {
                if bbox.nwlat <= bbox.selat || bbox.nwlng >= bbox.selng {
                    return Err(ConfigError::InvertedBoundingBox {
                        nwlng: bbox.nwlng,
                        nwlat: bbox.nwlat,
                        selng: bbox.selng,
                        selat: bbox.selat,
                    });
                }
                Ok(SensorQuery::BoundingBox(*bbox))
            }
        }
    }
}

/// Load the config file named by `PURPLEAIR_ALERT_CONFIG` (default
/// `config/purpleair`), overlaid with `PURPLEAIR_ALERT_*` environment variables.
///
/// Nested keys use `__`, e.g. `PURPLEAIR_ALERT_PURPLEAIR__API_KEY`.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let builder = config::Config::builder()
        .add_source(config::File::with_name(&path).required(false))
        .add_source(environment(None));

    let app_config = build_config(builder)?;
    tracing::debug!("Loaded configuration from {}", path);
    Ok(app_config)
}

/// `PURPLEAIR_ALERT_*` overlay; `source` replaces the process environment.
/// List keys take comma separated values, e.g. `..._SENSOR_INDICES=1,2`.
/// Values stay strings; numbers and booleans are parsed on deserialization.
fn environment(source: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("purpleair.sensor_indices")
        .source(source)
}

fn build_config(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> anyhow::Result<AppConfig> {
        build_config(
            config::Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    fn parse_env(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        build_config(config::Config::builder().add_source(environment(Some(source))))
    }

    #[test]
    fn test_environment_overlay() {
        let config = parse_env(&[
            ("PURPLEAIR_ALERT_PURPLEAIR__API_KEY", "KEY"),
            ("PURPLEAIR_ALERT_PURPLEAIR__SENSOR_INDICES", "131075,42"),
            ("PURPLEAIR_ALERT_ALERT__AQI_THRESHOLD", "80"),
            ("PURPLEAIR_ALERT_ALERT__APPLY_HUMIDITY_CORRECTION", "false"),
        ])
        .unwrap();

        assert_eq!(config.purpleair.api_key, "KEY");
        assert_eq!(
            config.sensor_query().unwrap(),
            SensorQuery::SensorList(vec![131075, 42])
        );
        assert_eq!(config.alert.aqi_threshold, 80.0);
        assert!(!config.alert.apply_humidity_correction);
    }

    #[test]
    fn test_environment_single_sensor() {
        let config = parse_env(&[
            ("PURPLEAIR_ALERT_PURPLEAIR__API_KEY", "KEY"),
            ("PURPLEAIR_ALERT_PURPLEAIR__SENSOR_INDICES", "7"),
        ])
        .unwrap();

        assert_eq!(config.sensor_query().unwrap(), SensorQuery::SensorList(vec![7]));
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            r#"
            [purpleair]
            api_key = "KEY"
            sensor_indices = [131075, 2]
            "#,
        )
        .unwrap();

        assert_eq!(config.purpleair.root_url, "https://api.purpleair.com/v1/sensors");
        assert_eq!(config.alert.aqi_threshold, 50.0);
        assert!(config.alert.apply_humidity_correction);
        assert_eq!(config.alert.notifier, NotifierKind::Console);
        assert_eq!(config.alert.poll_interval_secs, None);
        assert_eq!(
            config.sensor_query().unwrap(),
            SensorQuery::SensorList(vec![131075, 2])
        );
    }

    #[test]
    fn test_gmail_bounding_box() {
        let config = parse(
            r#"
            [purpleair]
            api_key = "KEY"
            bounding_box = { nwlng = -122.5, nwlat = 37.8, selng = -122.3, selat = 37.7 }

            [alert]
            aqi_threshold = 75
            apply_humidity_correction = false
            notifier = "gmail"
            poll_interval_secs = 600

            [gmail]
            from_email = "me@example.com"
            to_email = "you@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.alert.aqi_threshold, 75.0);
        assert_eq!(config.alert.notifier, NotifierKind::Gmail);
        assert_eq!(config.alert.poll_interval_secs, Some(600));
        assert_eq!(
            config.gmail.as_ref().unwrap().token_path,
            PathBuf::from("token.json")
        );
        assert!(matches!(config.sensor_query(), Ok(SensorQuery::BoundingBox(_))));
    }

    #[test]
    fn test_rejects_bad_selection() {
        let err = parse(
            r#"
            [purpleair]
            api_key = "KEY"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::NoSensorSelection));

        let err = parse(
            r#"
            [purpleair]
            api_key = "KEY"
            sensor_indices = [1]
            bounding_box = { nwlng = -122.5, nwlat = 37.8, selng = -122.3, selat = 37.7 }
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ConflictingSensorSelection)
        );

        let err = parse(
            r#"
            [purpleair]
            api_key = "KEY"
            bounding_box = { nwlng = -122.3, nwlat = 37.7, selng = -122.5, selat = 37.8 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvertedBoundingBox { .. })
        ));
    }

    #[test]
    fn test_rejects_incomplete_gmail() {
        let err = parse(
            r#"
            [purpleair]
            api_key = "KEY"
            sensor_indices = [1]

            [alert]
            notifier = "gmail"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingGmailSettings)
        );

        let err = parse(
            r#"
            [purpleair]
            api_key = " "
            sensor_indices = [1]
            "#,
        )
        .unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::MissingApiKey));
    }
}
