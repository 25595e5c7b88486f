// PurpleAir sensor source implementation
use crate::application::sensor_source::SensorSource;
use crate::domain::reading::SensorReading;
use crate::infrastructure::config::SensorQuery;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const REQUESTED_FIELDS: &str = "name,pm2.5_atm,humidity";

#[derive(Debug, Clone)]
pub struct PurpleAirClient {
    client: reqwest::Client,
    root_url: String,
    api_key: String,
    query: SensorQuery,
}

/// Body of `GET /v1/sensors`: column names plus one row per sensor
#[derive(Debug, Deserialize)]
struct SensorsResponse {
    fields: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

struct Columns {
    sensor_index: usize,
    name: usize,
    pm25: usize,
    humidity: Option<usize>,
}

impl Columns {
    fn locate(fields: &[String]) -> Result<Self> {
        let find = |name: &str| fields.iter().position(|f| f == name);
        let require = |name: &str| {
            find(name).with_context(|| format!("PurpleAir response has no `{}` column", name))
        };
        Ok(Self {
            sensor_index: require("sensor_index")?,
            name: require("name")?,
            pm25: require("pm2.5_atm")?,
            humidity: find("humidity"),
        })
    }
}

impl PurpleAirClient {
    pub fn new(root_url: String, api_key: String, query: SensorQuery) -> Self {
        Self::with_client(reqwest::Client::new(), root_url, api_key, query)
    }

    pub fn with_client(
        client: reqwest::Client,
        root_url: String,
        api_key: String,
        query: SensorQuery,
    ) -> Self {
        Self {
            client,
            root_url: root_url.trim_end_matches('/').to_string(),
            api_key,
            query,
        }
    }

    fn build_request_url(&self) -> String {
        build_request_url(&self.root_url, &self.query)
    }
}

fn build_request_url(root_url: &str, query: &SensorQuery) -> String {
    let mut url = format!("{}?fields={}", root_url, urlencoding::encode(REQUESTED_FIELDS));
    match query {
        SensorQuery::BoundingBox(bbox) => {
            url.push_str(&format!(
                "&nwlng={}&nwlat={}&selng={}&selat={}",
                bbox.nwlng, bbox.nwlat, bbox.selng, bbox.selat
            ));
        }
        SensorQuery::SensorList(indices) => {
            let ids: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
            url.push_str(&format!("&show_only={}", urlencoding::encode(&ids.join(","))));
        }
    }
    url
}

fn parse_readings(response: SensorsResponse) -> Result<Vec<SensorReading>> {
    let columns = Columns::locate(&response.fields)?;

    let mut readings = Vec::with_capacity(response.data.len());
    for row in &response.data {
        let cell = |idx: usize| row.get(idx).filter(|v| !v.is_null());

        let Some(sensor_index) = cell(columns.sensor_index).and_then(|v| v.as_u64()) else {
            tracing::warn!("Skipping PurpleAir row without a sensor index: {:?}", row);
            continue;
        };
        let Some(name) = cell(columns.name).and_then(|v| v.as_str()) else {
            tracing::warn!("Skipping sensor {} without a name", sensor_index);
            continue;
        };
        let Some(pm25) = cell(columns.pm25).and_then(|v| v.as_f64()) else {
            tracing::warn!("Skipping sensor {} ({}) without a PM2.5 reading", sensor_index, name);
            continue;
        };
        let humidity = columns.humidity.and_then(cell).and_then(|v| v.as_f64());

        readings.push(SensorReading::new(sensor_index, name.to_string(), pm25, humidity));
    }

    Ok(readings)
}

#[async_trait]
impl SensorSource for PurpleAirClient {
    async fn fetch_readings(&self) -> Result<Vec<SensorReading>> {
        let url = self.build_request_url();
        tracing::debug!("Requesting PurpleAir sensors: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to PurpleAir")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("PurpleAir request failed with status {}: {}", status, body);
        }

        let data = response
            .json::<SensorsResponse>()
            .await
            .context("Failed to parse PurpleAir response")?;

        let readings = parse_readings(data)?;
        tracing::info!("Fetched {} sensor readings from PurpleAir", readings.len());
        Ok(readings)
    }
}
