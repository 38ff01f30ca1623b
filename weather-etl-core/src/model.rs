use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current-conditions payload as returned by the weather endpoint.
///
/// Only the fields the transformer consumes are declared; anything else in the
/// body is ignored. A missing declared field fails deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWeatherReading {
    pub name: String,
    pub weather: Vec<RawCondition>,
    pub main: RawMain,
    pub wind: RawWind,
    pub dt: i64,
    pub timezone: i64,
    pub sys: RawSys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub description: String,
}

/// Temperatures are in Kelvin.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSys {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Flattened, unit-converted report written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Temperature (C)")]
    pub temperature_c: f64,
    #[serde(rename = "Feels Like (C)")]
    pub feels_like_c: f64,
    #[serde(rename = "Minimum Temp (C)")]
    pub min_temp_c: f64,
    #[serde(rename = "Maximum Temp (C)")]
    pub max_temp_c: f64,
    #[serde(rename = "Pressure")]
    pub pressure: i64,
    #[serde(rename = "Humidity")]
    pub humidity: u8,
    #[serde(rename = "Wind Speed")]
    pub wind_speed: f64,
    #[serde(rename = "Time of Record", with = "local_datetime")]
    pub time_of_record: NaiveDateTime,
    #[serde(rename = "Sunrise (Local Time)", with = "local_datetime")]
    pub sunrise_local: NaiveDateTime,
    #[serde(rename = "Sunset (Local Time)", with = "local_datetime")]
    pub sunset_local: NaiveDateTime,
}

/// Local civil timestamps are stored as plain text, e.g. `2023-11-15 04:03:20`.
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identity of one pipeline run; task results are passed from task to task directly.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub run_id: Uuid,
    pub logical_date: DateTime<Utc>,
}

impl RunContext {
    pub fn new(logical_date: DateTime<Utc>) -> Self {
        Self { run_id: Uuid::new_v4(), logical_date }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub logical_date: DateTime<Utc>,
    pub report: WeatherReport,
    pub path: PathBuf,
    /// `false` when the write failed and the pipeline was told to tolerate it.
    pub saved: bool,
}
