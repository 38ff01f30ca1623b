use chrono::{DateTime, NaiveDateTime};

use crate::{
    error::PipelineError,
    model::{RawWeatherReading, WeatherReport},
};

const KELVIN_OFFSET: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Wall-clock time at the observation site: UTC epoch shifted by the site's offset.
pub fn local_time(epoch: i64, offset_secs: i64) -> Result<NaiveDateTime, PipelineError> {
    epoch
        .checked_add(offset_secs)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.naive_utc())
        .ok_or(PipelineError::Timestamp { epoch, offset: offset_secs })
}

pub fn transform(raw: &RawWeatherReading) -> Result<WeatherReport, PipelineError> {
    let description = raw
        .weather
        .first()
        .map(|w| w.description.clone())
        .ok_or(PipelineError::EmptyDescription)?;

    Ok(WeatherReport {
        city: raw.name.clone(),
        description,
        temperature_c: kelvin_to_celsius(raw.main.temp),
        feels_like_c: kelvin_to_celsius(raw.main.feels_like),
        min_temp_c: kelvin_to_celsius(raw.main.temp_min),
        max_temp_c: kelvin_to_celsius(raw.main.temp_max),
        pressure: raw.main.pressure,
        humidity: raw.main.humidity,
        wind_speed: raw.wind.speed,
        time_of_record: local_time(raw.dt, raw.timezone)?,
        sunrise_local: local_time(raw.sys.sunrise, raw.timezone)?,
        sunset_local: local_time(raw.sys.sunset, raw.timezone)?,
    })
}

/// Decode the extractor's JSON and transform it.
pub fn transform_value(value: serde_json::Value) -> Result<WeatherReport, PipelineError> {
    let raw: RawWeatherReading = serde_json::from_value(value).map_err(PipelineError::Decode)?;
    transform(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mumbai() -> serde_json::Value {
        json!({
            "name": "Mumbai",
            "weather": [{"description": "haze"}],
            "main": {"temp": 300.15, "feels_like": 301.0, "temp_min": 299.0, "temp_max": 302.0, "pressure": 1010, "humidity": 70},
            "wind": {"speed": 3.1},
            "dt": 1700000000,
            "timezone": 19800,
            "sys": {"sunrise": 1699999000, "sunset": 1700040000}
        })
    }

    #[test]
    fn mumbai_reading_becomes_expected_report() {
        let report = transform_value(mumbai()).unwrap();
        let out = serde_json::to_value(&report).unwrap();

        assert_eq!(out["City"], "Mumbai");
        assert_eq!(out["Description"], "haze");
        assert_eq!(out["Temperature (C)"], 27.0);
        assert_eq!(out["Pressure"], 1010);
        assert_eq!(out["Humidity"], 70);
        assert_eq!(out["Wind Speed"], 3.1);
        assert_eq!(out["Time of Record"], "2023-11-15 03:43:20");
        assert_eq!(out["Sunrise (Local Time)"], "2023-11-15 03:26:40");
        assert_eq!(out["Sunset (Local Time)"], "2023-11-15 14:50:00");
    }

    #[test]
    fn every_temperature_is_shifted_by_the_same_offset() {
        let raw: RawWeatherReading = serde_json::from_value(mumbai()).unwrap();
        let report = transform(&raw).unwrap();

        assert_eq!(report.temperature_c, raw.main.temp - 273.15);
        assert_eq!(report.feels_like_c, raw.main.feels_like - 273.15);
        assert_eq!(report.min_temp_c, raw.main.temp_min - 273.15);
        assert_eq!(report.max_temp_c, raw.main.temp_max - 273.15);
    }

    #[test]
    fn sunrise_and_sunset_use_the_observation_offset() {
        let raw: RawWeatherReading = serde_json::from_value(mumbai()).unwrap();
        let report = transform(&raw).unwrap();

        let shift = chrono::Duration::seconds(raw.timezone);
        let utc = |ts| DateTime::from_timestamp(ts, 0).unwrap().naive_utc();
        assert_eq!(report.time_of_record, utc(raw.dt) + shift);
        assert_eq!(report.sunrise_local, utc(raw.sys.sunrise) + shift);
        assert_eq!(report.sunset_local, utc(raw.sys.sunset) + shift);
    }

    #[test]
    fn negative_offset_moves_time_backwards() {
        let t = local_time(1700000000, -18000).unwrap();
        assert_eq!(t.to_string(), "2023-11-14 17:13:20");
    }

    #[test]
    fn empty_description_list_fails() {
        let mut value = mumbai();
        value["weather"] = json!([]);

        let err = transform_value(value).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDescription));
    }

    #[test]
    fn missing_key_fails_the_whole_step() {
        let mut value = mumbai();
        value["main"].as_object_mut().unwrap().remove("humidity");

        let err = transform_value(value).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert!(err.to_string().contains("humidity"));
    }

    #[test]
    fn out_of_range_timestamp_fails() {
        let err = local_time(i64::MAX, 1).unwrap_err();
        assert!(matches!(err, PipelineError::Timestamp { .. }));
    }
}
