use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::PollutantReading;

/// One row of the historical city/day dataset.
///
/// Field names follow the column headers of the source CSV. Any numeric
/// cell may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "PM2.5", alias = "PM25")]
    pub pm25: Option<f64>,
    #[serde(rename = "PM10")]
    pub pm10: Option<f64>,
    #[serde(rename = "NO2")]
    pub no2: Option<f64>,
    #[serde(rename = "SO2")]
    pub so2: Option<f64>,
    #[serde(rename = "CO")]
    pub co: Option<f64>,
    #[serde(rename = "O3")]
    pub o3: Option<f64>,
    #[serde(rename = "AQI")]
    pub aqi: Option<f64>,
}

/// A complete historical observation paired with its measured AQI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledReading {
    pub reading: PollutantReading,
    pub aqi: f64,
}
