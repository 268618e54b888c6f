//! Feature extractor crate for the AQI model.
//!
//! This crate turns raw pollutant readings into the fixed-order feature
//! vectors used for both training and inference. The order is pinned by
//! [`FEATURE_SCHEMA`], which every persisted model carries a stamp of.

use air_quality_structs::PollutantReading;
use serde::{Deserialize, Serialize};

/// The number of features fed to the model.
pub const FEATURE_COUNT: usize = 6;

/// A model input vector laid out according to [`FEATURE_SCHEMA`].
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Named, versioned layout of the model input vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: u32,
    pub names: [&'static str; FEATURE_COUNT],
}

/// The feature layout shared by training and inference.
///
/// Changing the order or meaning of any feature requires bumping `version`,
/// which makes previously trained artifacts fail to load.
pub const FEATURE_SCHEMA: FeatureSchema = FeatureSchema {
    version: 1,
    names: ["pm25", "pm10", "no2", "so2", "co", "o3"],
};

/// Owned copy of a [`FeatureSchema`] that can be persisted with a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStamp {
    pub version: u32,
    pub names: Vec<String>,
}

impl FeatureSchema {
    /// Returns the persistable form of this schema.
    #[must_use]
    pub fn stamp(&self) -> SchemaStamp {
        SchemaStamp {
            version: self.version,
            names: self.names.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    /// Returns true if a persisted stamp describes this exact layout.
    #[must_use]
    pub fn matches(&self, stamp: &SchemaStamp) -> bool {
        stamp.version == self.version
            && stamp.names.len() == FEATURE_COUNT
            && stamp.names.iter().zip(self.names).all(|(a, b)| a == b)
    }
}

/// Upper bounds that readings are clamped to before inference.
///
/// These match the range of the historical training data.
pub mod bounds {
    /// PM2.5 in µg/m³.
    pub const PM25_MAX: f64 = 500.0;
    /// PM10 in µg/m³.
    pub const PM10_MAX: f64 = 600.0;
    /// NO2 in µg/m³.
    pub const NO2_MAX: f64 = 200.0;
    /// SO2 in µg/m³.
    pub const SO2_MAX: f64 = 200.0;
    /// CO in mg/m³ (after unit conversion).
    pub const CO_MAX: f64 = 50.0;
    /// O3 in µg/m³.
    pub const O3_MAX: f64 = 300.0;
}

/// Micrograms per milligram.
pub const UG_PER_MG: f64 = 1000.0;

/// Options controlling how readings are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizationOptions {
    /// Floor negative concentrations at zero. Off by default, in which case
    /// negative values pass through unchanged.
    pub floor_negative: bool,
}

/// Converts CO from µg/m³ (as reported by the provider) to mg/m³.
#[must_use]
pub fn convert_co_to_mg(reading: PollutantReading) -> PollutantReading {
    PollutantReading {
        co: reading.co / UG_PER_MG,
        ..reading
    }
}

/// Clamps each pollutant to its upper bound.
///
/// Expects `co` already in mg/m³.
#[must_use]
pub fn normalize(reading: PollutantReading, options: NormalizationOptions) -> PollutantReading {
    let clamp = |value: f64, max: f64| {
        let value = value.min(max);
        if options.floor_negative {
            value.max(0.0)
        } else {
            value
        }
    };

    PollutantReading {
        pm25: clamp(reading.pm25, bounds::PM25_MAX),
        pm10: clamp(reading.pm10, bounds::PM10_MAX),
        no2: clamp(reading.no2, bounds::NO2_MAX),
        so2: clamp(reading.so2, bounds::SO2_MAX),
        co: clamp(reading.co, bounds::CO_MAX),
        o3: clamp(reading.o3, bounds::O3_MAX),
    }
}

/// Lays a reading out in [`FEATURE_SCHEMA`] order.
#[must_use]
pub const fn feature_vector(reading: &PollutantReading) -> FeatureVector {
    [
        reading.pm25,
        reading.pm10,
        reading.no2,
        reading.so2,
        reading.co,
        reading.o3,
    ]
}

/// Extracts model features from a raw provider reading.
///
/// Applies CO unit conversion, then normalization, then vectorization.
#[must_use]
pub fn extract_features(reading: PollutantReading, options: NormalizationOptions) -> FeatureVector {
    let converted = convert_co_to_mg(reading);
    let normalized = normalize(converted, options);
    feature_vector(&normalized)
}
