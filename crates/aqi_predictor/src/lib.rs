//! AQI prediction service
//!
//! Predicts air quality from live pollutant readings with a pretrained
//! regression model, and trains that model from historical city data.

pub mod commands;
pub mod server;
