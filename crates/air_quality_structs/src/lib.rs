//! Common structs for air-quality readings and records shared across crates.

mod category;
mod metrics;
mod pollutant;
mod prediction;
mod sample;

pub use category::*;
pub use metrics::*;
pub use pollutant::*;
pub use prediction::*;
pub use sample::*;
