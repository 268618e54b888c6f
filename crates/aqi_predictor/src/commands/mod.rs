//! CLI command implementations.

pub mod ingest;
pub mod predict;
pub mod serve;
pub mod train;
