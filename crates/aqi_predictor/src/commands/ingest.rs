//! Ingest command - loads the historical city/day CSV into the database.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use air_quality_structs::AirQualitySample;
use anyhow::{Context, Result, ensure};
use database::{MAX_BATCH_ROWS, insert_air_quality_batch};
use sqlx::PgPool;
use tracing::{debug, info};

/// Default location of the historical dataset, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "../data/clean_city_day_aqi.csv";

/// Rows per multi-row `INSERT`.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Runs the ingest command and returns the number of rows inserted.
///
/// Rows are appended as-is; re-running duplicates them.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row cannot be parsed, or
/// an insert fails.
pub async fn run(pool: &PgPool, file: &Path, batch_size: usize) -> Result<u64> {
    validate_batch_size(batch_size)?;

    info!(file = %file.display(), batch_size, "Ingesting air quality data");

    let reader = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;

    let mut inserted = 0;
    for batch in batched(read_samples(reader), batch_size) {
        let batch = batch?;
        let rows = insert_air_quality_batch(pool, &batch)
            .await
            .context("Failed to insert batch")?;
        debug!(rows, "Inserted batch");
        inserted += rows;
    }

    info!(inserted, "Ingestion complete");
    Ok(inserted)
}

/// Checks that one batch fits in a single `INSERT`.
///
/// # Errors
///
/// Returns an error unless `batch_size` is between 1 and [`MAX_BATCH_ROWS`].
pub fn validate_batch_size(batch_size: usize) -> Result<()> {
    ensure!(
        (1..=MAX_BATCH_ROWS).contains(&batch_size),
        "batch size must be between 1 and {MAX_BATCH_ROWS}, got {batch_size}"
    );
    Ok(())
}

/// Groups rows into batches of `batch_size`, with a shorter final batch.
///
/// The first error is yielded as-is and ends the iteration.
fn batched<T>(
    rows: impl Iterator<Item = Result<T>>,
    batch_size: usize,
) -> impl Iterator<Item = Result<Vec<T>>> {
    let mut rows = rows.fuse();
    let mut failed = false;
    std::iter::from_fn(move || {
        if failed {
            return None;
        }
        let mut batch = Vec::with_capacity(batch_size);
        for row in rows.by_ref() {
            match row {
                Ok(row) => batch.push(row),
                Err(e) => {
                    failed = true;
                    return Some(Err(e));
                }
            }
            if batch.len() == batch_size {
                break;
            }
        }
        (!batch.is_empty()).then_some(Ok(batch))
    })
}

/// Parses CSV rows with headers `City, Date, PM2.5, PM10, NO2, SO2, CO, O3, AQI`.
///
/// Empty numeric cells become `None`. Extra columns are ignored.
pub fn read_samples<R: Read>(reader: R) -> impl Iterator<Item = Result<AirQualitySample>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_deserialize::<AirQualitySample>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Failed to parse CSV row {}", i + 2)))
}
