//! Repository functions for the historical city/day dataset.

use air_quality_structs::{AirQualitySample, LabeledReading, PollutantReading};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

type TrainingRow = (f64, f64, f64, f64, f64, f64, f64);

/// Bind parameters per inserted row.
const AIR_QUALITY_COLUMNS: usize = 10;

/// Postgres caps a single statement at this many bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;

/// Most rows one multi-row `INSERT` into `air_quality_data` can carry.
pub const MAX_BATCH_ROWS: usize = MAX_BIND_PARAMS / AIR_QUALITY_COLUMNS;

/// Loads every complete historical observation.
///
/// Rows with a missing pollutant or AQI are skipped.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn load_training_rows(pool: &PgPool) -> Result<Vec<LabeledReading>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TrainingRow>(
        r"
        SELECT pm25, pm10, no2, so2, co, o3, aqi
        FROM air_quality_data
        WHERE pm25 IS NOT NULL
          AND pm10 IS NOT NULL
          AND no2 IS NOT NULL
          AND so2 IS NOT NULL
          AND co IS NOT NULL
          AND o3 IS NOT NULL
          AND aqi IS NOT NULL
        ORDER BY seq
        ",
    )
    .fetch_all(pool)
    .await?;

    debug!(rows = rows.len(), "Loaded training rows");

    Ok(rows
        .into_iter()
        .map(|(pm25, pm10, no2, so2, co, o3, aqi)| LabeledReading {
            reading: PollutantReading::new(pm25, pm10, no2, so2, co, o3),
            aqi,
        })
        .collect())
}

/// Inserts a batch of samples with multi-row `INSERT`s of at most
/// [`MAX_BATCH_ROWS`] rows each.
///
/// Returns the number of rows written. An empty batch is a no-op.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn insert_air_quality_batch(
    pool: &PgPool,
    samples: &[AirQualitySample],
) -> Result<u64, sqlx::Error> {
    let mut written = 0;
    for chunk in samples.chunks(MAX_BATCH_ROWS) {
        written += insert_chunk(pool, chunk).await?;
    }
    Ok(written)
}

async fn insert_chunk(pool: &PgPool, samples: &[AirQualitySample]) -> Result<u64, sqlx::Error> {
    let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
        "INSERT INTO air_quality_data (id, city, date, pm25, pm10, no2, so2, co, o3, aqi) ",
    );
    builder.push_values(samples, |mut row, sample| {
        row.push_bind(Uuid::new_v4())
            .push_bind(&sample.city)
            .push_bind(sample.date)
            .push_bind(sample.pm25)
            .push_bind(sample.pm10)
            .push_bind(sample.no2)
            .push_bind(sample.so2)
            .push_bind(sample.co)
            .push_bind(sample.o3)
            .push_bind(sample.aqi);
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}
