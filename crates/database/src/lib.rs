//! Postgres access for the AQI service.
//!
//! Repositories take a borrowed [`PgPool`]; the pool itself is built once per
//! process from [`DatabaseConfig`].

mod air_quality_data;
mod model_metrics;
mod prediction;

pub use air_quality_data::{MAX_BATCH_ROWS, insert_air_quality_batch, load_training_rows};
pub use model_metrics::{find_latest_model_metrics, insert_model_metrics};
pub use prediction::{find_latest_prediction, insert_prediction, list_recent_predictions};

use config::DatabaseConfig;
pub use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

const MAX_CONNECTIONS: u32 = 5;

/// Creates a connection pool to the `PostgreSQL` database.
///
/// # Errors
///
/// Returns an error if the connection to the database fails.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgPoolOptions::new().max_connections(MAX_CONNECTIONS);

    match config {
        DatabaseConfig::Url(url) => options.connect(url).await,
        DatabaseConfig::Parts {
            host,
            port,
            database,
            user,
            password,
        } => {
            let mut connect = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(user);
            if let Some(password) = password {
                connect = connect.password(password);
            }
            options.connect_with(connect).await
        }
    }
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns an error if running migrations fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
