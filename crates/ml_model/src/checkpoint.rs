//! Persisted model artifact: gzip-compressed bincode with a schema stamp.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use feature_extractor::{FEATURE_SCHEMA, SchemaStamp};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{LinearModel, RandomForestRegressor};

const COMPRESSION_LEVEL: u32 = 3;

/// Errors raised while reading or writing a model artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode model artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("failed to encode model artifact {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error(
        "model artifact {path} was trained with feature schema v{found} {found_names:?}, expected v{expected} {expected_names:?}"
    )]
    SchemaMismatch {
        path: PathBuf,
        expected: u32,
        expected_names: Vec<String>,
        found: u32,
        found_names: Vec<String>,
    },
}

/// A regressor that can be persisted and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    RandomForest(RandomForestRegressor),
    Linear(LinearModel),
}

impl TrainedModel {
    #[must_use]
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        match self {
            Self::RandomForest(model) => model.predict_one(row),
            Self::Linear(model) => model.predict_one(row),
        }
    }
}

/// A trained model together with the feature layout it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: SchemaStamp,
    pub model_name: String,
    pub trained_at: DateTime<Utc>,
    pub model: TrainedModel,
}

impl ModelArtifact {
    /// Wraps a model, stamping it with the current feature schema.
    #[must_use]
    pub fn new(model_name: impl Into<String>, model: TrainedModel) -> Self {
        Self {
            schema: FEATURE_SCHEMA.stamp(),
            model_name: model_name.into(),
            trained_at: Utc::now(),
            model,
        }
    }
}

/// Saves the artifact to disk, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be written or encoded.
pub fn save_checkpoint(artifact: &ModelArtifact, path: &Path) -> Result<(), ArtifactError> {
    let io_error = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let file = File::create(path).map_err(io_error)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::new(COMPRESSION_LEVEL));
    bincode::serialize_into(&mut encoder, artifact).map_err(|source| ArtifactError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = encoder.finish().map_err(io_error)?;
    writer
        .into_inner()
        .map_err(|e| io_error(e.into_error()))?
        .sync_all()
        .map_err(io_error)?;

    info!(path = %path.display(), model = %artifact.model_name, "Saved model artifact");
    Ok(())
}

/// Loads an artifact and verifies it matches the compiled-in feature schema.
///
/// # Errors
///
/// Returns an error if the file is missing, corrupt, or was trained with a
/// different feature schema.
pub fn load_checkpoint(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let artifact: ModelArtifact =
        bincode::deserialize_from(decoder).map_err(|source| ArtifactError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    if !FEATURE_SCHEMA.matches(&artifact.schema) {
        let expected = FEATURE_SCHEMA.stamp();
        return Err(ArtifactError::SchemaMismatch {
            path: path.to_path_buf(),
            expected: expected.version,
            expected_names: expected.names,
            found: artifact.schema.version,
            found_names: artifact.schema.names,
        });
    }

    info!(
        path = %path.display(),
        model = %artifact.model_name,
        trained_at = %artifact.trained_at,
        "Loaded model artifact"
    );
    Ok(artifact)
}
