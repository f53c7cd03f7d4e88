// error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriskError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode asset snapshot {path:?}: {source}")]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
    #[error("failed to decode boundary file {path:?}: {source}")]
    GeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },
    #[error("boundary file {path:?} is not a FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
    #[error("asset snapshot {path:?} has no column `{column}`")]
    MissingColumn { path: PathBuf, column: String },
    #[error("asset snapshot {path:?} has nulls in key column `{column}`")]
    NullKey { path: PathBuf, column: String },
    #[error("column `{column}` in {path:?} cannot be read as {expected}: {source}")]
    ColumnType {
        path: PathBuf,
        column: String,
        expected: &'static str,
        #[source]
        source: arrow::error::ArrowError,
    },
    #[error("failed to parse dashboard config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to encode map layer: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),
    #[error("failed to draw map image: {0}")]
    Draw(String),
}

pub type Result<T> = std::result::Result<T, TriskError>;
