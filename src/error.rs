use std::path::PathBuf;

use thiserror::Error;

use crate::projection::ProjectionError;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("{} does not exist", .0.display())]
    InputNotFound(PathBuf),

    #[error("input file is empty, expected a header line")]
    EmptyInput,

    #[error("header is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("header contains column '{0}' more than once")]
    DuplicateColumn(String),

    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder responded with HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to initialize log file: {0}")]
    LogFile(#[from] tracing_appender::rolling::InitError),

    #[error("record {ordinal}: {source}")]
    Projection {
        ordinal: usize,
        #[source]
        source: ProjectionError,
    },
}

impl GeoError {
    /// Errors raised while reading the input, before any request is sent.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GeoError::InputNotFound(_)
                | GeoError::EmptyInput
                | GeoError::MissingColumn(_)
                | GeoError::DuplicateColumn(_)
                | GeoError::MalformedRow { .. }
                | GeoError::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;
