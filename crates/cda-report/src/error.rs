use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed line in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed resource in {path}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: cda_model::ModelError,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
