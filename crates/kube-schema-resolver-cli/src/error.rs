use std::path::PathBuf;

use kube_schema_resolver::gvk::InvalidApiVersion;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no schema source: pass --server and/or --definitions")]
    NoSource,

    #[error(transparent)]
    ApiVersion(#[from] InvalidApiVersion),

    #[error("kind must not be empty")]
    EmptyKind,

    #[error(transparent)]
    Resolve(#[from] kube_schema_resolver::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read CA certificate {path}")]
    ReadCaCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {path}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output {path}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CliResult<T> = std::result::Result<T, CliError>;
