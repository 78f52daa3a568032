use std::path::PathBuf;

use crate::gvk::{GroupVersion, GroupVersionKind};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot resolve group version \"{0}\": schema not found")]
    GroupVersionNotFound(GroupVersion),

    #[error("cannot resolve group version kind \"{0}\": schema not found")]
    KindNotFound(GroupVersionKind),

    #[error("internal error: cannot resolve $ref {reference:?}")]
    UnresolvedRef { reference: String },

    #[error("cyclic $ref {reference:?}")]
    CyclicRef { reference: String },

    #[error("discovery: {0}")]
    Transport(#[source] BoxError),

    #[error("decode openapi document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot deep copy schema {name}")]
    Copy {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load definitions from {path}")]
    LoadDefinitions {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Whether the requested type is simply unknown, as opposed to a transport
    /// failure or malformed schema data.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupVersionNotFound(_) | Self::KindNotFound(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
