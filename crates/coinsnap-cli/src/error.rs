use std::path::PathBuf;

use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] coinsnap_core::ValidationError),

    #[error(transparent)]
    Core(#[from] coinsnap_core::CoreError),

    #[error(transparent)]
    Store(#[from] coinsnap_core::StoreError),

    #[error("no snapshot available under {}", .0.display())]
    NoData(PathBuf),

    #[error("no row in the latest snapshot for: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::NoData(_) => 3,
            Self::Missing(_) => 5,
            Self::Core(_) | Self::Serialization(_) => 4,
            Self::Store(_) => 10,
            Self::Bind { .. } | Self::Server(_) => 11,
        }
    }
}
