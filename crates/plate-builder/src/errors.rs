use std::path::PathBuf;

use cad_backend::CadError;
use plate_params::ValidationReport;

use crate::state::Stage;

/// Errors from a plate build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("parameters are not buildable: {0}")]
    Validation(ValidationReport),

    #[error("{stage} stage precondition violated: {reason}")]
    Precondition { stage: Stage, reason: String },

    #[error("{stage} stage failed: {source}")]
    Backend {
        stage: Stage,
        #[source]
        source: CadError,
    },

    #[error("cannot create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to close the CAD document: {source}")]
    Cleanup {
        #[source]
        source: CadError,
    },
}

impl BuildError {
    /// The stage that failed, if the failure belongs to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BuildError::Precondition { stage, .. } | BuildError::Backend { stage, .. } => {
                Some(*stage)
            }
            BuildError::OutputDir { .. } => Some(Stage::Finalize),
            BuildError::Validation(_) | BuildError::Cleanup { .. } => None,
        }
    }
}

/// Errors loading build configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}
