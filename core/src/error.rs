use thiserror::Error;

use crate::event::EventKind;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dispatch depth {depth} exceeded while publishing '{kind}'")]
    DispatchDepthExceeded { kind: EventKind, depth: usize },

    #[error("Region '{id}' not found")]
    RegionNotFound { id: String },

    #[error("Cannot load config {path}: {reason}")]
    Config { path: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
