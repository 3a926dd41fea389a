use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("path is outside the workspace root: {0}")]
    OutsideWorkspace(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode a record")]
    Serde(#[from] serde_json::Error),

    #[error("http transport error")]
    Http(#[from] reqwest::Error),

    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("remote returned an unexpected payload: {0}")]
    Payload(String),

    #[error("missing or invalid configuration: {0}")]
    Config(&'static str),
}

impl Error {
    /// The local path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::OutsideWorkspace(p) | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }
}
