use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Abnormal ways a session or summary can stop.
///
/// A cancelled question inside a session is not represented here: the engine
/// recovers from it locally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("backend error: {0:#}")]
    Backend(anyhow::Error),

    #[error("content error: {0:#}")]
    Content(anyhow::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("failed to search {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
