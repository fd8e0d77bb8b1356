use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing {what}: {} does not exist", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("Cache {} was computed for {found} frames, expected {expected}", .path.display())]
    CacheMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Expected {expected} frames, got {found}")]
    FrameCountMismatch { expected: usize, found: usize },

    #[error("Degenerate calibration: {0}")]
    DegenerateCalibration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl Error {
    pub(crate) fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Error::MissingInput {
            what,
            path: path.into(),
        }
    }
}
