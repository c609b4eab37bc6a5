use std::path::PathBuf;

use thiserror::Error;

/// Raised when the maze carver is handed a grid with no interior margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze dimensions {width}x{height} are too small (both must be at least 5 after odd adjustment)")]
    InvalidDimensions { width: usize, height: usize },
}

/// Non-fatal: pickup placement gave up for this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PowerupError {
    #[error("no free tile for a pickup after {attempts} attempts")]
    NoSpawnTarget { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not resolve a data directory for this platform")]
    NoDataDir,
}
