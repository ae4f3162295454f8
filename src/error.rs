use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: first line has no field separator", .path.display())]
    Format { path: PathBuf },
}

impl PuzzleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PuzzleError::Io {
            path: path.into(),
            source,
        }
    }
}
