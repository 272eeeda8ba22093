use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a tally run. Record-level problems never end up here;
/// see `tally::record::RecordError`.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("planning: {message}")]
    Planning {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("chunk read: {} at offset {offset} (+{length} bytes)", .path.display())]
    ChunkIo {
        path: PathBuf,
        offset: u64,
        length: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("reduce: {0}")]
    Reduce(String),

    #[error("grid: {0}")]
    Grid(String),
}

impl TallyError {
    pub fn planning(message: impl Into<String>) -> Self {
        TallyError::Planning {
            message: message.into(),
            source: None,
        }
    }
}
