use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or filtering a STAC hierarchy.
#[derive(Debug, Error)]
pub enum StacError {
    /// Reading a file or directory failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A STAC document could not be decoded.
    #[error("Could not read STAC document {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The tile-name regular expression does not compile.
    #[error("Invalid collection pattern: {0}")]
    InvalidTilePattern(#[from] regex::Error),

    /// The item glob pattern does not compile.
    #[error("Invalid item pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        source: glob::PatternError,
    },

    /// A directory could not be read while expanding the item glob.
    #[error("Glob traversal failed: {0}")]
    Glob(#[from] glob::GlobError),

    /// A time string does not match the expected pattern.
    #[error("Could not parse {input:?} with pattern {pattern:?}: {source}")]
    TimeParse {
        input: String,
        pattern: String,
        source: chrono::ParseError,
    },

    /// The hierarchy root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl StacError {
    /// True for errors caused by a malformed document rather than by the filesystem.
    pub fn is_malformed_document(&self) -> bool {
        matches!(self, StacError::Json { .. })
    }
}

pub type Result<T> = std::result::Result<T, StacError>;
