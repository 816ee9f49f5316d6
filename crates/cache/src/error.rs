//! Error types for gallery operations.

use std::io;

/// Errors returned by [`Gallery::display`](crate::Gallery::display).
///
/// Neither variant is fatal; the gallery stays consistent after both.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GalleryError {
    /// No picture is registered under this filename. Nothing was changed.
    #[error("picture not found: {filename}")]
    NotFound { filename: String },

    /// The picture's source failed. The picture stays unloaded, but the
    /// attempt still counts as an access.
    ///
    /// `evicted` lists the pictures released to make room before the load
    /// was attempted; they stay released.
    #[error("failed to load {filename}: {reason}")]
    LoadFailure {
        filename: String,
        reason: String,
        evicted: Vec<String>,
    },
}

impl GalleryError {
    pub(crate) fn not_found(filename: &str) -> Self {
        Self::NotFound {
            filename: filename.to_owned(),
        }
    }

    pub(crate) fn load_failure(filename: &str, reason: impl ToString) -> Self {
        Self::LoadFailure {
            filename: filename.to_owned(),
            reason: reason.to_string(),
            evicted: Vec::new(),
        }
    }

    /// Filename the failed request was for
    pub fn filename(&self) -> &str {
        match self {
            Self::NotFound { filename } | Self::LoadFailure { filename, .. } => filename,
        }
    }

    /// Pictures evicted on behalf of the failed request
    pub fn evicted(&self) -> &[String] {
        match self {
            Self::NotFound { .. } => &[],
            Self::LoadFailure { evicted, .. } => evicted,
        }
    }
}

/// Why a [`PictureSource`](crate::PictureSource) could not produce pixels.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{width}x{height} picture does not fit in memory")]
    TooLarge { width: u32, height: u32 },

    #[error("source returned {actual} bytes, expected {expected}")]
    WrongLength { actual: u64, expected: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}
