//! Error type shared by the media models and thumbnail pipeline.
//!
//! Public accessors never return these to callers; they are logged and
//! collapsed into `None` at the `MediaModel` boundary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a local file URL: {0}")]
    NotAFileUrl(Url),

    #[error("failed to process image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no thumbnail available for {0:?}")]
    Unsupported(PathBuf),

    #[error("ffmpeg failed for {path:?}: {reason}")]
    Ffmpeg { path: PathBuf, reason: String },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl MediaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }

    /// Whether this is an expected miss rather than a real failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;
