use std::path::Path;

use url::Url;

/// Classification of a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Image,
    Video,
    /// Anything that is neither a recognised image nor video.
    Files,
}

impl MediaType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "tif" | "tiff" | "ico" | "heic"
            | "heif" | "avif" => Self::Image,
            "mov" | "mp4" | "m4v" | "webm" | "mkv" | "avi" | "3gp" => Self::Video,
            _ => Self::Files,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Files)
    }

    /// Classifies by the extension of the URL's last path segment.
    pub fn from_url(url: &Url) -> Self {
        url.path_segments()
            .and_then(|segments| segments.last())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(Self::Files)
    }

    pub fn is_image(self) -> bool {
        self == Self::Image
    }

    pub fn is_video(self) -> bool {
        self == Self::Video
    }
}
