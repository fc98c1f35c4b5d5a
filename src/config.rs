use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default edge of the square box generic thumbnails are fitted into.
pub const DEFAULT_THUMB_SIZE: u32 = 100;

/// Longest a blocking ffprobe duration query may run.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Seek positions tried in order when grabbing a video frame.
/// Many clips open on black, so a frame one second in is preferred.
const DEFAULT_FRAME_TIMESTAMPS: [&str; 2] = ["00:00:01.000", "00:00:00.000"];

/// Configuration for thumbnail generation and media probing.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Target box (width, height) for generated thumbnails.
    pub size: (u32, u32),
    /// Directory that receives generated thumbnail files.
    pub temp_dir: PathBuf,
    /// ffmpeg binary used for video frame extraction.
    pub ffmpeg: PathBuf,
    /// ffprobe binary used as a duration fallback.
    pub ffprobe: PathBuf,
    /// Seek timestamps passed to `ffmpeg -ss`.
    pub frame_timestamps: Vec<String>,
    /// Deadline for the ffprobe duration fallback.
    pub probe_timeout: Duration,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: (DEFAULT_THUMB_SIZE, DEFAULT_THUMB_SIZE),
            temp_dir: std::env::temp_dir(),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            frame_timestamps: DEFAULT_FRAME_TIMESTAMPS
                .iter()
                .map(|ts| ts.to_string())
                .collect(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ThumbnailConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(1), height.max(1));
        self
    }

    pub fn with_temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_ffmpeg(mut self, ffmpeg: impl AsRef<Path>, ffprobe: impl AsRef<Path>) -> Self {
        self.ffmpeg = ffmpeg.as_ref().to_path_buf();
        self.ffprobe = ffprobe.as_ref().to_path_buf();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_frame_timestamps<I, S>(mut self, timestamps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frame_timestamps = timestamps.into_iter().map(Into::into).collect();
        self
    }
}
