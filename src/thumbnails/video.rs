//! Video frame extraction through an external ffmpeg binary.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::ThumbnailConfig;
use crate::error::{MediaError, Result};
use crate::image_loader;

pub struct VideoThumbnailer;

impl VideoThumbnailer {
    /// Grab a single frame from `path` as PNG bytes.
    ///
    /// Each configured timestamp is tried in turn; the first one that yields
    /// a decodable PNG wins.
    pub async fn extract_frame(path: &Path, config: &ThumbnailConfig) -> Result<Vec<u8>> {
        let mut last_error = None;

        for timestamp in &config.frame_timestamps {
            match Self::extract_frame_at(path, timestamp, config).await {
                Ok(png) => return Ok(png),
                Err(e) => {
                    trace!(?path, %timestamp, error = %e, "Frame extraction attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MediaError::Ffmpeg {
            path: path.to_path_buf(),
            reason: "no frame timestamps configured".to_string(),
        }))
    }

    async fn extract_frame_at(
        path: &Path,
        timestamp: &str,
        config: &ThumbnailConfig,
    ) -> Result<Vec<u8>> {
        debug!(?path, %timestamp, "Extracting video frame");

        let output = Command::new(&config.ffmpeg)
            .arg("-v")
            .arg("error")
            .arg("-ss")
            .arg(timestamp)
            .arg("-i")
            .arg(path)
            .arg("-frames:v")
            .arg("1")
            .arg("-f")
            .arg("image2pipe")
            .arg("-vcodec")
            .arg("png")
            .arg("-")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::Ffmpeg {
                path: path.to_path_buf(),
                reason: format!("failed to spawn {:?}: {}", config.ffmpeg, e),
            })?;

        if !output.status.success() {
            return Err(MediaError::Ffmpeg {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !image_loader::is_png(&output.stdout) {
            return Err(MediaError::Ffmpeg {
                path: path.to_path_buf(),
                reason: "no PNG frame produced".to_string(),
            });
        }

        Ok(output.stdout)
    }
}
