//! Generic thumbnail generation using the image crate.
//!
//! Files are recognised by content rather than extension, so anything the
//! image crate can decode gets a preview. The result is scaled to fit the
//! configured box without upscaling and always encoded as PNG.

use std::io::Write;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tokio::task;
use tracing::{debug, trace};

use crate::config::ThumbnailConfig;
use crate::error::{MediaError, Result};
use crate::image_loader;

/// Prefix for generated thumbnail files in the temp directory.
const THUMB_FILE_PREFIX: &str = "thumb-";

/// Thumbnail generator for files without a dedicated preview path.
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Decode `src` and scale it to fit within `box_size`.
    ///
    /// Only a short prefix is read from files that are not images.
    pub fn generate(src: &Path, box_size: (u32, u32)) -> Result<DynamicImage> {
        if image_loader::sniff_file(src)?.is_none() {
            return Err(MediaError::Unsupported(src.to_path_buf()));
        }

        let bytes = std::fs::read(src).map_err(|e| MediaError::io(src, e))?;
        let img = image_loader::decode_image(&bytes, src)?;
        Ok(Self::fit(&img, box_size))
    }

    /// Generate a thumbnail for `src` and return it as PNG bytes.
    ///
    /// Decoding and encoding run on the blocking pool.
    pub async fn generate_png(src: &Path, config: &ThumbnailConfig) -> Result<Vec<u8>> {
        let src = src.to_path_buf();
        let box_size = config.size;

        task::spawn_blocking(move || {
            debug!(?src, ?box_size, "Generating thumbnail");
            let thumbnail = Self::generate(&src, box_size)?;
            image_loader::encode_png(&thumbnail, &src)
        })
        .await?
    }

    /// Write PNG bytes to a freshly named file in `dir` and return its path.
    ///
    /// The file is kept on disk; the caller owns cleanup.
    pub async fn persist_png(png: Vec<u8>, dir: &Path) -> Result<PathBuf> {
        let dir = dir.to_path_buf();

        task::spawn_blocking(move || {
            let mut file = tempfile::Builder::new()
                .prefix(THUMB_FILE_PREFIX)
                .suffix(".png")
                .tempfile_in(&dir)
                .map_err(|e| MediaError::io(&dir, e))?;
            file.write_all(&png)
                .map_err(|e| MediaError::io(file.path(), e))?;

            let (_, path) = file.keep().map_err(|e| MediaError::io(&dir, e.error))?;
            trace!(?path, bytes = png.len(), "Saved thumbnail");
            Ok(path)
        })
        .await?
    }

    /// Scale `img` to fit within `box_size`, preserving aspect ratio.
    fn fit(img: &DynamicImage, box_size: (u32, u32)) -> DynamicImage {
        let (src_width, src_height) = img.dimensions();
        let (width, height) = Self::calculate_dimensions(src_width, src_height, box_size);

        if (width, height) == (src_width, src_height) {
            return img.clone();
        }
        // CatmullRom provides good quality/speed balance for downscaling
        img.resize_exact(width, height, FilterType::CatmullRom)
    }

    /// Calculate dimensions that fit inside `box_size` while preserving the
    /// aspect ratio. Sources already inside the box are left as they are.
    fn calculate_dimensions(src_width: u32, src_height: u32, box_size: (u32, u32)) -> (u32, u32) {
        let (box_width, box_height) = (box_size.0.max(1), box_size.1.max(1));
        if src_width == 0 || src_height == 0 {
            return (box_width, box_height);
        }
        if src_width <= box_width && src_height <= box_height {
            return (src_width, src_height);
        }

        let scale = f64::min(
            box_width as f64 / src_width as f64,
            box_height as f64 / src_height as f64,
        );
        let width = ((src_width as f64 * scale).round() as u32).clamp(1, box_width);
        let height = ((src_height as f64 * scale).round() as u32).clamp(1, box_height);

        (width, height)
    }
}
