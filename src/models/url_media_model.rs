use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use super::{MediaModel, MediaType};
use crate::config::ThumbnailConfig;
use crate::error::{MediaError, Result};
use crate::metadata::MetadataExtractor;
use crate::thumbnails::generator::ThumbnailGenerator;
use crate::thumbnails::video::VideoThumbnailer;

/// Media model backed by a local `file:` URL.
#[derive(Debug, Clone)]
pub struct UrlMediaModel {
    url: Url,
    config: Arc<ThumbnailConfig>,
}

impl UrlMediaModel {
    pub fn new(url: Url) -> Self {
        Self::with_config(url, Arc::new(ThumbnailConfig::default()))
    }

    pub fn with_config(url: Url, config: Arc<ThumbnailConfig>) -> Self {
        Self { url, config }
    }

    /// Builds a model from a filesystem path. Relative paths are resolved
    /// against the current directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| MediaError::io(path, e))?
                .join(path)
        };

        let url = Url::from_file_path(&absolute).map_err(|()| {
            MediaError::io(
                &absolute,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a valid file path"),
            )
        })?;
        Ok(Self::new(url))
    }

    pub fn source_url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    fn classify(&self) -> MediaType {
        MediaType::from_url(&self.url)
    }

    fn file_path(&self) -> Result<PathBuf> {
        self.url
            .to_file_path()
            .map_err(|()| MediaError::NotAFileUrl(self.url.clone()))
    }

    async fn read_file(&self) -> Result<Vec<u8>> {
        let path = self.file_path()?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| MediaError::io(path, e))
    }

    async fn generate_thumbnail(&self) -> Result<Vec<u8>> {
        let path = self.file_path()?;
        match self.classify() {
            MediaType::Image => self.read_file().await,
            MediaType::Video => VideoThumbnailer::extract_frame(&path, &self.config).await,
            MediaType::Files => ThumbnailGenerator::generate_png(&path, &self.config).await,
        }
    }

    async fn generate_thumbnail_url(&self) -> Result<Url> {
        if self.classify() == MediaType::Image {
            return Ok(self.url.clone());
        }

        let png = self.generate_thumbnail().await?;
        let thumb_path = ThumbnailGenerator::persist_png(png, &self.config.temp_dir).await?;
        Url::from_file_path(&thumb_path).map_err(|()| {
            MediaError::io(
                &thumb_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "temp dir is not absolute"),
            )
        })
    }
}

/// Logs a failed accessor and turns it into an absent result.
fn absent_on_error<T>(url: &Url, what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_unsupported() => {
            debug!(%url, what, "Not available: {}", e);
            None
        }
        Err(e) => {
            warn!(%url, what, error = %e, "Media accessor failed");
            None
        }
    }
}

#[async_trait]
impl MediaModel for UrlMediaModel {
    fn id(&self) -> String {
        self.url.as_str().to_string()
    }

    fn media_type(&self) -> Option<MediaType> {
        Some(self.classify())
    }

    fn duration(&self) -> Option<f64> {
        if !self.classify().is_video() {
            return None;
        }
        let path = self.file_path().ok()?;
        MetadataExtractor::video_duration(&path, &self.config)
    }

    async fn url(&self) -> Option<Url> {
        Some(self.url.clone())
    }

    async fn thumbnail_url(&self) -> Option<Url> {
        absent_on_error(&self.url, "thumbnail_url", self.generate_thumbnail_url().await)
    }

    async fn data(&self) -> Result<Vec<u8>> {
        self.read_file().await
    }

    async fn thumbnail_data(&self) -> Option<Vec<u8>> {
        absent_on_error(&self.url, "thumbnail_data", self.generate_thumbnail().await)
    }
}

impl PartialEq for UrlMediaModel {
    fn eq(&self, other: &Self) -> bool {
        self.url.as_str() == other.url.as_str()
    }
}

impl Eq for UrlMediaModel {}

impl std::hash::Hash for UrlMediaModel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.as_str().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::tempdir;

    fn create_test_image(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([90, 160, 30]))
            .save(path)
            .unwrap();
    }

    /// Writes an executable shell script standing in for an external tool.
    #[cfg(unix)]
    fn write_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn model_in(dir: &Path, file: &Path) -> UrlMediaModel {
        let config = ThumbnailConfig::default()
            .with_temp_dir(dir)
            .with_ffmpeg("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        UrlMediaModel::with_config(Url::from_file_path(file).unwrap(), Arc::new(config))
    }

    #[tokio::test]
    async fn test_image_is_its_own_thumbnail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        create_test_image(&path, 64, 48);
        let model = model_in(dir.path(), &path);

        assert_eq!(model.media_type(), Some(MediaType::Image));
        assert_eq!(model.duration(), None);
        assert_eq!(model.thumbnail_url().await.as_ref(), Some(model.source_url()));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(model.data().await.unwrap(), bytes);
        assert_eq!(model.thumbnail_data().await, Some(bytes));
    }

    #[tokio::test]
    async fn test_url_is_passthrough() {
        let url = Url::parse("file:///tmp/anything.bin").unwrap();
        let model = UrlMediaModel::new(url.clone());
        assert_eq!(model.url().await, Some(url));
    }

    #[tokio::test]
    async fn test_generic_file_thumbnail_url() {
        let dir = tempdir().unwrap();
        let thumbs = tempdir().unwrap();
        // Raster content behind a non-image extension
        let png = dir.path().join("scan.png");
        create_test_image(&png, 300, 150);
        let path = dir.path().join("scan.bin");
        std::fs::rename(&png, &path).unwrap();
        let model = model_in(thumbs.path(), &path);

        assert_eq!(model.media_type(), Some(MediaType::Files));

        let thumb_url = model.thumbnail_url().await.unwrap();
        assert_ne!(&thumb_url, model.source_url());
        let thumb_path = thumb_url.to_file_path().unwrap();
        assert!(thumb_path.starts_with(thumbs.path()));
        assert_eq!(
            thumb_path.extension().and_then(|e| e.to_str()),
            Some("png")
        );

        let thumb = image::open(&thumb_path).unwrap();
        assert_eq!(thumb.dimensions(), (100, 50));
    }

    #[tokio::test]
    async fn test_generic_file_thumbnail_data() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("tiny.png");
        create_test_image(&png, 20, 10);
        let path = dir.path().join("tiny.dat");
        std::fs::rename(&png, &path).unwrap();
        let model = model_in(dir.path(), &path);

        let data = model.thumbnail_data().await.unwrap();
        assert!(image_loader::is_png(&data));
    }

    #[tokio::test]
    async fn test_unsupported_file_thumbnail_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%fake").unwrap();
        let model = model_in(dir.path(), &path);

        assert_eq!(model.media_type(), Some(MediaType::Files));
        assert_eq!(model.thumbnail_url().await, None);
        assert_eq!(model.thumbnail_data().await, None);
        // Nothing written for a failed generation
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_video_without_ffmpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, b"not a real movie").unwrap();
        let model = model_in(dir.path(), &path);

        assert_eq!(model.media_type(), Some(MediaType::Video));
        assert_eq!(model.duration(), None);
        assert_eq!(model.thumbnail_url().await, None);
        assert_eq!(model.thumbnail_data().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_video_frame_and_duration() {
        let tools = tempdir().unwrap();
        let thumbs = tempdir().unwrap();
        let media = tempdir().unwrap();

        let frame = tools.path().join("frame.png");
        create_test_image(&frame, 32, 18);
        let ffmpeg = write_tool(
            tools.path(),
            "ffmpeg",
            &format!("#!/bin/sh\ncat '{}'\n", frame.display()),
        );
        let ffprobe = write_tool(tools.path(), "ffprobe", "#!/bin/sh\necho 12.75\n");

        // Container the header parsers do not understand, so ffprobe answers
        let clip = media.path().join("clip.mov");
        std::fs::write(&clip, b"opaque movie payload").unwrap();
        let config = ThumbnailConfig::default()
            .with_temp_dir(thumbs.path())
            .with_ffmpeg(&ffmpeg, &ffprobe);
        let model = UrlMediaModel::with_config(Url::from_file_path(&clip).unwrap(), Arc::new(config));

        assert_eq!(model.media_type(), Some(MediaType::Video));
        assert_eq!(model.duration(), Some(12.75));

        let expected = std::fs::read(&frame).unwrap();
        let data = model.thumbnail_data().await.unwrap();
        assert!(image_loader::is_png(&data));
        assert_eq!(data, expected);

        let thumb_url = model.thumbnail_url().await.unwrap();
        assert_ne!(&thumb_url, model.source_url());
        let thumb_path = thumb_url.to_file_path().unwrap();
        assert!(thumb_path.starts_with(thumbs.path()));
        let name = thumb_path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("thumb-"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&thumb_path).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_large_non_image_thumbnail_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.bin");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(1 << 30).unwrap();
        drop(file);
        let model = model_in(dir.path(), &path);

        assert_eq!(model.media_type(), Some(MediaType::Files));
        assert_eq!(model.thumbnail_data().await, None);
        assert_eq!(model.thumbnail_url().await, None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempdir().unwrap();
        let model = model_in(dir.path(), &dir.path().join("gone.jpg"));

        assert!(matches!(model.data().await, Err(MediaError::Io { .. })));
        assert_eq!(model.thumbnail_data().await, None);
        // Images never touch the file for their thumbnail URL
        assert!(model.thumbnail_url().await.is_some());
    }

    #[tokio::test]
    async fn test_non_file_url() {
        let model = UrlMediaModel::new(Url::parse("https://example.com/photo.jpg").unwrap());

        assert_eq!(model.media_type(), Some(MediaType::Image));
        assert!(matches!(model.data().await, Err(MediaError::NotAFileUrl(_))));
        assert_eq!(model.thumbnail_data().await, None);
    }

    #[test]
    fn test_identity_is_url_string() {
        let a = UrlMediaModel::new(Url::parse("file:///tmp/photo.jpg").unwrap());
        let b = UrlMediaModel::new(Url::parse("file:///tmp/photo.jpg").unwrap());
        let c = UrlMediaModel::new(Url::parse("file:///tmp/other.jpg").unwrap());

        assert_eq!(a.id(), "file:///tmp/photo.jpg");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_path_relative() {
        let model = UrlMediaModel::from_path("relative/clip.mp4").unwrap();
        assert!(model.source_url().as_str().ends_with("/relative/clip.mp4"));
        assert_eq!(model.media_type(), Some(MediaType::Video));
    }
}
