use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{MediaModel, MediaType, UrlMediaModel};
use crate::error::Result;

/// Public handle to one picked media item.
///
/// Equality is by handle identity only: two handles over the same file are
/// different items unless one was cloned from the other.
#[derive(Clone)]
pub struct MediaHandle {
    id: Uuid,
    source: Arc<dyn MediaModel>,
}

impl MediaHandle {
    pub fn new(source: impl MediaModel + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn MediaModel>) -> Self {
        Self::with_id(Uuid::new_v4(), source)
    }

    /// Rebuilds a handle with a known identity.
    pub fn with_id(id: Uuid, source: Arc<dyn MediaModel>) -> Self {
        Self { id, source }
    }

    pub fn from_url(url: Url) -> Self {
        Self::new(UrlMediaModel::new(url))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(UrlMediaModel::from_path(path)?))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identity of the wrapped source (e.g. the file URL).
    pub fn source_id(&self) -> String {
        self.source.id()
    }

    /// Media classification; unclassifiable sources count as generic files.
    pub fn media_type(&self) -> MediaType {
        self.source.media_type().unwrap_or(MediaType::Files)
    }

    /// Video length in seconds. This may block on a bounded ffprobe query,
    /// so async callers should run it on the blocking pool.
    pub fn duration(&self) -> Option<f64> {
        self.source.duration()
    }

    pub async fn url(&self) -> Option<Url> {
        self.source.url().await
    }

    pub async fn thumbnail_url(&self) -> Option<Url> {
        self.source.thumbnail_url().await
    }

    /// Raw bytes of the media. Read failures are reported as `None`.
    pub async fn data(&self) -> Option<Vec<u8>> {
        match self.source.data().await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(id = %self.id, error = %e, "Media data unavailable");
                None
            }
        }
    }

    pub async fn thumbnail_data(&self) -> Option<Vec<u8>> {
        self.source.thumbnail_data().await
    }
}

impl PartialEq for MediaHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MediaHandle {}

impl Hash for MediaHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaHandle")
            .field("id", &self.id)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Source that cannot classify itself or produce anything.
    #[derive(Debug)]
    struct OpaqueModel;

    #[async_trait]
    impl MediaModel for OpaqueModel {
        fn id(&self) -> String {
            "opaque".to_string()
        }

        fn media_type(&self) -> Option<MediaType> {
            None
        }

        fn duration(&self) -> Option<f64> {
            None
        }

        async fn url(&self) -> Option<Url> {
            None
        }

        async fn thumbnail_url(&self) -> Option<Url> {
            None
        }

        async fn data(&self) -> Result<Vec<u8>> {
            Err(MediaError::Unsupported(PathBuf::from("opaque")))
        }

        async fn thumbnail_data(&self) -> Option<Vec<u8>> {
            None
        }
    }

    #[test]
    fn test_unclassified_defaults_to_files() {
        let handle = MediaHandle::new(OpaqueModel);
        assert_eq!(handle.media_type(), MediaType::Files);
        assert_eq!(handle.duration(), None);
        assert_eq!(handle.source_id(), "opaque");
    }

    #[tokio::test]
    async fn test_data_error_is_swallowed() {
        let handle = MediaHandle::new(OpaqueModel);
        assert_eq!(handle.data().await, None);
        assert_eq!(handle.url().await, None);
        assert_eq!(handle.thumbnail_url().await, None);
    }

    #[test]
    fn test_equality_by_handle_id() {
        let url = Url::parse("file:///tmp/photo.jpg").unwrap();
        let a = MediaHandle::from_url(url.clone());
        let b = MediaHandle::from_url(url);

        // Same file, different identities
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let shared: Arc<dyn MediaModel> = Arc::new(OpaqueModel);
        let id = Uuid::new_v4();
        assert_eq!(
            MediaHandle::with_id(id, shared.clone()),
            MediaHandle::with_id(id, Arc::new(OpaqueModel))
        );

        let set: HashSet<_> = [a.clone(), a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_photo_scenario() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        image::RgbImage::new(8, 8).save(&path).unwrap();

        let handle = MediaHandle::from_path(&path).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        assert_eq!(handle.media_type(), MediaType::Image);
        assert_eq!(handle.url().await, Some(url.clone()));
        assert_eq!(handle.thumbnail_url().await, Some(url));
        assert_eq!(handle.data().await, Some(std::fs::read(&path).unwrap()));
    }

    #[tokio::test]
    async fn test_missing_file_data_is_absent() {
        let handle = MediaHandle::from_path("/nonexistent/dir/photo.jpg").unwrap();
        assert_eq!(handle.media_type(), MediaType::Image);
        assert_eq!(handle.data().await, None);
    }

    #[tokio::test]
    async fn test_report_scenario() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4 placeholder").unwrap();

        let handle = MediaHandle::from_path(&path).unwrap();
        assert_eq!(handle.media_type(), MediaType::Files);
        assert_eq!(handle.duration(), None);
        // PDF rendering is not supported, so the thumbnail is absent
        assert_eq!(handle.thumbnail_data().await, None);
    }
}
