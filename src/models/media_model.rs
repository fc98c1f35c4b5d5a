use std::fmt::Debug;

use async_trait::async_trait;
use url::Url;

use super::MediaType;
use crate::error::Result;

/// Capability interface every media source implements.
///
/// All accessors are best-effort: a missing value means the source could not
/// provide it, never that the caller should retry. Only [`MediaModel::data`]
/// reports why it failed.
#[async_trait]
pub trait MediaModel: Debug + Send + Sync {
    /// Stable identity of the underlying source.
    fn id(&self) -> String;

    /// Classification, or `None` when the source cannot be classified.
    fn media_type(&self) -> Option<MediaType>;

    /// Playback length in seconds. Only meaningful for video.
    ///
    /// Synchronous; implementations may do bounded blocking I/O.
    fn duration(&self) -> Option<f64>;

    async fn url(&self) -> Option<Url>;

    async fn thumbnail_url(&self) -> Option<Url>;

    /// Full raw contents of the source.
    async fn data(&self) -> Result<Vec<u8>>;

    async fn thumbnail_data(&self) -> Option<Vec<u8>>;
}
