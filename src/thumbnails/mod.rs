//! Thumbnail pipeline.
//!
//! - `ThumbnailGenerator` - Fits decodable files into a PNG thumbnail and persists it
//! - `VideoThumbnailer` - Extracts a single video frame through ffmpeg

pub mod generator;
pub mod video;

pub use generator::ThumbnailGenerator;
pub use video::VideoThumbnailer;
