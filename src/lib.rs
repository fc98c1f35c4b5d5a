//! Media source models for a media picker.
//!
//! A [`MediaHandle`] wraps any [`MediaModel`] and exposes best-effort async
//! accessors for the media's type, duration, bytes and thumbnail. The
//! [`UrlMediaModel`] implementation serves local files, classifying them by
//! extension and generating PNG thumbnails through the `image` crate or an
//! external ffmpeg.

pub mod config;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod metadata;
pub mod models;
pub mod thumbnails;

pub use config::ThumbnailConfig;
pub use error::MediaError;
pub use layout::{FrameGetter, Rect};
pub use models::{MediaHandle, MediaModel, MediaType, UrlMediaModel};
