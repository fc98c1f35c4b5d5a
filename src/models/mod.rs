pub mod media;
pub mod media_model;
pub mod media_type;
pub mod url_media_model;

pub use media::*;
pub use media_model::*;
pub use media_type::*;
pub use url_media_model::*;
