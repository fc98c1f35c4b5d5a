use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat};

use crate::error::{MediaError, Result};

/// Detects a raster format from the leading bytes, ignoring the file name.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Leading bytes needed to recognise any supported raster signature.
const SNIFF_BYTES: u64 = 64;

/// Detects the raster format of a file from its first few bytes only.
///
/// Large non-image files are never read past the prefix.
pub fn sniff_file(path: &Path) -> Result<Option<ImageFormat>> {
    let file = File::open(path).map_err(|e| MediaError::io(path, e))?;
    let mut prefix = Vec::with_capacity(SNIFF_BYTES as usize);
    file.take(SNIFF_BYTES)
        .read_to_end(&mut prefix)
        .map_err(|e| MediaError::io(path, e))?;
    Ok(sniff_format(&prefix))
}

/// Decodes in-memory image bytes. Animated GIFs yield their first frame.
///
/// `path` is only used for error reporting.
pub fn decode_image(bytes: &[u8], path: &Path) -> Result<DynamicImage> {
    let format =
        sniff_format(bytes).ok_or_else(|| MediaError::Unsupported(path.to_path_buf()))?;

    if format == ImageFormat::Gif {
        let decoder =
            GifDecoder::new(Cursor::new(bytes)).map_err(|e| MediaError::image(path, e))?;
        let frame = decoder
            .into_frames()
            .next()
            .ok_or_else(|| MediaError::Unsupported(path.to_path_buf()))?
            .map_err(|e| MediaError::image(path, e))?;
        return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
    }

    image::load_from_memory_with_format(bytes, format).map_err(|e| MediaError::image(path, e))
}

/// Encodes an image as PNG.
pub fn encode_png(img: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| MediaError::image(path, e))?;
    Ok(buffer)
}

/// Whether the bytes start with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    sniff_format(bytes) == Some(ImageFormat::Png)
}
