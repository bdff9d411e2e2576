//! Inline images as base64 data URLs.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

/// Image subtype recognised from the leading bytes.
pub fn image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        Some("png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else if bytes.starts_with(b"BM") {
        Some("bmp")
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some("tiff")
    } else {
        None
    }
}

/// `data:image/<type>;base64,<data>` for the image at `path`.
pub fn encode_image(path: &Path) -> Result<String, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ImageNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|_| ConfigError::ImageNotFound(path.to_path_buf()))?;
    let kind = image_type(&bytes).ok_or_else(|| ConfigError::UnsupportedImage(path.to_path_buf()))?;
    Ok(format!("data:image/{};base64,{}", kind, STANDARD.encode(&bytes)))
}

/// Encode every image, failing on the first unusable one.
pub fn encode_all(paths: &[std::path::PathBuf]) -> Result<Vec<String>, ConfigError> {
    paths.iter().map(|p| encode_image(p)).collect()
}
