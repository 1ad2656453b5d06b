/// Image validation and media storage
///
/// Uploaded payloads are sniffed against the magic numbers of the accepted
/// formats before anything touches disk; a payload that doesn't parse as one
/// of them is a validation failure, not a storage error. Accepted files are
/// written under the media root at `products/{product_id}/{uuid}.{ext}` and
/// the relative path is what the database row records.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Sniffs the payload's format from its magic number
    ///
    /// Returns `None` when the payload is not a structurally recognizable
    /// image of an accepted format.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        // RIFF container with a WEBP fourcc at offset 8
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }
        None
    }

    /// File extension used when storing this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// Stores a validated image payload under the media root
///
/// Returns the storage path relative to the media root. The caller has
/// already sniffed `format` from the same bytes.
///
/// # Errors
///
/// Returns an I/O error if the media directory cannot be created or the
/// file cannot be written.
pub async fn store_image(
    media_root: &Path,
    product_id: Uuid,
    format: ImageFormat,
    data: &[u8],
) -> std::io::Result<String> {
    let relative = PathBuf::from("products")
        .join(product_id.to_string())
        .join(format!("{}.{}", Uuid::new_v4(), format.extension()));

    let full = media_root.join(&relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, data).await?;

    // Relative paths are stored with forward slashes regardless of platform
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A tiny, valid 1x1 pixel GIF
    const MINIMAL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
    ];

    #[test]
    fn test_sniff_gif() {
        assert_eq!(ImageFormat::sniff(MINIMAL_GIF), Some(ImageFormat::Gif));
    }

    #[test]
    fn test_sniff_png() {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(ImageFormat::sniff(&data), Some(ImageFormat::Png));
    }

    #[test]
    fn test_sniff_jpeg() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(ImageFormat::sniff(&data), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_sniff_webp() {
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        data.extend_from_slice(b"WEBP");
        data.extend_from_slice(b"VP8 ");
        assert_eq!(ImageFormat::sniff(&data), Some(ImageFormat::Webp));
    }

    #[test]
    fn test_sniff_rejects_non_images() {
        assert_eq!(ImageFormat::sniff(b"not an image at all"), None);
        assert_eq!(ImageFormat::sniff(b""), None);
        // RIFF without the WEBP fourcc (e.g. a WAV file)
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        data.extend_from_slice(b"WAVE");
        assert_eq!(ImageFormat::sniff(&data), None);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(ImageFormat::Gif.extension(), "gif");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[tokio::test]
    async fn test_store_image_writes_relative_path() {
        let root = std::env::temp_dir().join(format!("bazaar-media-{}", Uuid::new_v4()));
        let product_id = Uuid::new_v4();

        let relative = store_image(&root, product_id, ImageFormat::Gif, MINIMAL_GIF)
            .await
            .expect("store should succeed");

        assert!(relative.starts_with(&format!("products/{}/", product_id)));
        assert!(relative.ends_with(".gif"));

        let written = tokio::fs::read(root.join(&relative))
            .await
            .expect("stored file should exist");
        assert_eq!(written, MINIMAL_GIF);

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
