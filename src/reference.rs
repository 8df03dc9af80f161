//! Loading reference images from disk.

use crate::error::Result;
use crate::image::{ImageFormat, InlineImage, MAX_REFERENCE_IMAGES};
use futures::future::try_join_all;
use std::path::{Path, PathBuf};

/// MIME type used when neither the content nor the extension is recognised.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Guesses the MIME type of a file from its bytes, then its extension.
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    ImageFormat::from_magic_bytes(bytes)
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .map(|format| format.mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// Reads one file and encodes it as a data URI.
pub async fn load_reference_image(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let mime_type = detect_mime_type(path, &bytes);
    tracing::debug!(path = %path.display(), mime_type, size = bytes.len(), "loaded reference image");
    Ok(InlineImage::from_bytes(mime_type, &bytes).to_data_uri())
}

/// Reads up to [`MAX_REFERENCE_IMAGES`] files concurrently.
///
/// The result keeps the order of `paths`. Extra paths are ignored; any read
/// failure fails the whole load.
pub async fn load_reference_images<I, P>(paths: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
    if paths.len() > MAX_REFERENCE_IMAGES {
        tracing::warn!(
            selected = paths.len(),
            kept = MAX_REFERENCE_IMAGES,
            "too many reference images selected, keeping the first ones"
        );
    }

    try_join_all(
        paths
            .iter()
            .take(MAX_REFERENCE_IMAGES)
            .map(|path| load_reference_image(path)),
    )
    .await
}
