//! Upload request snapshot and local image loading.

use std::path::PathBuf;

use super::state::UploadFailure;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";
/// File name sent with every upload.
pub const IMAGE_FILE_NAME: &str = "scan.jpg";
/// Content type sent with every upload.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Immutable snapshot submitted once per upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    uri: String,
    token: Option<String>,
}

impl UploadRequest {
    pub fn new(uri: impl Into<String>, token: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            token,
        }
    }

    /// Normalized image URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Token captured when the attempt started.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Reads the image bytes behind the URI.
    ///
    /// # Errors
    /// Returns [`UploadFailure::Image`] for unsupported schemes or unreadable files.
    pub async fn read_image(&self) -> Result<Vec<u8>, UploadFailure> {
        let path = local_path(&self.uri).map_err(UploadFailure::Image)?;
        let display = path.display().to_string();
        tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| UploadFailure::Image(format!("Image read task failed: {e}")))?
            .map_err(|e| UploadFailure::Image(format!("Could not read image {display}: {e}")))
    }
}

/// Resolves a `file://` URI or bare path to a filesystem path.
fn local_path(uri: &str) -> Result<PathBuf, String> {
    if uri.trim().is_empty() {
        return Err("No image selected".to_string());
    }
    if let Some(rest) = uri.strip_prefix("file://") {
        return Ok(url::Url::parse(uri)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from(rest)));
    }
    if let Some((scheme, _)) = uri.split_once("://") {
        return Err(format!(
            "Cannot read {scheme}:// images directly; resolve them through the media picker first"
        ));
    }
    Ok(PathBuf::from(uri))
}
