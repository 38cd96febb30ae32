// Local image handling: reading a picked file from disk and rendering a
// preview of it. Nothing here touches the network.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not an image (expected png, jpg, gif, webp, bmp or svg)")]
    NotAnImage(String),
}

/// An image picked by the user, held in memory until upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

// Bytes are left out so a debug print does not dump the whole image.
impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the form shows for the selected image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub file_name: String,
    pub size: usize,
    pub data_url: String,
}

/// MIME type for an image file name, judged by its extension.
pub fn image_mime(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, PreviewError> {
        let file_name = file_name.into();
        let mime = image_mime(&file_name).ok_or_else(|| PreviewError::NotAnImage(file_name.clone()))?;
        Ok(ImageFile { file_name, mime, bytes })
    }

    /// Read an image from disk.
    pub fn load(path: &Path) -> Result<Self, PreviewError> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        // Check the extension before reading so a huge non-image is never loaded.
        if image_mime(&file_name).is_none() {
            return Err(PreviewError::NotAnImage(file_name));
        }
        let bytes = std::fs::read(path).map_err(|source| PreviewError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded {} ({} bytes)", file_name, bytes.len());
        ImageFile::new(file_name, bytes)
    }

    pub fn preview(&self) -> ImagePreview {
        ImagePreview {
            file_name: self.file_name.clone(),
            size: self.bytes.len(),
            data_url: format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes)),
        }
    }
}
