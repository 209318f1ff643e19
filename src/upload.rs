use crate::error::OcrError;
use axum::body::Bytes;

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// MIME types matching [`ALLOWED_EXTENSIONS`]
pub const SUPPORTED_FORMATS: [&str; 2] = ["image/png", "image/jpeg"];

/// One uploaded file as received from the multipart form
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub data: Bytes,
}

impl Upload {
    /// Cheap checks that must pass before any decode attempt
    pub fn validate(&self, max_file_size: usize) -> Result<(), OcrError> {
        let filename = self
            .filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OcrError::InvalidImage("No file selected".to_string()))?;

        if !has_allowed_extension(filename) {
            return Err(OcrError::InvalidImage(format!(
                "Invalid file type '{}'. Only PNG, JPG, and JPEG are allowed.",
                filename
            )));
        }

        if self.data.len() > max_file_size {
            return Err(OcrError::PayloadTooLarge {
                size: self.data.len(),
                max: max_file_size,
            });
        }

        Ok(())
    }
}

fn has_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
