// Upload payloads. An `UploadForm` is what the UI layer hands to the API
// client: one image file part plus any text fields the endpoint reads. The
// client passes it through to the transport without looking inside.

use crate::error::PayloadError;
use std::path::Path;

/// Form field the backend reads the image from.
pub const IMAGE_FIELD: &str = "image";
/// Form field read by the add-color-background endpoint.
pub const COLOR_FIELD: &str = "color";
pub const DEFAULT_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub field_name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// Extra text fields, sent in insertion order.
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field_name: IMAGE_FIELD.to_string(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
            fields: Vec::new(),
        }
    }

    /// Read an image from disk, inferring its MIME type from the extension.
    pub fn from_file(path: &Path) -> Result<Self, PayloadError> {
        let mime = mime_for_path(path).ok_or_else(|| PayloadError::UnknownFormat(path.to_path_buf()))?;
        let bytes = std::fs::read(path).map_err(|source| PayloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(file_name, mime, bytes))
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add the background color field. Accepts `#rrggbb` or `rrggbb` and
    /// always sends the `#` form.
    pub fn with_color(self, color: &str) -> Result<Self, PayloadError> {
        let color = normalize_color(color)?;
        Ok(self.with_field(COLOR_FIELD, color))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type for the image extensions the backend understands.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

pub fn normalize_color(input: &str) -> Result<String, PayloadError> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PayloadError::InvalidColor(input.to_string()));
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}
