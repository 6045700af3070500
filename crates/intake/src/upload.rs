//! Upload payloads

use mime_guess::Mime;
use pulse_common::errors::{AppError, Result};
use std::path::Path;

/// One file destined for `POST /api/upload/file/{intake_id}`
#[derive(Debug, Clone)]
pub struct UploadFile {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: Mime,
}

impl UploadFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: Mime) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(AppError::validation("file_name", "file name must not be blank"));
        }

        Ok(Self {
            bytes,
            file_name,
            mime_type,
        })
    }

    /// Build from bytes, guessing the mime type from the file extension
    pub fn guessed(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name).first_or_octet_stream();
        Self::new(bytes, file_name, mime_type)
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AppError::validation("file", format!("not a file path: {}", path.display())))?
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(file_name = %file_name, size = bytes.len(), "Read upload from disk");

        Self::guessed(bytes, file_name)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &Mime {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_from_extension() {
        let file = UploadFile::guessed(b"%PDF".to_vec(), "notes.pdf").unwrap();
        assert_eq!(file.mime_type().as_ref(), "application/pdf");
        assert_eq!(file.file_name(), "notes.pdf");
        assert_eq!(file.len(), 4);
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        let file = UploadFile::guessed(vec![0, 1, 2], "blob.zzqx").unwrap();
        assert_eq!(file.mime_type().as_ref(), "application/octet-stream");
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = UploadFile::guessed(vec![], "  ").unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_missing_path_is_io_error() {
        let err = UploadFile::from_path("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
