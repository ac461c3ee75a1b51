//! Shared helpers for multipart file intake and blob serving.

use axum::body::{Body, Bytes};
use axum::extract::multipart::Field;
use axum::http::header;
use axum::response::Response;
use common::storage::{ContentHash, StorageError};
use tokio_util::io::ReaderStream;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::filename::validate_flat_filename;

/// MIME types accepted for profile pictures.
pub(crate) const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// MIME types accepted for document uploads.
pub(crate) const DOCUMENT_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

/// A fully buffered multipart file field.
pub(crate) struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Read one multipart file field: validates the filename, resolves the
/// content type (declared type first, filename extension as fallback),
/// and buffers the bytes.
pub(crate) async fn read_file_field(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let filename = field
        .file_name()
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?
        .to_string();
    let filename = validate_flat_filename(&filename)
        .map_err(|e| AppError::Validation(e.into()))?
        .to_string();

    let declared = field.content_type().map(|m| m.to_string());
    let content_type =
        declared.or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()));

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;

    Ok(UploadedFile {
        filename,
        content_type,
        bytes,
    })
}

/// Reject files whose content type is not in the allow-list.
pub(crate) fn ensure_allowed_type(file: &UploadedFile, allowed: &[&str]) -> Result<(), AppError> {
    match file.content_type.as_deref() {
        Some(ct) if allowed.contains(&ct) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Unsupported file type for '{}' (allowed: {})",
            file.filename,
            allowed.join(", ")
        ))),
    }
}

pub(crate) fn map_storage_error(e: StorageError) -> AppError {
    match e {
        StorageError::SizeLimitExceeded { actual, limit } => AppError::Validation(format!(
            "File too large: {actual} bytes (limit {limit} bytes)"
        )),
        StorageError::NotFound(hash) => AppError::NotFound(format!("Blob {hash} not found")),
        other => AppError::Internal(other.to_string()),
    }
}

/// Stream a stored blob back to the client.
///
/// `disposition_filename` must already have passed flat-filename
/// validation; control characters in it would corrupt the header.
pub(crate) async fn stream_blob(
    state: &AppState,
    hash_hex: &str,
    content_type: Option<&str>,
    disposition_filename: Option<&str>,
) -> Result<Response, AppError> {
    let hash = ContentHash::from_hex(hash_hex)
        .map_err(|e| AppError::Internal(format!("Stored hash is corrupt: {e}")))?;
    let reader = state
        .blob_store
        .get_stream(&hash)
        .await
        .map_err(map_storage_error)?;

    let mut builder = Response::builder().header(
        header::CONTENT_TYPE,
        content_type.unwrap_or("application/octet-stream"),
    );
    if let Some(name) = disposition_filename {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        );
    }

    builder
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(e.to_string()))
}
