use axum::extract::Multipart;

use crate::errors::AppError;
use crate::models::upload::UploadedFile;

/// Drains every file part of a multipart body, in the order the client sent them.
/// Parts without a file name (plain form fields) are skipped.
pub async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::debug!(field = ?field.name(), "skipping non-file multipart field");
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "received upload");
        files.push(UploadedFile::new(file_name, content_type, bytes));
    }

    Ok(files)
}
