//! Download boundary: hands a record's original file back to the client under
//! its original name.
//!
//! Every download runs inside a `DownloadHandle`, a transient handle on the
//! file's bytes that is registered on acquisition and released on drop, so no
//! exit path (including an early error) can leak one.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::intake::classify;
use crate::models::resume::ResumeRecord;
use crate::models::upload::{FileCategory, UploadedFile};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("The original file has no name to download it under")]
    MissingFileName,

    #[error("Cannot build download headers: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl From<DownloadError> for AppError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::MissingFileName => AppError::Validation(e.to_string()),
            DownloadError::Header(_) => AppError::Internal(e.into()),
        }
    }
}

/// Registry of outstanding download handles. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct DownloadHandles {
    live: Arc<AtomicUsize>,
    issued: Arc<AtomicU64>,
}

impl DownloadHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles acquired but not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn acquire(&self, file: &UploadedFile) -> DownloadHandle {
        let id = self.issued.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        debug!(handle = id, file = %file.name, "acquired download handle");
        DownloadHandle {
            id,
            bytes: file.bytes.clone(),
            live: self.live.clone(),
        }
    }
}

/// Transient handle on a file's bytes; released when dropped.
#[derive(Debug)]
pub struct DownloadHandle {
    id: u64,
    bytes: Bytes,
    live: Arc<AtomicUsize>,
}

impl DownloadHandle {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!(handle = self.id, "released download handle");
    }
}

/// A ready-to-send file download.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub content_disposition: HeaderValue,
    pub bytes: Bytes,
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
        (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, self.content_disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Materializes `record`'s original file as a download.
///
/// Reads the record only; the handle is gone by the time this returns,
/// whether it returns `Ok` or `Err`.
pub fn download(handles: &DownloadHandles, record: &ResumeRecord) -> Result<Download, DownloadError> {
    let file = &record.original_file;
    let handle = handles.acquire(file);

    let content_disposition = attachment_disposition(&file.name)?;
    let content_type = file.content_type.clone().unwrap_or_else(|| match classify(&file.name) {
        FileCategory::Accepted(kind) => kind.mime_type().to_string(),
        FileCategory::Rejected => FALLBACK_CONTENT_TYPE.to_string(),
    });

    Ok(Download {
        file_name: file.name.clone(),
        content_type,
        content_disposition,
        bytes: handle.bytes().clone(),
    })
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8
/// name in `filename*`.
fn attachment_disposition(file_name: &str) -> Result<HeaderValue, DownloadError> {
    if file_name.trim().is_empty() {
        return Err(DownloadError::MissingFileName);
    }

    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    Ok(HeaderValue::from_str(&format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}"
    ))?)
}
