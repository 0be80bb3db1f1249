//! Detail viewer: which record (if any) is open, plus the download boundary.

pub mod download;

use serde::Serialize;
use uuid::Uuid;

use crate::models::resume::ResumeRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "recordId", rename_all = "lowercase")]
pub enum DetailViewer {
    #[default]
    Closed,
    Open(Uuid),
}

impl DetailViewer {
    /// Opening with no record is a no-op.
    pub fn open(&mut self, record: Option<&ResumeRecord>) {
        if let Some(record) = record {
            *self = DetailViewer::Open(record.id);
        }
    }

    pub fn close(&mut self) {
        *self = DetailViewer::Closed;
    }

    pub fn open_record(&self) -> Option<Uuid> {
        match self {
            DetailViewer::Open(id) => Some(*id),
            DetailViewer::Closed => None,
        }
    }
}

/// Absolute URL for a professional-network handle stored without a scheme.
pub fn linkedin_url(handle: &str) -> String {
    if handle.starts_with("http") {
        handle.to_string()
    } else {
        format!("https://{handle}")
    }
}
