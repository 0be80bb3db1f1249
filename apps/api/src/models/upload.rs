use bytes::Bytes;
use serde::{ser::SerializeStruct, Serialize, Serializer};

/// A file handed to the service by a picker upload or a drop.
///
/// `bytes` is a shared buffer, so cloning an `UploadedFile` (into a selection, a
/// record, or a download) never copies the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// Only the metadata goes over the wire. The bytes are reachable through download.
impl Serialize for UploadedFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("UploadedFile", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("contentType", &self.content_type)?;
        s.serialize_field("size", &self.size())?;
        s.end()
    }
}

/// Document formats accepted at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
}

impl DocumentKind {
    /// Case-insensitive lookup of a bare extension (no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "doc" => Some(DocumentKind::Doc),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Doc => "application/msword",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "kind", rename_all = "lowercase")]
pub enum FileCategory {
    Accepted(DocumentKind),
    Rejected,
}

/// One entry of an intake selection list. Identity is the position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadItem {
    #[serde(flatten)]
    pub file: UploadedFile,
    pub category: FileCategory,
}
