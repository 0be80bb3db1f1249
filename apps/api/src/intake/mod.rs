//! File intake: extension screening and the ordered selection lists that feed
//! processing.

pub mod multipart;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::models::upload::{DocumentKind, FileCategory, UploadItem, UploadedFile};

/// Single aggregated warning emitted when a batch contains rejected files.
pub const REJECTED_FILES_WARNING: &str =
    "Some files were rejected. Only PDF, DOC, and DOCX files are allowed.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("No files provided")]
    NoFiles,

    #[error("No file at position {index} (selection has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl From<IntakeError> for AppError {
    fn from(e: IntakeError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Classifies a file by the substring after its last `.`.
/// A name without any `.` has no extension and is rejected.
pub fn classify(file_name: &str) -> FileCategory {
    file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| DocumentKind::from_extension(ext))
        .map_or(FileCategory::Rejected, FileCategory::Accepted)
}

/// Result of screening one batch against the allow-list.
#[derive(Debug, Default)]
pub struct Screening {
    /// Accepted files, in input order.
    pub accepted: Vec<UploadItem>,
    pub rejected: usize,
}

pub fn screen(raw_files: Vec<UploadedFile>) -> Screening {
    let mut screening = Screening::default();
    for file in raw_files {
        match classify(&file.name) {
            category @ FileCategory::Accepted(_) => {
                screening.accepted.push(UploadItem { file, category })
            }
            FileCategory::Rejected => {
                tracing::debug!(file = %file.name, "rejecting file with unsupported extension");
                screening.rejected += 1;
            }
        }
    }
    screening
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Accepted files are appended to the selection.
    Multiple,
    /// Accepted files replace the selection wholesale.
    Single,
}

/// Called with the full selection after every successful change.
pub type SelectionListener = Arc<dyn Fn(&[UploadItem]) + Send + Sync>;

/// What one `select_files` call did.
#[derive(Debug, Clone)]
pub struct SelectionReport {
    pub accepted: usize,
    pub rejected: usize,
    pub warning: Option<Notification>,
}

/// An ordered selection list. No de-duplication: the same file may appear twice.
pub struct FileIntake {
    mode: SelectionMode,
    items: Vec<UploadItem>,
    listener: Option<SelectionListener>,
}

impl fmt::Debug for FileIntake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileIntake")
            .field("mode", &self.mode)
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl FileIntake {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: SelectionListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn files(&self) -> Vec<UploadedFile> {
        self.items.iter().map(|item| item.file.clone()).collect()
    }

    pub fn first(&self) -> Option<&UploadedFile> {
        self.items.first().map(|item| &item.file)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Screens `raw_files` and merges the accepted ones into the selection.
    ///
    /// Rejections never block the rest of the batch; they produce one
    /// aggregated warning. In single mode the accepted set replaces the
    /// selection even when nothing was accepted.
    pub fn select_files(
        &mut self,
        raw_files: Vec<UploadedFile>,
    ) -> Result<SelectionReport, IntakeError> {
        if raw_files.is_empty() {
            return Err(IntakeError::NoFiles);
        }

        let Screening { accepted, rejected } = screen(raw_files);
        let report = SelectionReport {
            accepted: accepted.len(),
            rejected,
            warning: (rejected > 0).then(|| Notification::warning(REJECTED_FILES_WARNING)),
        };

        match self.mode {
            SelectionMode::Multiple => self.items.extend(accepted),
            SelectionMode::Single => self.items = accepted,
        }
        self.notify();
        Ok(report)
    }

    /// Removes exactly one entry; later entries shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<UploadItem, IntakeError> {
        if index >= self.items.len() {
            return Err(IntakeError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.notify();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.notify();
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener(&self.items);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile::new(name, None, Bytes::from(name.to_string()))
    }

    fn names(items: &[UploadItem]) -> Vec<&str> {
        items.iter().map(|i| i.file.name.as_str()).collect()
    }

    #[test]
    fn test_classify_allow_list() {
        assert_eq!(classify("cv.pdf"), FileCategory::Accepted(DocumentKind::Pdf));
        assert_eq!(classify("CV.DOCX"), FileCategory::Accepted(DocumentKind::Docx));
        assert_eq!(classify("archive.tar.doc"), FileCategory::Accepted(DocumentKind::Doc));
        assert_eq!(classify("notes.txt"), FileCategory::Rejected);
        assert_eq!(classify("pdf"), FileCategory::Rejected);
        assert_eq!(classify("resume.pdf.exe"), FileCategory::Rejected);
    }

    #[test]
    fn test_screen_keeps_exactly_allowed_files_in_order() {
        let input = vec![
            file("a.pdf"),
            file("b.txt"),
            file("c.Doc"),
            file("d"),
            file("e.docx"),
            file("f.png"),
        ];
        let screening = screen(input);
        assert_eq!(names(&screening.accepted), vec!["a.pdf", "c.Doc", "e.docx"]);
        assert_eq!(screening.rejected, 3);
    }

    #[test]
    fn test_rejections_emit_one_warning_and_do_not_block() {
        let mut intake = FileIntake::new(SelectionMode::Multiple);
        let report = intake
            .select_files(vec![file("a.txt"), file("b.pdf"), file("c.exe")])
            .unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 2);
        let warning = report.warning.expect("warning for rejected files");
        assert_eq!(warning.message, REJECTED_FILES_WARNING);
        assert_eq!(names(intake.items()), vec!["b.pdf"]);
    }

    #[test]
    fn test_no_warning_when_everything_is_accepted() {
        let mut intake = FileIntake::new(SelectionMode::Multiple);
        let report = intake.select_files(vec![file("a.pdf")]).unwrap();
        assert!(report.warning.is_none());
    }

    #[test]
    fn test_multiple_mode_appends_without_dedup() {
        let mut intake = FileIntake::new(SelectionMode::Multiple);
        intake.select_files(vec![file("a.pdf")]).unwrap();
        intake.select_files(vec![file("a.pdf"), file("b.doc")]).unwrap();
        assert_eq!(names(intake.items()), vec!["a.pdf", "a.pdf", "b.doc"]);
    }

    #[test]
    fn test_single_mode_replaces_selection() {
        let mut intake = FileIntake::new(SelectionMode::Single);
        intake.select_files(vec![file("jd-v1.pdf")]).unwrap();
        intake.select_files(vec![file("jd-v2.docx")]).unwrap();
        assert_eq!(names(intake.items()), vec!["jd-v2.docx"]);

        intake.select_files(vec![file("jd.txt")]).unwrap();
        assert!(intake.is_empty());

        let report = intake
            .select_files(vec![file("a.pdf"), file("b.pdf")])
            .unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(names(intake.items()), vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let mut intake = FileIntake::new(SelectionMode::Multiple);
        assert_eq!(intake.select_files(vec![]).unwrap_err(), IntakeError::NoFiles);
    }

    #[test]
    fn test_remove_at_deletes_one_and_preserves_order() {
        let mut intake = FileIntake::new(SelectionMode::Multiple);
        intake
            .select_files(vec![file("a.pdf"), file("b.pdf"), file("c.pdf"), file("d.pdf")])
            .unwrap();

        let removed = intake.remove_at(1).unwrap();
        assert_eq!(removed.file.name, "b.pdf");
        assert_eq!(names(intake.items()), vec!["a.pdf", "c.pdf", "d.pdf"]);

        intake.remove_at(2).unwrap();
        assert_eq!(names(intake.items()), vec!["a.pdf", "c.pdf"]);
    }

    #[test]
    fn test_remove_at_out_of_range_leaves_selection_untouched() {
        let mut intake = FileIntake::new(SelectionMode::Multiple);
        intake.select_files(vec![file("a.pdf")]).unwrap();
        assert_eq!(
            intake.remove_at(1).unwrap_err(),
            IntakeError::IndexOutOfRange { index: 1, len: 1 }
        );
        assert_eq!(intake.len(), 1);
    }

    #[test]
    fn test_listener_receives_full_selection_every_change() {
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = seen.clone();
        let mut intake = FileIntake::new(SelectionMode::Multiple).with_listener(Arc::new(
            move |items: &[UploadItem]| {
                let snapshot = items.iter().map(|i| i.file.name.clone()).collect();
                sink.lock().unwrap().push(snapshot);
            },
        ));

        intake.select_files(vec![file("a.pdf")]).unwrap();
        intake.select_files(vec![file("b.pdf")]).unwrap();
        intake.remove_at(0).unwrap();
        intake.clear();
        let _ = intake.remove_at(0);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                vec!["a.pdf".to_string()],
                vec!["a.pdf".to_string(), "b.pdf".to_string()],
                vec!["b.pdf".to_string()],
                vec![],
            ]
        );
    }
}
