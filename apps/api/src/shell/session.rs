use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::detail::DetailViewer;
use crate::errors::{AppError, QUESTION_FAILED_MESSAGE};
use crate::intake::{FileIntake, SelectionMode, SelectionReport};
use crate::models::notification::Notification;
use crate::models::resume::ResumeRecord;
use crate::models::upload::{UploadItem, UploadedFile};
use crate::processing::{rank_by_fitment, validate_batch};
use crate::qa::form::{FormError, FormSnapshot};
use crate::qa::{QaError, QuestionForm};
use crate::results::{band_counts, BandCounts};

/// Oldest notifications are dropped past this many.
pub const NOTIFICATION_BACKLOG: usize = 32;

pub const NO_RESUMES_MESSAGE: &str = "Please upload at least one resume file";
pub const EMPTY_RESULT_MESSAGE: &str = "No data could be extracted from the provided files";
pub const NO_RECORDS_TO_ASK_MESSAGE: &str = "No resumes available to analyze";
pub const NO_RESULTS_MESSAGE: &str = "No results to display. Please upload and process files first.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Upload,
    Results,
}

/// Which intake list an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Selection {
    Resumes,
    JobDescription,
}

/// Inputs of one processing call, snapshotted when it starts.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub resumes: Vec<UploadedFile>,
    pub job_description: Option<UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ProcessOutcome {
    Processed { count: usize },
    /// The collaborator succeeded but extracted nothing. Not a failure.
    Empty,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    scored: bool,
    started_at: DateTime<Utc>,
}

/// All state of one review session. Only the shell mutates it; every method
/// below is one user action (or one collaborator outcome) applied to it.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    resumes: FileIntake,
    job_description: FileIntake,
    records: Arc<Vec<ResumeRecord>>,
    view: View,
    processing: Option<InFlight>,
    detail: DetailViewer,
    question: QuestionForm,
    notifications: VecDeque<Notification>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub view: View,
    pub resumes: Vec<UploadItem>,
    pub job_description: Vec<UploadItem>,
    pub processing: bool,
    pub processing_since: Option<DateTime<Utc>>,
    pub record_count: usize,
    pub band_counts: BandCounts,
    pub detail: DetailViewer,
    pub question: FormSnapshot,
    pub pending_notifications: usize,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let resumes = FileIntake::new(SelectionMode::Multiple).with_listener(Arc::new(
            move |items: &[UploadItem]| {
                debug!(session = %id, files = items.len(), "resume selection changed")
            },
        ));
        let job_description = FileIntake::new(SelectionMode::Single).with_listener(Arc::new(
            move |items: &[UploadItem]| {
                debug!(session = %id, files = items.len(), "job description selection changed")
            },
        ));

        Self {
            id,
            created_at: Utc::now(),
            resumes,
            job_description,
            records: Arc::new(Vec::new()),
            view: View::Upload,
            processing: None,
            detail: DetailViewer::Closed,
            question: QuestionForm::default(),
            notifications: VecDeque::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// The current results set. Replaced wholesale, never mutated in place.
    pub fn records(&self) -> &Arc<Vec<ResumeRecord>> {
        &self.records
    }

    pub fn record(&self, record_id: Uuid) -> Result<&ResumeRecord, AppError> {
        self.records
            .iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| AppError::NotFound(format!("Record {record_id} not found")))
    }

    pub fn intake(&self, selection: Selection) -> &FileIntake {
        match selection {
            Selection::Resumes => &self.resumes,
            Selection::JobDescription => &self.job_description,
        }
    }

    fn intake_mut(&mut self, selection: Selection) -> &mut FileIntake {
        match selection {
            Selection::Resumes => &mut self.resumes,
            Selection::JobDescription => &mut self.job_description,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }

    /// A processing call or a question is waiting on its collaborator.
    pub fn is_busy(&self) -> bool {
        self.processing.is_some() || self.question.is_submitting()
    }

    pub fn detail(&self) -> DetailViewer {
        self.detail
    }

    pub fn question(&self) -> &QuestionForm {
        &self.question
    }

    // ── intake ──────────────────────────────────────────────────────────────

    pub fn select_files(
        &mut self,
        selection: Selection,
        files: Vec<UploadedFile>,
    ) -> Result<SelectionReport, AppError> {
        let report = self.intake_mut(selection).select_files(files)?;
        if let Some(warning) = &report.warning {
            self.push(warning.clone());
        }
        Ok(report)
    }

    pub fn remove_file(&mut self, selection: Selection, index: usize) -> Result<UploadItem, AppError> {
        Ok(self.intake_mut(selection).remove_at(index)?)
    }

    // ── processing ──────────────────────────────────────────────────────────

    /// Marks a processing call in flight and snapshots its inputs.
    pub fn start_processing(&mut self) -> Result<ProcessRequest, AppError> {
        if self.processing.is_some() {
            return Err(AppError::Busy("Files are already being processed".to_string()));
        }
        if self.resumes.is_empty() {
            return Err(self.reject(AppError::Validation(NO_RESUMES_MESSAGE.to_string())));
        }

        let request = ProcessRequest {
            resumes: self.resumes.files(),
            job_description: self.job_description.first().cloned(),
        };
        self.processing = Some(InFlight {
            scored: request.job_description.is_some(),
            started_at: Utc::now(),
        });
        Ok(request)
    }

    /// Commits a successful collaborator batch.
    ///
    /// An empty batch leaves records and view untouched. A batch that breaks
    /// the record invariants is treated as a collaborator failure.
    pub fn processing_succeeded(
        &mut self,
        mut records: Vec<ResumeRecord>,
    ) -> Result<ProcessOutcome, AppError> {
        let in_flight = self
            .processing
            .take()
            .ok_or_else(|| AppError::Internal(anyhow!("no processing call in flight")))?;

        if let Err(e) = validate_batch(&records, in_flight.scored) {
            return Err(self.reject(AppError::Collaborator(e.to_string())));
        }

        let elapsed_ms = (Utc::now() - in_flight.started_at).num_milliseconds();
        if records.is_empty() {
            warn!(session = %self.id, elapsed_ms, "processing extracted no records");
            self.push(Notification::warning(EMPTY_RESULT_MESSAGE));
            return Ok(ProcessOutcome::Empty);
        }

        if in_flight.scored {
            rank_by_fitment(&mut records);
        }
        let count = records.len();
        self.records = Arc::new(records);
        self.view = View::Results;
        self.detail.close();
        self.question.reset();

        info!(session = %self.id, count, elapsed_ms, "processing succeeded");
        self.push(Notification::success(format!(
            "Successfully processed {count} resumes"
        )));
        Ok(ProcessOutcome::Processed { count })
    }

    /// Records a collaborator failure. Prior results stay as they were.
    pub fn processing_failed(&mut self, message: String) -> AppError {
        self.processing = None;
        self.reject(AppError::Collaborator(message))
    }

    /// Re-enables processing when a call ended without an outcome.
    /// Returns whether one was in flight.
    pub fn abandon_processing(&mut self) -> bool {
        self.processing.take().is_some()
    }

    // ── navigation ──────────────────────────────────────────────────────────

    /// Resets selections, records, view and detail. Not offered while a
    /// processing call or a question is outstanding.
    pub fn clear_all(&mut self) -> Result<(), AppError> {
        if self.processing.is_some() {
            return Err(AppError::Busy(
                "Cannot clear while files are being processed".to_string(),
            ));
        }
        if self.question.is_submitting() {
            return Err(AppError::Busy(
                "Cannot clear while a question is being answered".to_string(),
            ));
        }
        self.resumes.clear();
        self.job_description.clear();
        self.records = Arc::new(Vec::new());
        self.view = View::Upload;
        self.detail.close();
        self.question.reset();
        info!(session = %self.id, "session cleared");
        Ok(())
    }

    pub fn set_view(&mut self, view: View) -> Result<(), AppError> {
        if view == View::Results && self.records.is_empty() {
            return Err(AppError::Validation(NO_RESULTS_MESSAGE.to_string()));
        }
        self.view = view;
        Ok(())
    }

    /// Opening with no record id is a no-op.
    pub fn open_detail(&mut self, record_id: Option<Uuid>) -> Result<Option<&ResumeRecord>, AppError> {
        let Some(record_id) = record_id else {
            return Ok(None);
        };
        let record = self
            .records
            .iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| AppError::NotFound(format!("Record {record_id} not found")))?;
        self.detail.open(Some(record));
        Ok(Some(record))
    }

    pub fn close_detail(&mut self) {
        if let Some(record_id) = self.detail.open_record() {
            debug!(session = %self.id, %record_id, "detail closed");
        }
        self.detail.close();
    }

    // ── questions ───────────────────────────────────────────────────────────

    /// Starts a question and returns the record set it will be asked against.
    pub fn ask_question(&mut self, question: &str) -> Result<Arc<Vec<ResumeRecord>>, AppError> {
        if question.trim().is_empty() {
            return Err(self.reject(AppError::Validation(FormError::EmptyQuestion.to_string())));
        }
        if self.records.is_empty() {
            return Err(self.reject(AppError::Validation(NO_RECORDS_TO_ASK_MESSAGE.to_string())));
        }
        self.question.begin(question).map_err(|e| match e {
            FormError::Pending => AppError::Busy(e.to_string()),
            FormError::EmptyQuestion => AppError::Validation(e.to_string()),
        })?;
        Ok(self.records.clone())
    }

    pub fn answer_received(&mut self, result: Result<String, QaError>) -> Result<String, AppError> {
        match result {
            Ok(answer) => {
                self.question.complete(answer.clone());
                Ok(answer)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "question answering failed");
                self.question.fail(QUESTION_FAILED_MESSAGE);
                Err(self.reject(AppError::QuestionFailed))
            }
        }
    }

    pub fn abandon_question(&mut self) -> bool {
        self.question.abandon()
    }

    // ── notifications ───────────────────────────────────────────────────────

    pub fn push(&mut self, notification: Notification) {
        if self.notifications.len() == NOTIFICATION_BACKLOG {
            self.notifications.pop_front();
        }
        self.notifications.push_back(notification);
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.back()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Queues the error as a user-facing notification and hands it back.
    fn reject(&mut self, err: AppError) -> AppError {
        self.push(Notification::error(err.user_message()));
        err
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            view: self.view,
            resumes: self.resumes.items().to_vec(),
            job_description: self.job_description.items().to_vec(),
            processing: self.is_processing(),
            processing_since: self.processing.map(|f| f.started_at),
            record_count: self.records.len(),
            band_counts: band_counts(&self.records),
            detail: self.detail(),
            question: self.question().snapshot(),
            pending_notifications: self.notifications.len(),
        }
    }
}
