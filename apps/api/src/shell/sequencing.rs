//! Async sequencing of collaborator calls against a session.
//!
//! Each call runs in three steps: lock and start (rejecting overlap), await
//! the collaborator with the lock released, lock and commit. A guard re-enables
//! the control if the request is dropped mid-await. The commit disarms the
//! guard under the same lock, so a late drop can never touch the next call.

use tracing::{info, warn};

use super::session::ProcessOutcome;
use super::store::SessionHandle;
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::processing::{DocumentProcessor, ProcessingError};
use crate::qa::{QaError, QuestionAnswerer};

struct ProcessingGuard<'a> {
    handle: &'a SessionHandle,
    armed: bool,
}

impl<'a> ProcessingGuard<'a> {
    fn arm(handle: &'a SessionHandle) -> Self {
        Self { handle, armed: true }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.handle.lock();
        if session.abandon_processing() {
            warn!(session = %session.id(), "processing call dropped before completing");
        }
    }
}

struct QuestionGuard<'a> {
    handle: &'a SessionHandle,
    armed: bool,
}

impl<'a> QuestionGuard<'a> {
    fn arm(handle: &'a SessionHandle) -> Self {
        Self { handle, armed: true }
    }
}

impl Drop for QuestionGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.handle.lock();
        if session.abandon_question() {
            warn!(session = %session.id(), "question dropped before an answer arrived");
        }
    }
}

/// Runs the processor over the session's current selection and commits the
/// outcome. At most one call per session is in flight.
pub async fn process_files(
    handle: &SessionHandle,
    processor: &dyn DocumentProcessor,
) -> Result<ProcessOutcome, AppError> {
    let request = handle.lock().start_processing()?;
    let mut guard = ProcessingGuard::arm(handle);

    info!(
        resumes = request.resumes.len(),
        job_description = request.job_description.is_some(),
        backend = processor.backend(),
        "processing started"
    );
    let result = processor
        .process(&request.resumes, request.job_description.as_ref())
        .await;

    commit_processing(&mut guard, result)
}

fn commit_processing(
    guard: &mut ProcessingGuard<'_>,
    result: Result<Vec<ResumeRecord>, ProcessingError>,
) -> Result<ProcessOutcome, AppError> {
    let handle = guard.handle;
    let mut session = handle.lock();
    guard.armed = false;
    match result {
        Ok(records) => session.processing_succeeded(records),
        Err(e) => {
            warn!(session = %session.id(), error = %e, "processing failed");
            Err(session.processing_failed(e.to_string()))
        }
    }
}

/// Asks `question` against the records current at submission time.
pub async fn ask_question(
    handle: &SessionHandle,
    answerer: &dyn QuestionAnswerer,
    question: &str,
) -> Result<String, AppError> {
    let records = handle.lock().ask_question(question)?;
    let mut guard = QuestionGuard::arm(handle);

    info!(records = records.len(), backend = answerer.backend(), "question submitted");
    let result = answerer.ask(question, &records).await;

    commit_answer(&mut guard, result)
}

fn commit_answer(
    guard: &mut QuestionGuard<'_>,
    result: Result<String, QaError>,
) -> Result<String, AppError> {
    let handle = guard.handle;
    let mut session = handle.lock();
    guard.armed = false;
    session.answer_received(result)
}
