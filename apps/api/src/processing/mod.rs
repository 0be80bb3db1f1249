//! Extraction/Scoring collaborator: a pluggable, trait-based seam between the
//! session shell and whatever turns uploaded résumés into structured records.
//!
//! Default: `MockProcessor` (fixed delay, randomized fields).
//! `AppState` holds an `Arc<dyn DocumentProcessor>`, chosen at startup.

pub mod mock;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::resume::ResumeRecord;
use crate::models::upload::UploadedFile;

pub use mock::MockProcessor;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("No resume files provided")]
    NoResumes,

    /// Collaborator-reported failure, shown to the user as-is.
    #[error("{0}")]
    Failed(String),

    /// The collaborator returned a batch that breaks the record invariants.
    #[error("Invalid processing result: {0}")]
    InvalidBatch(String),
}

/// Implement this to swap extraction backends without touching the shell.
///
/// Contract: one record per input résumé, in input order unless re-ranked by
/// fitment score; every record carries a score iff `job_description` is `Some`.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    async fn process(
        &self,
        resumes: &[UploadedFile],
        job_description: Option<&UploadedFile>,
    ) -> Result<Vec<ResumeRecord>, ProcessingError>;

    /// Backend label for logs.
    fn backend(&self) -> &'static str;
}

/// Checks a collaborator batch before it replaces the results store.
pub fn validate_batch(records: &[ResumeRecord], scored: bool) -> Result<(), ProcessingError> {
    let mut ids = HashSet::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        match (scored, record.fitment_score) {
            (true, None) => {
                return Err(ProcessingError::InvalidBatch(format!(
                    "record {position} has no fitment score although a job description was supplied"
                )))
            }
            (false, Some(_)) => {
                return Err(ProcessingError::InvalidBatch(format!(
                    "record {position} has a fitment score but no job description was supplied"
                )))
            }
            (_, Some(score)) if score > 100 => {
                return Err(ProcessingError::InvalidBatch(format!(
                    "record {position} has fitment score {score}, outside 0-100"
                )))
            }
            _ => {}
        }

        if !ids.insert(record.id) {
            return Err(ProcessingError::InvalidBatch(format!(
                "duplicate record id {}",
                record.id
            )));
        }
    }

    Ok(())
}

/// Stable sort by descending fitment score: ties keep their upload order.
pub fn rank_by_fitment(records: &mut [ResumeRecord]) {
    records.sort_by(|a, b| b.score_or_zero().cmp(&a.score_or_zero()));
}
