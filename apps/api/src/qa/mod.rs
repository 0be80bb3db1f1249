//! Question-answering collaborator: free-text questions about the current
//! record set.
//!
//! `MockAnswerer` matches keywords against the records; `LlmAnswerer` forwards
//! to the LLM client. `AppState` holds an `Arc<dyn QuestionAnswerer>`.

pub mod form;
pub mod llm;
pub mod mock;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::resume::ResumeRecord;

pub use form::QuestionForm;
pub use llm::LlmAnswerer;
pub use mock::MockAnswerer;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn ask(&self, question: &str, records: &[ResumeRecord]) -> Result<String, QaError>;

    /// Backend label for logs.
    fn backend(&self) -> &'static str;
}
