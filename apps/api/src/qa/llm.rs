use async_trait::async_trait;
use serde::Serialize;

use super::prompts::{QA_PROMPT_TEMPLATE, QA_SYSTEM};
use super::{QaError, QuestionAnswerer};
use crate::llm_client::LlmClient;
use crate::models::resume::ResumeRecord;

/// Answers questions through the LLM client.
pub struct LlmAnswerer(pub LlmClient);

/// What the model sees of a record. Raw text and file details stay out of the prompt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateSummary<'a> {
    name: &'a str,
    currently_working: bool,
    last_employer: &'a str,
    total_experience: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fitment_score: Option<u8>,
    keywords: &'a [String],
}

impl<'a> From<&'a ResumeRecord> for CandidateSummary<'a> {
    fn from(record: &'a ResumeRecord) -> Self {
        Self {
            name: &record.name,
            currently_working: record.currently_working,
            last_employer: &record.last_employer,
            total_experience: &record.total_experience,
            fitment_score: record.fitment_score,
            keywords: record.keywords.as_deref().unwrap_or_default(),
        }
    }
}

fn build_prompt(question: &str, records: &[ResumeRecord]) -> Result<String, QaError> {
    let summaries: Vec<CandidateSummary<'_>> = records.iter().map(CandidateSummary::from).collect();
    let records_json = serde_json::to_string_pretty(&summaries)
        .map_err(|e| QaError::Failed(format!("Failed to encode records: {e}")))?;
    Ok(QA_PROMPT_TEMPLATE
        .replace("{records}", &records_json)
        .replace("{question}", question.trim()))
}

#[async_trait]
impl QuestionAnswerer for LlmAnswerer {
    async fn ask(&self, question: &str, records: &[ResumeRecord]) -> Result<String, QaError> {
        let prompt = build_prompt(question, records)?;
        Ok(self.0.complete(&prompt, QA_SYSTEM).await?)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::record;

    #[test]
    fn test_prompt_carries_question_and_records_without_raw_text() {
        let mut r = record("John Smith", "Infosys", Some(82));
        r.raw_text = Some("SECRET FULL TEXT".to_string());
        r.keywords = Some(vec!["Rust".to_string()]);

        let prompt = build_prompt("  Who knows Rust? ", &[r]).unwrap();

        assert!(prompt.contains("Question: Who knows Rust?"));
        assert!(prompt.contains("\"lastEmployer\": \"Infosys\""));
        assert!(prompt.contains("\"fitmentScore\": 82"));
        assert!(prompt.contains("\"Rust\""));
        assert!(!prompt.contains("SECRET FULL TEXT"));
    }

    #[test]
    fn test_unscored_records_omit_score() {
        let prompt = build_prompt("Anyone?", &[record("A", "Acme", None)]).unwrap();
        assert!(!prompt.contains("fitmentScore\":"));
    }
}
