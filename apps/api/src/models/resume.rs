use serde::Serialize;
use uuid::Uuid;

use crate::models::upload::UploadedFile;

/// Structured result of processing one résumé file.
///
/// Records are produced in bulk by one processing call and are never mutated
/// afterwards; the next call replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: Option<String>,
    pub currently_working: bool,
    pub last_employer: String,
    /// Free-form, e.g. "5 years".
    pub total_experience: String,
    /// 0 – 100. Present for every record of a batch iff a job description was supplied.
    pub fitment_score: Option<u8>,
    pub keywords: Option<Vec<String>>,
    pub raw_text: Option<String>,
    pub original_file: UploadedFile,
}

impl ResumeRecord {
    /// Score used for banding and ranking; unscored records count as 0.
    pub fn score_or_zero(&self) -> u8 {
        self.fitment_score.unwrap_or(0)
    }

    /// Leading whole number of `total_experience`, if it starts with one.
    pub fn experience_years(&self) -> Option<u32> {
        let digits: String = self
            .total_experience
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use bytes::Bytes;

    use super::*;

    pub fn record(name: &str, employer: &str, score: Option<u8>) -> ResumeRecord {
        ResumeRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: "+1 (555) 123-4567".to_string(),
            linkedin: None,
            currently_working: true,
            last_employer: employer.to_string(),
            total_experience: "3 years".to_string(),
            fitment_score: score,
            keywords: None,
            raw_text: None,
            original_file: UploadedFile::new(
                format!("{}.pdf", name.to_lowercase().replace(' ', "_")),
                Some("application/pdf".to_string()),
                Bytes::from_static(b"%PDF-1.4"),
            ),
        }
    }
}
