use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use super::{rank_by_fitment, DocumentProcessor, ProcessingError};
use crate::models::resume::ResumeRecord;
use crate::models::upload::UploadedFile;

const NAMES: [&str; 5] = [
    "John Smith",
    "Sarah Johnson",
    "Michael Williams",
    "Emily Brown",
    "David Miller",
];
const EMPLOYERS: [&str; 5] = [
    "Tech Solutions Inc.",
    "Digital Innovations",
    "Infosys",
    "Global Systems",
    "Data Analytics Co.",
];
const EXPERIENCES: [&str; 5] = ["3 years", "5 years", "2 years", "7 years", "4 years"];
const KEYWORD_POOL: [&str; 10] = [
    "React",
    "TypeScript",
    "Node.js",
    "Python",
    "Data Analysis",
    "Project Management",
    "UI/UX Design",
    "AWS",
    "Docker",
    "Machine Learning",
];

/// Stand-in for a real extraction service.
///
/// Sleeps `delay_per_file × resumes` and then fabricates one record per file:
/// contact fields cycle through fixed tables by position, everything else is
/// drawn from the RNG. Seed it for reproducible batches.
pub struct MockProcessor {
    delay_per_file: Duration,
    rng: Mutex<StdRng>,
}

impl MockProcessor {
    pub fn new(delay_per_file: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            delay_per_file,
            rng: Mutex::new(rng),
        }
    }

    fn fabricate(&self, index: usize, file: &UploadedFile, scored: bool) -> ResumeRecord {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let name = NAMES[index % NAMES.len()];
        let employer = EMPLOYERS[index % EMPLOYERS.len()];
        let experience = EXPERIENCES[index % EXPERIENCES.len()];

        let email = format!("{}@example.com", name.to_lowercase().replacen(' ', ".", 1));
        let phone = format!(
            "+1 (555) {}-{}",
            rng.gen_range(100..1000),
            rng.gen_range(1000..10000)
        );
        let linkedin = format!("linkedin.com/in/{}", name.to_lowercase().replacen(' ', "-", 1));

        let mut pool = KEYWORD_POOL.to_vec();
        pool.shuffle(&mut *rng);
        let keywords: Vec<String> = pool
            .into_iter()
            .take(rng.gen_range(2..=6))
            .map(String::from)
            .collect();

        let fitment_score = scored.then(|| rng.gen_range(0..100));
        let currently_working = rng.gen_bool(0.7);

        let raw_text = format!(
            "Name: {name}\nEmail: {email}\nPhone: {phone}\nLinkedIn: {linkedin}\n\n\
             Experience:\n{employer} - {experience}\n\nSkills:\n{}",
            keywords.join(", ")
        );

        ResumeRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            phone,
            linkedin: Some(linkedin),
            currently_working,
            last_employer: employer.to_string(),
            total_experience: experience.to_string(),
            fitment_score,
            keywords: Some(keywords),
            raw_text: Some(raw_text),
            original_file: file.clone(),
        }
    }
}

#[async_trait]
impl DocumentProcessor for MockProcessor {
    async fn process(
        &self,
        resumes: &[UploadedFile],
        job_description: Option<&UploadedFile>,
    ) -> Result<Vec<ResumeRecord>, ProcessingError> {
        if resumes.is_empty() {
            return Err(ProcessingError::NoResumes);
        }
        if let Some(empty) = resumes.iter().chain(job_description).find(|f| f.size() == 0) {
            debug!(file = %empty.name, "empty upload");
            return Err(ProcessingError::Failed(
                "Failed to process documents".to_string(),
            ));
        }

        let delay = self.delay_per_file.saturating_mul(resumes.len() as u32);
        debug!(files = resumes.len(), ?delay, "mock processing");
        tokio::time::sleep(delay).await;

        let scored = job_description.is_some();
        let mut records: Vec<ResumeRecord> = resumes
            .iter()
            .enumerate()
            .map(|(index, file)| self.fabricate(index, file, scored))
            .collect();

        if scored {
            rank_by_fitment(&mut records);
        }

        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}
