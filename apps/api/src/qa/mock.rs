use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{QaError, QuestionAnswerer};
use crate::models::resume::ResumeRecord;

const NOT_FOUND_ANSWER: &str = "I couldn't find specific information about that in the resumes.";
const EDUCATION_ANSWER: &str = "Education details vary among candidates, with most having \
    bachelor's degrees in Computer Science, Information Technology, or related fields.";
const OVERVIEW_SKILLS: usize = 4;

/// Stand-in for a real question-answering service.
///
/// Waits `delay`, then matches a handful of question shapes (employer,
/// most experience, employment status, a named skill) against the records.
/// Anything else falls back to a generic overview or a "couldn't find" reply.
pub struct MockAnswerer {
    delay: Duration,
}

impl MockAnswerer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl QuestionAnswerer for MockAnswerer {
    async fn ask(&self, question: &str, records: &[ResumeRecord]) -> Result<String, QaError> {
        debug!(delay = ?self.delay, "mock answering");
        tokio::time::sleep(self.delay).await;
        Ok(answer(question, records))
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

pub fn answer(question: &str, records: &[ResumeRecord]) -> String {
    let q = question.to_lowercase();

    if let Some(employer) = phrase_after(&q, "worked at ") {
        return employer_answer(&employer, records);
    }
    if q.contains("most experience") {
        return most_experienced(records);
    }
    if q.contains("currently employed") || q.contains("currently working") {
        return employment_status(records);
    }
    if let Some(skill) = skill_in_question(&q) {
        return skill_answer(&skill, records);
    }
    if q.contains("experience") || q.contains("skill") {
        return experience_overview(records);
    }
    if q.contains("education") || q.contains("degree") {
        return EDUCATION_ANSWER.to_string();
    }
    NOT_FOUND_ANSWER.to_string()
}

/// The phrase following `marker`, up to the end of the clause, without a
/// trailing time qualifier ("before", "previously").
fn phrase_after(q: &str, marker: &str) -> Option<String> {
    let start = q.find(marker)? + marker.len();
    let rest = &q[start..];
    let clause = rest
        .split(|c: char| matches!(c, '?' | '.' | ',' | '!' | ';'))
        .next()
        .unwrap_or(rest)
        .trim();
    let clause = ["before", "previously", "in the past"]
        .iter()
        .find_map(|suffix| clause.strip_suffix(suffix))
        .unwrap_or(clause)
        .trim();
    (!clause.is_empty()).then(|| clause.to_string())
}

/// "who has <skill> experience" / "who knows <skill>". A leading number
/// ("who has 5 years experience") is a duration, not a skill.
fn skill_in_question(q: &str) -> Option<String> {
    if let Some(start) = q.find("who has ") {
        let rest = &q[start + "who has ".len()..];
        let end = rest.find(" experience")?;
        let skill = rest[..end].trim();
        let is_duration = skill.starts_with(|c: char| c.is_ascii_digit());
        return (!skill.is_empty() && !is_duration).then(|| skill.to_string());
    }
    phrase_after(q, "who knows ")
}

fn employer_answer(employer: &str, records: &[ResumeRecord]) -> String {
    let matches: Vec<&ResumeRecord> = records
        .iter()
        .filter(|r| r.last_employer.to_lowercase().contains(employer))
        .collect();

    let Some(first) = matches.first() else {
        return format!("None of the analyzed candidates have worked at {employer}.");
    };
    format!(
        "Based on the analyzed resumes, {} worked at {} before: {}.",
        count_phrase(matches.len(), "candidate has", "candidates have"),
        first.last_employer,
        join_names(matches.iter().map(|r| r.name.as_str()))
    )
}

fn most_experienced(records: &[ResumeRecord]) -> String {
    let best = records
        .iter()
        .filter_map(|r| r.experience_years().map(|years| (years, r)))
        .fold(None::<(u32, &ResumeRecord)>, |best, (years, r)| match best {
            Some((top, _)) if top >= years => best,
            _ => Some((years, r)),
        });

    match best {
        Some((_, r)) => format!(
            "{} has the most experience with {} of work history.",
            r.name, r.total_experience
        ),
        None => NOT_FOUND_ANSWER.to_string(),
    }
}

fn employment_status(records: &[ResumeRecord]) -> String {
    let employed = records.iter().filter(|r| r.currently_working).count();
    format!(
        "{} currently employed, while {} not currently working.",
        count_phrase(employed, "candidate is", "candidates are"),
        count_phrase(records.len() - employed, "candidate is", "candidates are")
    )
}

fn skill_answer(skill: &str, records: &[ResumeRecord]) -> String {
    let mut display = None;
    let matches: Vec<&str> = records
        .iter()
        .filter(|r| {
            let found = r
                .keywords
                .iter()
                .flatten()
                .find(|k| k.to_lowercase() == skill);
            if display.is_none() {
                display = found.cloned();
            }
            found.is_some()
        })
        .map(|r| r.name.as_str())
        .collect();

    if matches.is_empty() {
        return format!("No candidates mention {skill} in their skills.");
    }
    format!(
        "{} {} in their skills: {}.",
        count_phrase(matches.len(), "candidate mentions", "candidates mention"),
        display.as_deref().unwrap_or(skill),
        join_names(matches.into_iter())
    )
}

fn experience_overview(records: &[ResumeRecord]) -> String {
    let years: Vec<u32> = records.iter().filter_map(ResumeRecord::experience_years).collect();
    let (Some(min), Some(max)) = (years.iter().min(), years.iter().max()) else {
        return NOT_FOUND_ANSWER.to_string();
    };

    let mut skills: Vec<&str> = Vec::new();
    for keyword in records.iter().flat_map(|r| r.keywords.iter().flatten()) {
        if skills.len() == OVERVIEW_SKILLS {
            break;
        }
        if !skills.iter().any(|s| s.eq_ignore_ascii_case(keyword)) {
            skills.push(keyword);
        }
    }

    let range = if min == max {
        format!("The candidates each have about {min} years of experience")
    } else {
        format!("The candidates have various levels of experience ranging from {min} to {max} years")
    };
    if skills.is_empty() {
        format!("{range}.")
    } else {
        format!("{range}, with skills including {}, and more.", skills.join(", "))
    }
}

fn count_phrase(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("1 {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// "A", "A and B", "A, B, and C".
fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
