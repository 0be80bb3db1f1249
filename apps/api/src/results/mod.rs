//! Score-band filtering over the current record set.
//!
//! Every band reads `fitment_score.unwrap_or(0)`, so records without a score
//! (no job description supplied) always land in `LowMatch`.

use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeRecord;

pub const HIGH_MATCH_MIN: u8 = 75;
pub const MEDIUM_MATCH_MIN: u8 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    #[default]
    All,
    HighMatch,
    MediumMatch,
    LowMatch,
}

impl ScoreBand {
    pub fn contains(self, score: u8) -> bool {
        match self {
            ScoreBand::All => true,
            ScoreBand::HighMatch => score >= HIGH_MATCH_MIN,
            ScoreBand::MediumMatch => (MEDIUM_MATCH_MIN..HIGH_MATCH_MIN).contains(&score),
            ScoreBand::LowMatch => score < MEDIUM_MATCH_MIN,
        }
    }

    pub fn matches(self, record: &ResumeRecord) -> bool {
        self.contains(record.score_or_zero())
    }
}

/// Pure and order-preserving.
pub fn filter(records: &[ResumeRecord], band: ScoreBand) -> Vec<&ResumeRecord> {
    records.iter().filter(|r| band.matches(r)).collect()
}

/// Record count per band, as shown on the table tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandCounts {
    pub all: usize,
    pub high_match: usize,
    pub medium_match: usize,
    pub low_match: usize,
}

pub fn band_counts(records: &[ResumeRecord]) -> BandCounts {
    records.iter().fold(
        BandCounts {
            all: records.len(),
            ..BandCounts::default()
        },
        |mut counts, record| {
            if ScoreBand::HighMatch.matches(record) {
                counts.high_match += 1;
            } else if ScoreBand::MediumMatch.matches(record) {
                counts.medium_match += 1;
            } else {
                counts.low_match += 1;
            }
            counts
        },
    )
}

/// Display tone of a score badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Secondary,
    Success,
    Info,
    Warning,
}

/// A zero score gets the neutral tone, same as a missing one.
pub fn badge_tone(score: Option<u8>) -> BadgeTone {
    match score {
        None | Some(0) => BadgeTone::Secondary,
        Some(s) if s >= HIGH_MATCH_MIN => BadgeTone::Success,
        Some(s) if s >= MEDIUM_MATCH_MIN => BadgeTone::Info,
        Some(_) => BadgeTone::Warning,
    }
}
