//! Core data model types for studycoach.
//!
//! Quiz items, graded results, and the history record shape that is
//! exported to JSON.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single validated multiple-choice question.
///
/// Only the quiz compiler builds these, so `answer` is always one of
/// `options` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizItem {
    question: String,
    options: Vec<String>,
    answer: String,
}

impl QuizItem {
    pub(crate) fn new(question: String, options: Vec<String>, answer: String) -> Self {
        debug_assert!(options.contains(&answer));
        Self {
            question,
            options,
            answer,
        }
    }

    /// The prompt shown to the user.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The four answer choices, in presentation order.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The correct option's exact text.
    pub fn correct_option(&self) -> &str {
        &self.answer
    }
}

/// How one question was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question: String,
    /// Submitted text, or the empty string when nothing was submitted.
    pub submitted: String,
    pub correct: String,
    pub is_correct: bool,
}

/// Graded result of a completed quiz session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub outcomes: Vec<QuestionOutcome>,
    pub elapsed_seconds: f64,
}

impl QuizResult {
    /// Percentage of correct answers, 0–100.
    pub fn accuracy(&self) -> f64 {
        accuracy_percent(self.score, self.total)
    }

    pub fn level(&self) -> SkillLevel {
        SkillLevel::from_accuracy(self.accuracy())
    }
}

pub(crate) fn accuracy_percent(score: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        score as f64 / total as f64 * 100.0
    }
}

/// Rough proficiency band derived from quiz accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Bands: below 50 % beginner, below 80 % intermediate, else advanced.
    pub fn from_accuracy(percent: f64) -> Self {
        if percent < 50.0 {
            SkillLevel::Beginner
        } else if percent < 80.0 {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Advanced
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Beginner => write!(f, "beginner"),
            SkillLevel::Intermediate => write!(f, "intermediate"),
            SkillLevel::Advanced => write!(f, "advanced"),
        }
    }
}

/// Requested difficulty for a study plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Intermediate => write!(f, "Intermediate"),
            Difficulty::Advanced => write!(f, "Advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" | "easy" => Ok(Difficulty::Beginner),
            "intermediate" | "medium" => Ok(Difficulty::Intermediate),
            "advanced" | "hard" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One completed quiz as kept in the progress history.
///
/// The serialized keys (`topic`, `score`, `total`, `date`, `duration`) are
/// the export format and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub topic: String,
    pub score: u32,
    pub total: u32,
    /// Minute precision; seconds are dropped so export/import is lossless.
    #[serde(with = "record_date")]
    pub date: NaiveDateTime,
    #[serde(with = "record_duration")]
    pub duration: Duration,
}

impl HistoryRecord {
    pub fn accuracy(&self) -> f64 {
        accuracy_percent(self.score, self.total)
    }

    pub fn level(&self) -> SkillLevel {
        SkillLevel::from_accuracy(self.accuracy())
    }
}

pub(crate) const RECORD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

mod record_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RECORD_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(RECORD_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, RECORD_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod record_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&format_args!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        raw.trim()
            .strip_suffix('s')
            .and_then(|n| n.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {raw:?}")))
    }
}
