//! Progress history across completed quizzes.
//!
//! Running totals plus the append-only record list that backs the
//! analytics views and the JSON export.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::HistoryRecord;

/// A history shared between hosts that run quizzes concurrently.
pub type SharedHistory = Arc<Mutex<HistoryAggregator>>;

/// Aggregated statistics over every recorded quiz.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryAggregator {
    records: Vec<HistoryRecord>,
    total_score: u64,
    total_questions: u64,
}

/// Accuracy for one topic across its quizzes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStats {
    pub topic: String,
    pub quizzes: usize,
    pub score: u64,
    pub questions: u64,
    /// Fraction of correct answers, 0–1.
    pub accuracy: f64,
}

impl HistoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild totals from previously exported records.
    pub fn from_records(records: Vec<HistoryRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            history.append(record);
        }
        history
    }

    /// Add a completed quiz. Records are not deduplicated.
    pub fn append(&mut self, record: HistoryRecord) {
        self.total_score += u64::from(record.score);
        self.total_questions += u64::from(record.total);
        tracing::debug!(
            topic = %record.topic,
            score = record.score,
            total = record.total,
            "history record appended"
        );
        self.records.push(record);
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn total_quizzes(&self) -> usize {
        self.records.len()
    }

    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    pub fn total_questions(&self) -> u64 {
        self.total_questions
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Correct answers over questions asked, 0–1; zero with no history.
    pub fn average_accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.total_score as f64 / self.total_questions as f64
        }
    }

    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    /// Up to `n` most recent records, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter().rev().take(n)
    }

    /// Per-quiz accuracy percentages in the order the quizzes were taken.
    pub fn accuracy_series(&self) -> Vec<f64> {
        self.records.iter().map(HistoryRecord::accuracy).collect()
    }

    /// Accuracy per topic, sorted by topic name.
    pub fn per_topic(&self) -> Vec<TopicStats> {
        let mut grouped: BTreeMap<&str, (usize, u64, u64)> = BTreeMap::new();
        for r in &self.records {
            let entry = grouped.entry(r.topic.as_str()).or_default();
            entry.0 += 1;
            entry.1 += u64::from(r.score);
            entry.2 += u64::from(r.total);
        }

        grouped
            .into_iter()
            .map(|(topic, (quizzes, score, questions))| TopicStats {
                topic: topic.to_string(),
                quizzes,
                score,
                questions,
                accuracy: if questions == 0 {
                    0.0
                } else {
                    score as f64 / questions as f64
                },
            })
            .collect()
    }

    /// Forget every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.total_score = 0;
        self.total_questions = 0;
    }

    /// Serialize the records as the export JSON array.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.records).context("failed to serialize history")
    }

    /// Rebuild a history from an exported JSON array.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<HistoryRecord> =
            serde_json::from_str(json).context("failed to parse history JSON")?;
        Ok(Self::from_records(records))
    }

    /// Save the export JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write history to {}", path.display()))?;
        Ok(())
    }

    /// Load an exported history file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read history from {}", path.display()))?;
        Self::from_json(&content)
    }
}
