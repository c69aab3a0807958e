//! The `studycoach stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studycoach_core::HistoryAggregator;
use studycoach_report::write_html_report;

pub fn execute(history_path: PathBuf, html: Option<PathBuf>) -> Result<()> {
    let history = HistoryAggregator::load_json(&history_path)?;

    if history.is_empty() {
        println!("No quiz history yet. Take a quiz with `studycoach quiz --export <file>`.");
        return Ok(());
    }

    print_summary(&history);

    if let Some(path) = html {
        write_html_report(&history, &path)?;
        eprintln!("HTML report: {}", path.display());
    }

    Ok(())
}

/// Print the totals, the per-quiz table and the per-topic table.
pub(crate) fn print_summary(history: &HistoryAggregator) {
    let mut totals = Table::new();
    totals.set_header(vec![
        "Quizzes",
        "Questions answered",
        "Correct answers",
        "Average accuracy",
    ]);
    totals.add_row(vec![
        Cell::new(history.total_quizzes()),
        Cell::new(history.total_questions()),
        Cell::new(history.total_score()),
        Cell::new(format!("{:.1}%", history.average_accuracy() * 100.0)),
    ]);
    println!("{totals}");

    let mut quizzes = Table::new();
    quizzes.set_header(vec!["Date", "Topic", "Score", "Accuracy", "Level", "Time"]);
    for record in history.records() {
        quizzes.add_row(vec![
            Cell::new(record.date.format("%Y-%m-%d %H:%M")),
            Cell::new(&record.topic),
            Cell::new(format!("{}/{}", record.score, record.total)),
            Cell::new(format!("{:.1}%", record.accuracy())),
            Cell::new(record.level()),
            Cell::new(format!("{}s", record.duration.as_secs())),
        ]);
    }
    println!("\n{quizzes}");

    let mut topics = Table::new();
    topics.set_header(vec!["Topic", "Quizzes", "Correct", "Accuracy"]);
    for t in history.per_topic() {
        topics.add_row(vec![
            Cell::new(&t.topic),
            Cell::new(t.quizzes),
            Cell::new(format!("{}/{}", t.score, t.questions)),
            Cell::new(format!("{:.1}%", t.accuracy * 100.0)),
        ]);
    }
    println!("\n{topics}");
}
